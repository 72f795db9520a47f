use career_core::db::{open_db, open_db_in_memory};
use career_core::{
    AssignmentPatch, CareerStore, EmploymentPatch, IdSpaceExhausted, InMemoryKvRepository,
    KeyValueStore, NewAssignment, NewEmployment, NewTag, RepoError, RepoResult,
    SqliteKvRepository, TagCategory, TagPatch, YearMonth, STORAGE_KEY,
};
use std::cell::Cell;

fn ym(text: &str) -> YearMonth {
    text.parse().unwrap()
}

fn employment(title: &str, start: &str, end: Option<&str>) -> NewEmployment {
    NewEmployment {
        title: title.to_string(),
        company: format!("{title} Corp"),
        start_date: ym(start),
        end_date: end.map(ym),
    }
}

fn assignment(employment_id: u64, title: &str, start: &str, end: Option<&str>) -> NewAssignment {
    NewAssignment {
        employment_id,
        title: title.to_string(),
        description: String::new(),
        start_date: ym(start),
        end_date: end.map(ym),
    }
}

fn tag(assignment_id: u64, name: &str, category: TagCategory) -> NewTag {
    NewTag {
        assignment_id,
        name: name.to_string(),
        category,
        description: String::new(),
    }
}

/// Storage surface that accepts reads but rejects every write.
struct ReadOnlyKv {
    attempts: Cell<usize>,
}

impl KeyValueStore for ReadOnlyKv {
    fn read_value(&self, _key: &str) -> RepoResult<Option<String>> {
        Ok(None)
    }

    fn write_value(&mut self, _key: &str, _value: &str) -> RepoResult<()> {
        self.attempts.set(self.attempts.get() + 1);
        Err(RepoError::Unavailable("quota exceeded".to_string()))
    }
}

#[test]
fn ids_are_unique_across_collections() {
    let mut store = CareerStore::load(InMemoryKvRepository::new());
    let emp = store
        .create_employment(employment("Engineer", "2020-01", None)).unwrap()
        .into_value();
    let asg = store
        .create_assignment(assignment(emp.id, "Platform", "2020-02", None)).unwrap()
        .into_value();
    let tg = store
        .create_tag(tag(asg.id, "Rust", TagCategory::Skill)).unwrap()
        .into_value();

    assert_eq!((emp.id, asg.id, tg.id), (1, 2, 3));
    assert_eq!(store.data().next_id, 4);
    assert!(!emp.created_at.is_empty());
    assert_eq!(emp.created_at, emp.updated_at);
}

#[test]
fn every_mutation_writes_through_to_storage() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut store = CareerStore::load(repo);

    let created = store.create_employment(employment("Engineer", "2021-05", None)).unwrap();
    assert!(created.is_persisted());

    let stored = store.kv().read_value(STORAGE_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(json["employments"][0]["startDate"], "2021-05");
    assert_eq!(json["employments"][0]["endDate"], serde_json::Value::Null);
    assert_eq!(json["nextId"], 2);
}

#[test]
fn store_rehydrates_from_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("career.db");

    {
        let conn = open_db(&path).unwrap();
        let mut store = CareerStore::load(SqliteKvRepository::try_new(&conn).unwrap());
        let emp = store
            .create_employment(employment("Analyst", "2019-03", Some("2020-08"))).unwrap()
            .into_value();
        store.create_assignment(assignment(emp.id, "Reporting", "2019-04", None)).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let mut store = CareerStore::load(SqliteKvRepository::try_new(&conn).unwrap());
    assert_eq!(store.employments().len(), 1);
    assert_eq!(store.assignments(None).len(), 1);

    let next = store
        .create_employment(employment("Lead", "2020-09", None)).unwrap()
        .into_value();
    assert_eq!(next.id, 3);
}

#[test]
fn malformed_stored_blob_falls_back_to_defaults() {
    let kv = InMemoryKvRepository::new().with_entry(STORAGE_KEY, "{not json");
    let store = CareerStore::load(kv);
    assert!(store.data().is_empty());
    assert_eq!(store.data().next_id, 1);
}

#[test]
fn stored_blob_with_maximum_id_falls_back_to_defaults() {
    let kv = InMemoryKvRepository::new().with_entry(
        STORAGE_KEY,
        r#"{"employments": [{"id": 18446744073709551615, "title": "Dev", "company": "X", "startDate": "2022-01"}]}"#,
    );
    let mut store = CareerStore::load(kv);
    assert!(store.data().is_empty());
    assert_eq!(store.data().next_id, 1);

    let fresh = store
        .create_employment(employment("Engineer", "2020-01", None))
        .unwrap()
        .into_value();
    assert_eq!(fresh.id, 1);
}

#[test]
fn create_at_id_ceiling_fails_without_mutation() {
    let kv = InMemoryKvRepository::new()
        .with_entry(STORAGE_KEY, r#"{"nextId": 18446744073709551615}"#);
    let mut store = CareerStore::load(kv);
    assert_eq!(store.data().next_id, u64::MAX);

    let err = store
        .create_employment(employment("Engineer", "2020-01", None))
        .unwrap_err();
    assert_eq!(err, IdSpaceExhausted);
    assert!(store.employments().is_empty());
    assert_eq!(store.data().next_id, u64::MAX);
    assert_eq!(
        store.kv().read_value(STORAGE_KEY).unwrap().as_deref(),
        Some(r#"{"nextId": 18446744073709551615}"#)
    );
}

#[test]
fn partial_stored_blob_defaults_missing_fields() {
    let kv = InMemoryKvRepository::new().with_entry(
        STORAGE_KEY,
        r#"{"employments": [{"id": 4, "title": "Dev", "company": "X", "startDate": "2022-01"}]}"#,
    );
    let store = CareerStore::load(kv);
    assert_eq!(store.employments().len(), 1);
    assert!(store.assignments(None).is_empty());
    assert_eq!(store.data().next_id, 5);
}

#[test]
fn write_failure_keeps_in_memory_mutation() {
    let mut store = CareerStore::load(ReadOnlyKv {
        attempts: Cell::new(0),
    });

    let created = store.create_employment(employment("Engineer", "2020-01", None)).unwrap();
    assert!(!created.is_persisted());
    assert!(matches!(created.persisted, Err(RepoError::Unavailable(_))));
    assert_eq!(store.employments().len(), 1);
    assert_eq!(store.kv().attempts.get(), 1);
}

#[test]
fn update_merges_fields_and_refreshes_timestamp() {
    let mut store = CareerStore::load(InMemoryKvRepository::new());
    let emp = store
        .create_employment(employment("Engineer", "2020-01", None)).unwrap()
        .into_value();

    let updated = store
        .update_employment(
            emp.id,
            EmploymentPatch {
                title: Some("Senior Engineer".to_string()),
                end_date: Some(Some(ym("2023-06"))),
                ..EmploymentPatch::default()
            },
        )
        .unwrap()
        .into_value();

    assert_eq!(updated.title, "Senior Engineer");
    assert_eq!(updated.company, emp.company);
    assert_eq!(updated.end_date, Some(ym("2023-06")));
    assert_eq!(updated.created_at, emp.created_at);
    assert!(updated.updated_at >= emp.updated_at);

    let reopened = store
        .update_employment(
            emp.id,
            EmploymentPatch {
                end_date: Some(None),
                ..EmploymentPatch::default()
            },
        )
        .unwrap()
        .into_value();
    assert_eq!(reopened.end_date, None);
}

#[test]
fn update_unknown_id_returns_none() {
    let mut store = CareerStore::load(InMemoryKvRepository::new());
    assert!(store
        .update_employment(42, EmploymentPatch::default())
        .is_none());
    assert!(store
        .update_assignment(42, AssignmentPatch::default())
        .is_none());
    assert!(store.update_tag(42, TagPatch::default()).is_none());
}

#[test]
fn deleting_employment_cascades_only_to_its_children() {
    let mut store = CareerStore::load(InMemoryKvRepository::new());
    let first = store
        .create_employment(employment("First", "2018-01", Some("2019-12"))).unwrap()
        .into_value();
    let second = store
        .create_employment(employment("Second", "2020-01", None)).unwrap()
        .into_value();
    let a1 = store
        .create_assignment(assignment(first.id, "A1", "2018-01", None)).unwrap()
        .into_value();
    let a2 = store
        .create_assignment(assignment(first.id, "A2", "2019-01", None)).unwrap()
        .into_value();
    let b1 = store
        .create_assignment(assignment(second.id, "B1", "2020-01", None)).unwrap()
        .into_value();
    store.create_tag(tag(a1.id, "Go", TagCategory::Skill)).unwrap();
    store.create_tag(tag(a2.id, "Go", TagCategory::Skill)).unwrap();
    let kept_tag = store
        .create_tag(tag(b1.id, "Go", TagCategory::Skill)).unwrap()
        .into_value();

    let summary = store.delete_employment(first.id).into_value();
    assert_eq!(summary.employments, 1);
    assert_eq!(summary.assignments, 2);
    assert_eq!(summary.tags, 2);

    assert!(store.employment(first.id).is_none());
    assert_eq!(store.employments().len(), 1);
    assert_eq!(store.assignments(None).len(), 1);
    assert_eq!(store.assignments(None)[0].id, b1.id);
    let remaining = store.tags(None, None);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept_tag.id);
}

#[test]
fn deleting_unknown_employment_is_a_noop() {
    let mut store = CareerStore::load(InMemoryKvRepository::new());
    store.create_employment(employment("Only", "2020-01", None)).unwrap();

    let summary = store.delete_employment(999).into_value();
    assert!(summary.is_empty());
    assert_eq!(store.employments().len(), 1);
}

#[test]
fn deleting_assignment_removes_its_tags() {
    let mut store = CareerStore::load(InMemoryKvRepository::new());
    let emp = store
        .create_employment(employment("Engineer", "2020-01", None)).unwrap()
        .into_value();
    let doomed = store
        .create_assignment(assignment(emp.id, "Doomed", "2020-01", None)).unwrap()
        .into_value();
    let kept = store
        .create_assignment(assignment(emp.id, "Kept", "2021-01", None)).unwrap()
        .into_value();
    store.create_tag(tag(doomed.id, "Jest", TagCategory::TestTech)).unwrap();
    store.create_tag(tag(kept.id, "Jest", TagCategory::TestTech)).unwrap();

    let summary = store.delete_assignment(doomed.id).into_value();
    assert_eq!(summary.assignments, 1);
    assert_eq!(summary.tags, 1);
    assert_eq!(store.tags(None, None).len(), 1);
    assert!(store.employment(emp.id).is_some());
}

#[test]
fn delete_tag_removes_only_that_tag() {
    let mut store = CareerStore::load(InMemoryKvRepository::new());
    let emp = store
        .create_employment(employment("Engineer", "2020-01", None)).unwrap()
        .into_value();
    let asg = store
        .create_assignment(assignment(emp.id, "Work", "2020-01", None)).unwrap()
        .into_value();
    let first = store
        .create_tag(tag(asg.id, "React", TagCategory::TestTargetTech)).unwrap()
        .into_value();
    store.create_tag(tag(asg.id, "Cypress", TagCategory::TestTech)).unwrap();

    assert_eq!(store.delete_tag(first.id).into_value().tags, 1);
    assert_eq!(store.delete_tag(first.id).into_value().tags, 0);
    assert_eq!(store.tags(Some(asg.id), None).len(), 1);
}

#[test]
fn listings_are_sorted_and_filtered() {
    let mut store = CareerStore::load(InMemoryKvRepository::new());
    let old = store
        .create_employment(employment("Old", "2015-06", Some("2017-01"))).unwrap()
        .into_value();
    let new = store
        .create_employment(employment("New", "2021-02", None)).unwrap()
        .into_value();
    store.create_employment(employment("Mid", "2018-11", Some("2021-01"))).unwrap();

    let titles = store
        .employments()
        .into_iter()
        .map(|item| item.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["New", "Mid", "Old"]);

    let early = store
        .create_assignment(assignment(new.id, "Early", "2021-02", None)).unwrap()
        .into_value();
    store.create_assignment(assignment(new.id, "Late", "2022-07", None)).unwrap();
    store.create_assignment(assignment(old.id, "Legacy", "2016-01", None)).unwrap();
    let for_new = store
        .assignments(Some(new.id))
        .into_iter()
        .map(|item| item.title)
        .collect::<Vec<_>>();
    assert_eq!(for_new, vec!["Late", "Early"]);

    store.create_tag(tag(early.id, "typescript", TagCategory::Skill)).unwrap();
    store.create_tag(tag(early.id, "Angular", TagCategory::TestTargetTech)).unwrap();
    store.create_tag(tag(early.id, "Playwright", TagCategory::TestTech)).unwrap();
    let names = store
        .tags(Some(early.id), None)
        .into_iter()
        .map(|item| item.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Angular", "Playwright", "typescript"]);

    let skills = store.tags(None, Some(&TagCategory::Skill));
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0].name, "typescript");
}

#[test]
fn tags_by_category_groups_unknown_categories_separately() {
    let mut store = CareerStore::load(InMemoryKvRepository::new());
    let emp = store
        .create_employment(employment("Engineer", "2020-01", None)).unwrap()
        .into_value();
    let asg = store
        .create_assignment(assignment(emp.id, "Work", "2020-01", None)).unwrap()
        .into_value();
    store.create_tag(tag(asg.id, "Rust", TagCategory::Skill)).unwrap();
    store.create_tag(tag(asg.id, "Go", TagCategory::Skill)).unwrap();
    store.create_tag(tag(asg.id, "Mentoring", TagCategory::parse("leadership"))).unwrap();

    let grouped = store.tags_by_category();
    assert_eq!(grouped[&TagCategory::Skill].len(), 2);
    assert_eq!(grouped[&TagCategory::Skill][0].name, "Go");
    assert_eq!(
        grouped[&TagCategory::Other("leadership".to_string())].len(),
        1
    );
}

#[test]
fn clear_all_resets_counter() {
    let mut store = CareerStore::load(InMemoryKvRepository::new());
    store.create_employment(employment("Engineer", "2020-01", None)).unwrap();

    assert!(store.clear_all().is_persisted());
    assert!(store.data().is_empty());
    let fresh = store
        .create_employment(employment("Again", "2021-01", None)).unwrap()
        .into_value();
    assert_eq!(fresh.id, 1);
}
