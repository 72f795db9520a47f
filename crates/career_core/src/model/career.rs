//! Career domain records: employments, assignments and experience tags.
//!
//! # Responsibility
//! - Define the persisted record shapes and their wire field names.
//! - Define create/update inputs used by store commands.
//! - Provide read-side helpers over a full `CareerData` snapshot.
//!
//! # Invariants
//! - Ids come from one counter shared by all three collections.
//! - `Assignment::employment_id` and `Tag::assignment_id` reference parents;
//!   readers skip orphans instead of failing.
//! - Wire names are camelCase (`startDate`, `employmentId`, `nextId`).

use crate::model::year_month::{self, YearMonth};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Identifier shared by every career record.
pub type EntityId = u64;

/// A period of work at one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employment {
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    pub start_date: YearMonth,
    /// `None` means ongoing.
    #[serde(default, deserialize_with = "year_month::deserialize_optional")]
    pub end_date: Option<YearMonth>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// A project or role inside one employment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: EntityId,
    pub employment_id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: YearMonth,
    #[serde(default, deserialize_with = "year_month::deserialize_optional")]
    pub end_date: Option<YearMonth>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// A categorized experience label attached to one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: EntityId,
    pub assignment_id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: TagCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Tag {
    /// Identity used for aggregation and report selection.
    pub fn key(&self) -> TagKey {
        TagKey {
            name: self.name.clone(),
            category: self.category.clone(),
        }
    }
}

/// Tag grouping; unknown categories are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagCategory {
    Skill,
    TestTargetTech,
    TestTech,
    Other(String),
}

/// Display attributes a presentation layer uses for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStyle {
    pub label: &'static str,
    pub class_name: &'static str,
    pub color: &'static str,
    pub background_color: &'static str,
}

const DEFAULT_STYLE: CategoryStyle = CategoryStyle {
    label: "Other",
    class_name: "",
    color: "#495057",
    background_color: "#e9ecef",
};

impl TagCategory {
    /// Categories offered by the tag form, in display order.
    pub fn known() -> [TagCategory; 3] {
        [Self::Skill, Self::TestTargetTech, Self::TestTech]
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Skill => "skill",
            Self::TestTargetTech => "test target tech",
            Self::TestTech => "test tech",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// Maps stored text to a category; never fails.
    pub fn parse(value: &str) -> Self {
        match value {
            "skill" => Self::Skill,
            "test target tech" => Self::TestTargetTech,
            "test tech" => Self::TestTech,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    pub fn style(&self) -> CategoryStyle {
        match self {
            Self::Skill => CategoryStyle {
                label: "Skills",
                class_name: "skill",
                color: "#ea580c",
                background_color: "#fed7aa",
            },
            Self::TestTargetTech => CategoryStyle {
                label: "Test Target Tech",
                class_name: "test-target-tech",
                color: "#2563eb",
                background_color: "#dbeafe",
            },
            Self::TestTech => CategoryStyle {
                label: "Test Tech",
                class_name: "test-tech",
                color: "#059669",
                background_color: "#dcfce7",
            },
            Self::Other(_) => DEFAULT_STYLE,
        }
    }
}

impl Default for TagCategory {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl Display for TagCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TagCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TagCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// `(name, category)` identity of a tag across assignments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagKey {
    pub name: String,
    pub category: TagCategory,
}

impl TagKey {
    pub fn new(name: impl Into<String>, category: TagCategory) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

/// Input for creating an employment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployment {
    pub title: String,
    pub company: String,
    pub start_date: YearMonth,
    pub end_date: Option<YearMonth>,
}

/// Partial update; `None` fields are left unchanged.
///
/// `end_date: Some(None)` reopens an employment as ongoing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmploymentPatch {
    pub title: Option<String>,
    pub company: Option<String>,
    pub start_date: Option<YearMonth>,
    pub end_date: Option<Option<YearMonth>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub employment_id: EntityId,
    pub title: String,
    pub description: String,
    pub start_date: YearMonth,
    pub end_date: Option<YearMonth>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentPatch {
    pub employment_id: Option<EntityId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<YearMonth>,
    pub end_date: Option<Option<YearMonth>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub assignment_id: EntityId,
    pub name: String,
    pub category: TagCategory,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPatch {
    pub assignment_id: Option<EntityId>,
    pub name: Option<String>,
    pub category: Option<TagCategory>,
    pub description: Option<String>,
}

/// The shared id counter cannot advance any further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdSpaceExhausted;

impl Display for IdSpaceExhausted {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "no record ids left to allocate")
    }
}

impl std::error::Error for IdSpaceExhausted {}

/// Complete persisted state; also the `data` object of export documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerData {
    #[serde(default)]
    pub employments: Vec<Employment>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default = "first_id")]
    pub next_id: EntityId,
}

impl Default for CareerData {
    fn default() -> Self {
        Self {
            employments: Vec::new(),
            assignments: Vec::new(),
            tags: Vec::new(),
            next_id: first_id(),
        }
    }
}

fn first_id() -> EntityId {
    1
}

impl CareerData {
    /// Highest id across all collections, `0` when empty.
    pub fn max_id(&self) -> EntityId {
        let employments = self.employments.iter().map(|item| item.id);
        let assignments = self.assignments.iter().map(|item| item.id);
        let tags = self.tags.iter().map(|item| item.id);
        employments.chain(assignments).chain(tags).max().unwrap_or(0)
    }

    /// First id above every stored id; `None` when `max_id` is `u64::MAX`.
    pub fn next_free_id(&self) -> Option<EntityId> {
        self.max_id().checked_add(1)
    }

    /// Hands out the next identifier and advances the counter.
    ///
    /// The counter is left unchanged when it cannot advance.
    pub fn allocate_id(&mut self) -> Result<EntityId, IdSpaceExhausted> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(IdSpaceExhausted)?;
        Ok(id)
    }

    /// Raises `next_id` so it never collides with a stored id.
    pub fn ensure_next_id(&mut self) -> Result<(), IdSpaceExhausted> {
        let floor = self.next_free_id().ok_or(IdSpaceExhausted)?;
        self.next_id = self.next_id.max(floor);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.employments.is_empty() && self.assignments.is_empty() && self.tags.is_empty()
    }

    pub fn employment(&self, id: EntityId) -> Option<&Employment> {
        self.employments.iter().find(|item| item.id == id)
    }

    pub fn assignment(&self, id: EntityId) -> Option<&Assignment> {
        self.assignments.iter().find(|item| item.id == id)
    }

    pub fn tag(&self, id: EntityId) -> Option<&Tag> {
        self.tags.iter().find(|item| item.id == id)
    }

    /// Employments ordered by start date, newest first.
    pub fn sorted_employments(&self) -> Vec<Employment> {
        let mut items = self.employments.clone();
        items.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        items
    }

    /// Assignments, optionally limited to one employment, newest first.
    pub fn sorted_assignments(&self, employment_id: Option<EntityId>) -> Vec<Assignment> {
        let mut items = self
            .assignments
            .iter()
            .filter(|item| employment_id.map_or(true, |id| item.employment_id == id))
            .cloned()
            .collect::<Vec<_>>();
        items.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        items
    }

    /// Tags filtered by assignment and/or category, ordered by name.
    pub fn sorted_tags(
        &self,
        assignment_id: Option<EntityId>,
        category: Option<&TagCategory>,
    ) -> Vec<Tag> {
        let mut items = self
            .tags
            .iter()
            .filter(|item| assignment_id.map_or(true, |id| item.assignment_id == id))
            .filter(|item| category.map_or(true, |category| &item.category == category))
            .cloned()
            .collect::<Vec<_>>();
        items.sort_by(|a, b| compare_names(&a.name, &b.name));
        items
    }
}

/// Case-insensitive name collation with a stable tiebreak.
pub fn compare_names(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}

/// Current UTC time as an RFC 3339 timestamp.
pub fn timestamp_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{compare_names, CareerData, IdSpaceExhausted, Tag, TagCategory};
    use std::cmp::Ordering;

    #[test]
    fn category_round_trips_known_and_unknown_text() {
        assert_eq!(TagCategory::parse("skill"), TagCategory::Skill);
        assert_eq!(TagCategory::parse("test tech"), TagCategory::TestTech);
        let other = TagCategory::parse("soft skill");
        assert_eq!(other, TagCategory::Other("soft skill".to_string()));
        assert_eq!(other.as_str(), "soft skill");
        assert!(!other.is_known());
    }

    #[test]
    fn unknown_category_gets_default_style() {
        let style = TagCategory::parse("mystery").style();
        assert_eq!(style.class_name, "");
        assert_eq!(style.background_color, "#e9ecef");
        assert_eq!(TagCategory::TestTargetTech.style().class_name, "test-target-tech");
    }

    #[test]
    fn data_defaults_missing_fields() {
        let data: CareerData = serde_json::from_str("{}").unwrap();
        assert_eq!(data, CareerData::default());
        assert_eq!(data.next_id, 1);
    }

    #[test]
    fn tag_wire_shape_uses_camel_case() {
        let json = serde_json::json!({
            "id": 7,
            "assignmentId": 3,
            "name": "Rust",
            "category": "skill"
        });
        let tag: Tag = serde_json::from_value(json).unwrap();
        assert_eq!(tag.assignment_id, 3);
        assert_eq!(tag.description, "");

        let encoded = serde_json::to_value(&tag).unwrap();
        assert_eq!(encoded["assignmentId"], 3);
        assert_eq!(encoded["category"], "skill");
    }

    #[test]
    fn names_collate_case_insensitively() {
        assert_eq!(compare_names("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_names("Zeta", "alpha"), Ordering::Greater);
    }

    #[test]
    fn ensure_next_id_moves_past_existing_ids() {
        let mut data: CareerData = serde_json::from_value(serde_json::json!({
            "employments": [{"id": 9, "startDate": "2020-01"}],
            "nextId": 2
        }))
        .unwrap();
        data.ensure_next_id().unwrap();
        assert_eq!(data.next_id, 10);
    }

    #[test]
    fn id_counter_refuses_to_wrap() {
        let mut data = CareerData {
            next_id: u64::MAX,
            ..CareerData::default()
        };
        assert_eq!(data.allocate_id(), Err(IdSpaceExhausted));
        assert_eq!(data.next_id, u64::MAX);

        data.next_id = u64::MAX - 1;
        assert_eq!(data.allocate_id(), Ok(u64::MAX - 1));
        assert_eq!(data.next_id, u64::MAX);
    }

    #[test]
    fn ensure_next_id_rejects_maximum_stored_id() {
        let mut data: CareerData = serde_json::from_value(serde_json::json!({
            "tags": [{"id": u64::MAX, "assignmentId": 1, "name": "x"}]
        }))
        .unwrap();
        assert_eq!(data.next_free_id(), None);
        assert_eq!(data.ensure_next_id(), Err(IdSpaceExhausted));
    }
}
