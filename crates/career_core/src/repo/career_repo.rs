//! In-memory career store with synchronous write-through persistence.
//!
//! # Responsibility
//! - Own employments, assignments, tags and the id allocator.
//! - Provide CRUD with cascading deletes.
//! - Persist the full snapshot after every mutation and rehydrate on load.
//!
//! # Invariants
//! - Ids are allocated from `CareerData::next_id` and never reused.
//! - Deleting an employment removes its assignments and their tags; deleting
//!   an assignment removes its tags.
//! - A failed write keeps the in-memory mutation and is reported through
//!   `Committed::persisted`.
//! - Id allocation never wraps; creates fail with `IdSpaceExhausted` instead.
//! - The store does not validate date ranges or parent references;
//!   `CareerService` does that before calling in.

use crate::model::career::{
    timestamp_now, Assignment, AssignmentPatch, CareerData, Employment, EmploymentPatch,
    EntityId, IdSpaceExhausted, NewAssignment, NewEmployment, NewTag, Tag, TagCategory, TagPatch,
};
use crate::repo::kv_repo::{KeyValueStore, RepoError, RepoResult};
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, HashSet};

/// Key of the slot holding the serialized `CareerData`.
pub const STORAGE_KEY: &str = "career_visualizer_data";

/// Result of a mutating command.
///
/// `value` reflects the in-memory state, which is kept even when the
/// write-through to storage failed.
#[derive(Debug)]
pub struct Committed<T> {
    pub value: T,
    pub persisted: RepoResult<()>,
}

impl<T> Committed<T> {
    pub fn is_persisted(&self) -> bool {
        self.persisted.is_ok()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Counts of records removed by one delete command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub employments: usize,
    pub assignments: usize,
    pub tags: usize,
}

impl DeleteSummary {
    pub fn is_empty(&self) -> bool {
        self.employments == 0 && self.assignments == 0 && self.tags == 0
    }
}

/// Owner of all career records for one user.
pub struct CareerStore<K: KeyValueStore> {
    kv: K,
    data: CareerData,
}

impl<K: KeyValueStore> CareerStore<K> {
    /// Loads stored data, falling back to an empty store.
    ///
    /// Unreadable or malformed stored data is logged and treated as absent.
    pub fn load(kv: K) -> Self {
        let data = match kv.read_value(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<CareerData>(&raw) {
                Ok(mut data) => {
                    if data.next_id == 0 {
                        data.next_id = 1;
                    }
                    match data.ensure_next_id() {
                        Ok(()) => {
                            info!(
                                "event=store_load module=store status=ok employments={} assignments={} tags={}",
                                data.employments.len(),
                                data.assignments.len(),
                                data.tags.len()
                            );
                            data
                        }
                        Err(err) => {
                            warn!(
                                "event=store_load module=store status=error error_code=id_out_of_range error={err}"
                            );
                            CareerData::default()
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        "event=store_load module=store status=error error_code=malformed_blob error={err}"
                    );
                    CareerData::default()
                }
            },
            Ok(None) => {
                info!("event=store_load module=store status=ok source=default");
                CareerData::default()
            }
            Err(err) => {
                warn!(
                    "event=store_load module=store status=error error_code=read_failed error={err}"
                );
                CareerData::default()
            }
        };
        Self { kv, data }
    }

    /// Read-only view of the full snapshot for aggregation and search.
    pub fn data(&self) -> &CareerData {
        &self.data
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Writes the current snapshot to the storage slot.
    pub fn persist(&mut self) -> RepoResult<()> {
        let result = serde_json::to_string(&self.data)
            .map_err(RepoError::from)
            .and_then(|encoded| self.kv.write_value(STORAGE_KEY, &encoded));
        match &result {
            Ok(()) => debug!("event=store_persist module=store status=ok"),
            Err(err) => error!("event=store_persist module=store status=error error={err}"),
        }
        result
    }

    fn commit<T>(&mut self, value: T) -> Committed<T> {
        let persisted = self.persist();
        Committed { value, persisted }
    }

    pub fn create_employment(
        &mut self,
        input: NewEmployment,
    ) -> Result<Committed<Employment>, IdSpaceExhausted> {
        let now = timestamp_now();
        let employment = Employment {
            id: self.data.allocate_id()?,
            title: input.title,
            company: input.company,
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: now.clone(),
            updated_at: now,
        };
        self.data.employments.push(employment.clone());
        info!(
            "event=employment_create module=store status=ok id={}",
            employment.id
        );
        Ok(self.commit(employment))
    }

    /// Applies the `Some` fields of `patch`; `None` when `id` is unknown.
    pub fn update_employment(
        &mut self,
        id: EntityId,
        patch: EmploymentPatch,
    ) -> Option<Committed<Employment>> {
        let employment = self.data.employments.iter_mut().find(|item| item.id == id)?;
        if let Some(title) = patch.title {
            employment.title = title;
        }
        if let Some(company) = patch.company {
            employment.company = company;
        }
        if let Some(start_date) = patch.start_date {
            employment.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            employment.end_date = end_date;
        }
        employment.updated_at = timestamp_now();
        let updated = employment.clone();
        info!("event=employment_update module=store status=ok id={id}");
        Some(self.commit(updated))
    }

    /// Removes an employment with its assignments and their tags.
    ///
    /// Unknown ids are a no-op that still persists.
    pub fn delete_employment(&mut self, id: EntityId) -> Committed<DeleteSummary> {
        let assignment_ids = self
            .data
            .assignments
            .iter()
            .filter(|item| item.employment_id == id)
            .map(|item| item.id)
            .collect::<HashSet<_>>();

        let tags_before = self.data.tags.len();
        self.data
            .tags
            .retain(|tag| !assignment_ids.contains(&tag.assignment_id));
        self.data
            .assignments
            .retain(|item| !assignment_ids.contains(&item.id));
        let employments_before = self.data.employments.len();
        self.data.employments.retain(|item| item.id != id);

        let summary = DeleteSummary {
            employments: employments_before - self.data.employments.len(),
            assignments: assignment_ids.len(),
            tags: tags_before - self.data.tags.len(),
        };
        info!(
            "event=employment_delete module=store status=ok id={id} employments={} assignments={} tags={}",
            summary.employments, summary.assignments, summary.tags
        );
        self.commit(summary)
    }

    pub fn employments(&self) -> Vec<Employment> {
        self.data.sorted_employments()
    }

    pub fn employment(&self, id: EntityId) -> Option<&Employment> {
        self.data.employment(id)
    }

    pub fn create_assignment(
        &mut self,
        input: NewAssignment,
    ) -> Result<Committed<Assignment>, IdSpaceExhausted> {
        let now = timestamp_now();
        let assignment = Assignment {
            id: self.data.allocate_id()?,
            employment_id: input.employment_id,
            title: input.title,
            description: input.description,
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: now.clone(),
            updated_at: now,
        };
        self.data.assignments.push(assignment.clone());
        info!(
            "event=assignment_create module=store status=ok id={} employment_id={}",
            assignment.id, assignment.employment_id
        );
        Ok(self.commit(assignment))
    }

    pub fn update_assignment(
        &mut self,
        id: EntityId,
        patch: AssignmentPatch,
    ) -> Option<Committed<Assignment>> {
        let assignment = self.data.assignments.iter_mut().find(|item| item.id == id)?;
        if let Some(employment_id) = patch.employment_id {
            assignment.employment_id = employment_id;
        }
        if let Some(title) = patch.title {
            assignment.title = title;
        }
        if let Some(description) = patch.description {
            assignment.description = description;
        }
        if let Some(start_date) = patch.start_date {
            assignment.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            assignment.end_date = end_date;
        }
        assignment.updated_at = timestamp_now();
        let updated = assignment.clone();
        info!("event=assignment_update module=store status=ok id={id}");
        Some(self.commit(updated))
    }

    /// Removes an assignment and its tags.
    pub fn delete_assignment(&mut self, id: EntityId) -> Committed<DeleteSummary> {
        let tags_before = self.data.tags.len();
        self.data.tags.retain(|tag| tag.assignment_id != id);
        let assignments_before = self.data.assignments.len();
        self.data.assignments.retain(|item| item.id != id);

        let summary = DeleteSummary {
            employments: 0,
            assignments: assignments_before - self.data.assignments.len(),
            tags: tags_before - self.data.tags.len(),
        };
        info!(
            "event=assignment_delete module=store status=ok id={id} assignments={} tags={}",
            summary.assignments, summary.tags
        );
        self.commit(summary)
    }

    pub fn assignments(&self, employment_id: Option<EntityId>) -> Vec<Assignment> {
        self.data.sorted_assignments(employment_id)
    }

    pub fn assignment(&self, id: EntityId) -> Option<&Assignment> {
        self.data.assignment(id)
    }

    pub fn create_tag(
        &mut self,
        input: NewTag,
    ) -> Result<Committed<Tag>, IdSpaceExhausted> {
        let now = timestamp_now();
        let tag = Tag {
            id: self.data.allocate_id()?,
            assignment_id: input.assignment_id,
            name: input.name,
            category: input.category,
            description: input.description,
            created_at: now.clone(),
            updated_at: now,
        };
        self.data.tags.push(tag.clone());
        info!(
            "event=tag_create module=store status=ok id={} assignment_id={} category_known={}",
            tag.id,
            tag.assignment_id,
            tag.category.is_known()
        );
        Ok(self.commit(tag))
    }

    pub fn update_tag(&mut self, id: EntityId, patch: TagPatch) -> Option<Committed<Tag>> {
        let tag = self.data.tags.iter_mut().find(|item| item.id == id)?;
        if let Some(assignment_id) = patch.assignment_id {
            tag.assignment_id = assignment_id;
        }
        if let Some(name) = patch.name {
            tag.name = name;
        }
        if let Some(category) = patch.category {
            tag.category = category;
        }
        if let Some(description) = patch.description {
            tag.description = description;
        }
        tag.updated_at = timestamp_now();
        let updated = tag.clone();
        info!("event=tag_update module=store status=ok id={id}");
        Some(self.commit(updated))
    }

    pub fn delete_tag(&mut self, id: EntityId) -> Committed<DeleteSummary> {
        let tags_before = self.data.tags.len();
        self.data.tags.retain(|tag| tag.id != id);
        let summary = DeleteSummary {
            tags: tags_before - self.data.tags.len(),
            ..DeleteSummary::default()
        };
        info!(
            "event=tag_delete module=store status=ok id={id} tags={}",
            summary.tags
        );
        self.commit(summary)
    }

    /// Tags filtered by assignment and/or category, ordered by name.
    pub fn tags(
        &self,
        assignment_id: Option<EntityId>,
        category: Option<&TagCategory>,
    ) -> Vec<Tag> {
        self.data.sorted_tags(assignment_id, category)
    }

    pub fn tag(&self, id: EntityId) -> Option<&Tag> {
        self.data.tag(id)
    }

    /// All tags grouped by category, each group ordered by name.
    pub fn tags_by_category(&self) -> BTreeMap<TagCategory, Vec<Tag>> {
        let mut grouped: BTreeMap<TagCategory, Vec<Tag>> = BTreeMap::new();
        for tag in self.data.sorted_tags(None, None) {
            grouped.entry(tag.category.clone()).or_default().push(tag);
        }
        grouped
    }

    /// Replaces the whole snapshot, e.g. after a successful import.
    pub fn replace_data(&mut self, data: CareerData) -> Committed<()> {
        self.data = data;
        info!(
            "event=store_replace module=store status=ok employments={} assignments={} tags={} next_id={}",
            self.data.employments.len(),
            self.data.assignments.len(),
            self.data.tags.len(),
            self.data.next_id
        );
        self.commit(())
    }

    /// Puts back a snapshot without writing it, after a failed replace.
    pub(crate) fn restore_unsaved(&mut self, data: CareerData) {
        self.data = data;
        warn!("event=store_restore module=store status=ok");
    }

    /// Drops every record and resets the id counter.
    pub fn clear_all(&mut self) -> Committed<()> {
        self.data = CareerData::default();
        info!("event=store_clear module=store status=ok");
        self.commit(())
    }
}
