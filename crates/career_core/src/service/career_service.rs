//! Validated career commands.
//!
//! # Responsibility
//! - Check date ranges, required text fields and parent references before a
//!   command reaches the store.
//! - Give presentation layers one entry point for mutations.
//!
//! # Invariants
//! - A rejected command leaves the store untouched.
//! - Edits are validated against the merged (existing + patch) record.
//! - Unknown ids on edit return `Ok(None)`; unknown ids on delete are no-ops.

use crate::model::career::{
    Assignment, AssignmentPatch, Employment, EmploymentPatch, EntityId, IdSpaceExhausted,
    NewAssignment, NewEmployment, NewTag, Tag, TagPatch,
};
use crate::model::year_month::{is_ordered, YearMonth};
use crate::repo::career_repo::{CareerStore, Committed, DeleteSummary};
use crate::repo::kv_repo::KeyValueStore;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Command rejected before any mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    BlankField(&'static str),
    /// `end` precedes `start`.
    InvalidDateRange { start: YearMonth, end: YearMonth },
    EmploymentNotFound(EntityId),
    AssignmentNotFound(EntityId),
    /// The shared id counter is at its ceiling.
    IdSpaceExhausted,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be empty"),
            Self::InvalidDateRange { start, end } => write!(
                f,
                "invalid date range: end date {end} must not be before start date {start}"
            ),
            Self::EmploymentNotFound(id) => write!(f, "employment not found: {id}"),
            Self::AssignmentNotFound(id) => write!(f, "assignment not found: {id}"),
            Self::IdSpaceExhausted => write!(f, "{}", IdSpaceExhausted),
        }
    }
}

impl Error for ValidationError {}

impl From<IdSpaceExhausted> for ValidationError {
    fn from(_: IdSpaceExhausted) -> Self {
        Self::IdSpaceExhausted
    }
}

pub type ServiceResult<T> = Result<T, ValidationError>;

/// Use-case facade over a `CareerStore`.
pub struct CareerService<K: KeyValueStore> {
    store: CareerStore<K>,
}

impl<K: KeyValueStore> CareerService<K> {
    pub fn new(store: CareerStore<K>) -> Self {
        Self { store }
    }

    /// Loads the store from `kv` and wraps it.
    pub fn load(kv: K) -> Self {
        Self::new(CareerStore::load(kv))
    }

    pub fn store(&self) -> &CareerStore<K> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CareerStore<K> {
        &mut self.store
    }

    pub fn into_store(self) -> CareerStore<K> {
        self.store
    }

    pub fn add_employment(&mut self, input: NewEmployment) -> ServiceResult<Committed<Employment>> {
        require_text("title", &input.title)?;
        require_text("company", &input.company)?;
        require_range(input.start_date, input.end_date)?;
        Ok(self.store.create_employment(input)?)
    }

    pub fn edit_employment(
        &mut self,
        id: EntityId,
        patch: EmploymentPatch,
    ) -> ServiceResult<Option<Committed<Employment>>> {
        let Some(existing) = self.store.employment(id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title.as_deref() {
            require_text("title", title)?;
        }
        if let Some(company) = patch.company.as_deref() {
            require_text("company", company)?;
        }
        require_range(
            patch.start_date.unwrap_or(existing.start_date),
            patch.end_date.unwrap_or(existing.end_date),
        )?;
        Ok(self.store.update_employment(id, patch))
    }

    pub fn remove_employment(&mut self, id: EntityId) -> Committed<DeleteSummary> {
        self.store.delete_employment(id)
    }

    pub fn add_assignment(&mut self, input: NewAssignment) -> ServiceResult<Committed<Assignment>> {
        require_text("title", &input.title)?;
        require_range(input.start_date, input.end_date)?;
        self.require_employment(input.employment_id)?;
        Ok(self.store.create_assignment(input)?)
    }

    pub fn edit_assignment(
        &mut self,
        id: EntityId,
        patch: AssignmentPatch,
    ) -> ServiceResult<Option<Committed<Assignment>>> {
        let Some(existing) = self.store.assignment(id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title.as_deref() {
            require_text("title", title)?;
        }
        require_range(
            patch.start_date.unwrap_or(existing.start_date),
            patch.end_date.unwrap_or(existing.end_date),
        )?;
        if let Some(employment_id) = patch.employment_id {
            self.require_employment(employment_id)?;
        }
        Ok(self.store.update_assignment(id, patch))
    }

    pub fn remove_assignment(&mut self, id: EntityId) -> Committed<DeleteSummary> {
        self.store.delete_assignment(id)
    }

    pub fn add_tag(&mut self, input: NewTag) -> ServiceResult<Committed<Tag>> {
        require_text("name", &input.name)?;
        self.require_assignment(input.assignment_id)?;
        Ok(self.store.create_tag(input)?)
    }

    pub fn edit_tag(&mut self, id: EntityId, patch: TagPatch) -> ServiceResult<Option<Committed<Tag>>> {
        if self.store.tag(id).is_none() {
            return Ok(None);
        }
        if let Some(name) = patch.name.as_deref() {
            require_text("name", name)?;
        }
        if let Some(assignment_id) = patch.assignment_id {
            self.require_assignment(assignment_id)?;
        }
        Ok(self.store.update_tag(id, patch))
    }

    pub fn remove_tag(&mut self, id: EntityId) -> Committed<DeleteSummary> {
        self.store.delete_tag(id)
    }

    fn require_employment(&self, id: EntityId) -> ServiceResult<()> {
        if self.store.employment(id).is_none() {
            warn!("event=command_rejected module=service reason=employment_not_found id={id}");
            return Err(ValidationError::EmploymentNotFound(id));
        }
        Ok(())
    }

    fn require_assignment(&self, id: EntityId) -> ServiceResult<()> {
        if self.store.assignment(id).is_none() {
            warn!("event=command_rejected module=service reason=assignment_not_found id={id}");
            return Err(ValidationError::AssignmentNotFound(id));
        }
        Ok(())
    }
}

fn require_text(field: &'static str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        warn!("event=command_rejected module=service reason=blank_field field={field}");
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

fn require_range(start: YearMonth, end: Option<YearMonth>) -> ServiceResult<()> {
    match end {
        Some(end) if !is_ordered(start, Some(end)) => {
            warn!(
                "event=command_rejected module=service reason=invalid_date_range start={start} end={end}"
            );
            Err(ValidationError::InvalidDateRange { start, end })
        }
        _ => Ok(()),
    }
}
