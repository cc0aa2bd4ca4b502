//! Status models and the transition validator.
//!
//! A [`WorkflowModel`] is the in-memory snapshot of one entity type's
//! default status model: its statuses and, optionally, an explicit
//! transition graph. Every status change on every mutation path is checked
//! with [`WorkflowModel::validate_transition`].
//!
//! Rules:
//!
//! - both status names must belong to the model (`invalid_status` otherwise);
//! - on creation (no previous status) only the initial status is accepted;
//! - `from == to` is always a no-op success;
//! - with no explicit transitions every move between statuses is allowed;
//! - with explicit transitions only the listed edges are allowed.

use serde::{Deserialize, Serialize};

use crate::entity::EntityType;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Built-in status names
// ---------------------------------------------------------------------------

pub const STATUS_BACKLOG: &str = "Backlog";
pub const STATUS_DRAFT: &str = "Draft";
pub const STATUS_IN_PROGRESS: &str = "In Progress";
pub const STATUS_DONE: &str = "Done";
pub const STATUS_CANCELLED: &str = "Cancelled";
pub const STATUS_ACTIVE: &str = "Active";
pub const STATUS_OBSOLETE: &str = "Obsolete";

/// Maximum length of a status name.
pub const MAX_STATUS_NAME_LENGTH: usize = 100;

// ---------------------------------------------------------------------------
// Model snapshot
// ---------------------------------------------------------------------------

/// One status within a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDef {
    pub name: String,
    pub is_initial: bool,
    pub is_final: bool,
    pub sort_order: i32,
}

impl StatusDef {
    fn new(name: &str, is_initial: bool, is_final: bool, sort_order: i32) -> Self {
        Self {
            name: name.to_string(),
            is_initial,
            is_final,
            sort_order,
        }
    }
}

/// A directed edge `from -> to` between two statuses of the same model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDef {
    pub from: String,
    pub to: String,
}

/// Statuses plus optional explicit transitions for one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowModel {
    pub statuses: Vec<StatusDef>,
    pub transitions: Vec<TransitionDef>,
}

impl WorkflowModel {
    /// The bootstrap model used when no status model is configured for a type.
    ///
    /// Mirrors the seed data in the initial migration.
    pub fn builtin(entity: EntityType) -> Self {
        let statuses = match entity {
            EntityType::Epic | EntityType::UserStory => vec![
                StatusDef::new(STATUS_BACKLOG, true, false, 1),
                StatusDef::new(STATUS_DRAFT, false, false, 2),
                StatusDef::new(STATUS_IN_PROGRESS, false, false, 3),
                StatusDef::new(STATUS_DONE, false, true, 4),
                StatusDef::new(STATUS_CANCELLED, false, true, 5),
            ],
            EntityType::Requirement => vec![
                StatusDef::new(STATUS_DRAFT, true, false, 1),
                StatusDef::new(STATUS_ACTIVE, false, false, 2),
                StatusDef::new(STATUS_OBSOLETE, false, true, 3),
            ],
            EntityType::AcceptanceCriteria => Vec::new(),
        };
        Self {
            statuses,
            transitions: Vec::new(),
        }
    }

    /// The model's initial status: the flagged one, else the lowest `sort_order`.
    pub fn initial_status(&self) -> Option<&str> {
        self.statuses
            .iter()
            .find(|s| s.is_initial)
            .or_else(|| self.statuses.iter().min_by_key(|s| s.sort_order))
            .map(|s| s.name.as_str())
    }

    /// Resolve a status name case-insensitively to the model's spelling.
    pub fn canonical_status(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.statuses
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| s.name.as_str())
    }

    /// Whether the named status is flagged final.
    pub fn is_final(&self, name: &str) -> bool {
        self.statuses
            .iter()
            .any(|s| s.is_final && s.name.eq_ignore_ascii_case(name))
    }

    /// Authorize a status change. `from` is `None` (or empty) on creation.
    ///
    /// Returns the canonical spelling of `to` on success.
    pub fn validate_transition(&self, from: Option<&str>, to: &str) -> Result<String, CoreError> {
        let to_name = self
            .canonical_status(to)
            .ok_or_else(|| CoreError::InvalidStatus(to.to_string()))?;

        let from = from.map(str::trim).filter(|f| !f.is_empty());
        let Some(from) = from else {
            let initial = self.initial_status().unwrap_or_default();
            if to_name == initial {
                return Ok(to_name.to_string());
            }
            return Err(CoreError::InvalidTransition {
                from: String::new(),
                to: to_name.to_string(),
            });
        };

        let from_name = self
            .canonical_status(from)
            .ok_or_else(|| CoreError::InvalidStatus(from.to_string()))?;

        if from_name == to_name || self.transitions.is_empty() {
            return Ok(to_name.to_string());
        }

        let allowed = self
            .transitions
            .iter()
            .any(|t| t.from.eq_ignore_ascii_case(from_name) && t.to.eq_ignore_ascii_case(to_name));
        if allowed {
            Ok(to_name.to_string())
        } else {
            Err(CoreError::InvalidTransition {
                from: from_name.to_string(),
                to: to_name.to_string(),
            })
        }
    }

    /// Statuses reachable from `from` in one step (excluding `from` itself).
    pub fn next_statuses(&self, from: &str) -> Vec<&str> {
        self.statuses
            .iter()
            .map(|s| s.name.as_str())
            .filter(|to| !to.eq_ignore_ascii_case(from))
            .filter(|to| self.validate_transition(Some(from), to).is_ok())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Model configuration checks
// ---------------------------------------------------------------------------

/// Validate a status name: non-empty, bounded.
pub fn validate_status_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("status name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_STATUS_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "status name must be at most {MAX_STATUS_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate a full status set for one model: unique names (case-insensitive)
/// and exactly one initial status.
pub fn validate_status_set(statuses: &[StatusDef]) -> Result<(), CoreError> {
    for (i, s) in statuses.iter().enumerate() {
        validate_status_name(&s.name)?;
        if statuses[..i]
            .iter()
            .any(|other| other.name.trim().eq_ignore_ascii_case(s.name.trim()))
        {
            return Err(CoreError::Validation(format!(
                "duplicate status name '{}'",
                s.name.trim()
            )));
        }
    }

    let initial_count = statuses.iter().filter(|s| s.is_initial).count();
    if !statuses.is_empty() && initial_count != 1 {
        return Err(CoreError::Validation(format!(
            "a status model must have exactly one initial status, found {initial_count}"
        )));
    }
    Ok(())
}
