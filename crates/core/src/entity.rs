//! Entity kinds, priority levels and field validation shared by the four
//! primary entity services.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 500;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 50_000;

// ---------------------------------------------------------------------------
// Entity type
// ---------------------------------------------------------------------------

/// The four primary entity kinds.
///
/// Comments, search results and the reference-ID allocator all dispatch on
/// this tag rather than on a shared supertype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Epic,
    UserStory,
    AcceptanceCriteria,
    Requirement,
}

impl EntityType {
    pub const ALL: [EntityType; 4] = [
        Self::Epic,
        Self::UserStory,
        Self::AcceptanceCriteria,
        Self::Requirement,
    ];

    /// Return the type tag as stored in the database (`comments.entity_type`,
    /// `status_models.entity_type`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Epic => "epic",
            Self::UserStory => "user_story",
            Self::AcceptanceCriteria => "acceptance_criteria",
            Self::Requirement => "requirement",
        }
    }

    /// Parse a stored type tag. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "epic" => Some(Self::Epic),
            "user_story" => Some(Self::UserStory),
            "acceptance_criteria" => Some(Self::AcceptanceCriteria),
            "requirement" => Some(Self::Requirement),
            _ => None,
        }
    }

    /// Human-readable name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Epic => "Epic",
            Self::UserStory => "UserStory",
            Self::AcceptanceCriteria => "AcceptanceCriteria",
            Self::Requirement => "Requirement",
        }
    }

    /// Whether this entity kind carries a status, priority and assignee.
    pub fn has_workflow(&self) -> bool {
        !matches!(self, Self::AcceptanceCriteria)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Priority levels. Stored as SMALLINT where 1 is the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i16)]
pub enum Priority {
    Critical = 1,
    High = 2,
    Medium = 3,
    Low = 4,
}

impl Priority {
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Critical),
            2 => Some(Self::High),
            3 => Some(Self::Medium),
            4 => Some(Self::Low),
            _ => None,
        }
    }
}

/// Validate a raw priority value, returning it unchanged when in `1..=4`.
pub fn validate_priority(value: i16) -> Result<i16, CoreError> {
    Priority::from_i16(value)
        .map(|p| p as i16)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "priority must be between 1 (Critical) and 4 (Low), got {value}"
            ))
        })
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

/// Validate an entity title: non-empty after trimming and at most
/// [`MAX_TITLE_LENGTH`] characters. Returns the trimmed title.
pub fn validate_title(title: &str) -> Result<String, CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("title must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate an optional description's length.
pub fn validate_description(description: Option<&str>) -> Result<(), CoreError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LENGTH => Err(CoreError::Validation(
            format!("description must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        )),
        _ => Ok(()),
    }
}

/// Cut a description to `max_chars` characters, appending `...` when cut.
pub fn truncate_description(description: &str, max_chars: usize) -> String {
    if description.chars().count() <= max_chars {
        return description.to_string();
    }
    let cut: String = description.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
