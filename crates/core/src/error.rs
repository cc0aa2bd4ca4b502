/// Domain error taxonomy shared by every service and both external surfaces.
///
/// The set is closed: each variant has exactly one stable `code()` string and
/// the API layer maps each variant to exactly one transport status.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Inline comment anchor does not match the parent description.
    #[error("Text fragment validation failed: {0}")]
    TextFragmentValidation(String),

    /// A status name unknown to the entity's status model.
    #[error("Invalid status '{0}'")]
    InvalidStatus(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Refresh token unknown, rotated away or expired.
    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Status transition from '{from}' to '{to}' is not allowed")]
    InvalidTransition { from: String, to: String },

    /// Unique-key collision.
    #[error("Conflict: {0}")]
    Duplicate(String),

    /// Deletion blocked by a dependent row.
    #[error("Conflict: {0}")]
    InUse(String),

    /// Deletion would leave a user story without acceptance criteria.
    #[error("Conflict: {0}")]
    LastAcceptanceCriteria(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Convenience constructor for a missing entity addressed by any printable key.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code surfaced in error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation_error",
            Self::TextFragmentValidation(_) => "text_fragment_validation_failed",
            Self::InvalidStatus(_) => "invalid_status",
            Self::Unauthorized(_) => "unauthenticated",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidTransition { .. } => "forbidden_invalid_transition",
            Self::Duplicate(_) => "conflict_duplicate",
            Self::InUse(_) | Self::LastAcceptanceCriteria(_) => "conflict_in_use",
            Self::Internal(_) => "internal",
        }
    }

    /// Optional refinement of `code()` for variants that share a code.
    pub fn details(&self) -> Option<&'static str> {
        match self {
            Self::LastAcceptanceCriteria(_) => Some("conflict_last_acceptance_criteria"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_acceptance_criteria_shares_in_use_code() {
        let err = CoreError::LastAcceptanceCriteria("keep one".into());
        assert_eq!(err.code(), "conflict_in_use");
        assert_eq!(err.details(), Some("conflict_last_acceptance_criteria"));
    }

    #[test]
    fn not_found_formats_entity_and_key() {
        let err = CoreError::not_found("Epic", "EP-007");
        assert_eq!(err.to_string(), "Epic EP-007 not found");
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn transition_error_names_both_statuses() {
        let err = CoreError::InvalidTransition {
            from: "Backlog".into(),
            to: "Done".into(),
        };
        assert!(err.to_string().contains("'Backlog'"));
        assert!(err.to_string().contains("'Done'"));
        assert_eq!(err.code(), "forbidden_invalid_transition");
    }
}
