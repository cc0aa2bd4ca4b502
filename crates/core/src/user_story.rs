//! User story description template.
//!
//! Descriptions, when present and non-empty, must read
//! `As a <role>, I want <goal>, so that <benefit>` (case-insensitive,
//! flexible whitespace, `a`/`an` both accepted).

use std::sync::LazyLock;

use regex::Regex;

use crate::entity;
use crate::error::CoreError;

/// Human-readable form of the template, used in error messages.
pub const TEMPLATE: &str = "As a <role>, I want <goal>, so that <benefit>";

static TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*as\s+an?\s+(?P<role>.+?)\s*,?\s*i\s+want\s+(?P<goal>.+?)\s*,?\s*so\s+that\s+(?P<benefit>.+?)\s*$",
    )
    .expect("valid regex")
});

/// The three clauses of a user story description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryParts {
    pub role: String,
    pub goal: String,
    pub benefit: String,
}

/// Split a description into its template clauses, or `None` if it does not match.
pub fn parse_template(description: &str) -> Option<StoryParts> {
    let caps = TEMPLATE_RE.captures(description)?;
    Some(StoryParts {
        role: caps["role"].trim().to_string(),
        goal: caps["goal"].trim().to_string(),
        benefit: caps["benefit"].trim().to_string(),
    })
}

/// Validate an optional description: the shared length limit, then the
/// template. Empty and absent descriptions are accepted.
pub fn validate_description(description: Option<&str>) -> Result<(), CoreError> {
    entity::validate_description(description)?;
    match description {
        Some(d) if !d.trim().is_empty() => {
            if parse_template(d).is_some() {
                Ok(())
            } else {
                Err(CoreError::Validation(format!(
                    "user story description must follow the template: {TEMPLATE}"
                )))
            }
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn canonical_story_parses() {
        let parts =
            parse_template("As a user, I want to login, so that I can access my account").unwrap();
        assert_eq!(parts.role, "user");
        assert_eq!(parts.goal, "to login");
        assert_eq!(parts.benefit, "I can access my account");
    }

    #[test]
    fn case_and_whitespace_are_flexible() {
        assert!(parse_template("as AN   admin,\n i WANT reports,   SO THAT I sleep").is_some());
        assert!(parse_template("  As a user I want x so that y  ").is_some());
    }

    #[test]
    fn free_text_is_rejected_with_template_hint() {
        let err = validate_description(Some("wants to login")).unwrap_err();
        assert_matches!(err, CoreError::Validation(ref msg) if msg.contains("template"));
    }

    #[test]
    fn missing_clause_is_rejected() {
        assert!(parse_template("As a user, I want to login").is_none());
        assert!(parse_template("I want to login, so that I can work").is_none());
    }

    #[test]
    fn overlong_story_is_rejected_before_template_check() {
        let goal = "x".repeat(entity::MAX_DESCRIPTION_LENGTH);
        let description = format!("As a user, I want {goal}, so that it fits");
        assert!(parse_template(&description).is_some());
        let err = validate_description(Some(&description)).unwrap_err();
        assert_matches!(err, CoreError::Validation(ref msg) if msg.contains("at most"));
    }

    #[test]
    fn empty_description_is_allowed() {
        assert!(validate_description(None).is_ok());
        assert!(validate_description(Some("   ")).is_ok());
    }
}
