//! Human-readable reference IDs (`EP-001`, `US-014`, `AC-1a2b3c4d`, ...)
//! and identifier-or-reference parsing for every entity-addressing input.
//!
//! Two reference forms coexist:
//!
//! - sequential: prefix + zero-padded counter (three digits below 1000,
//!   wider above), allocated under an advisory lock;
//! - fallback: prefix + the first eight hex characters of the entity's
//!   UUID, used when the lock is contended. If those eight are already
//!   taken the form widens to sixteen, then to the full 32-character id.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::entity::EntityType;
use crate::error::CoreError;
use crate::types::DbId;

/// Number of UUID hex characters used by the fallback form.
pub const FALLBACK_HEX_LENGTH: usize = 8;

/// Widths tried in order. The last is the whole id, so it cannot collide
/// with another row's fallback.
pub const FALLBACK_HEX_WIDTHS: [usize; 3] = [FALLBACK_HEX_LENGTH, 16, 32];

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(EP|US|AC|REQ)-([0-9]{3,}|[0-9a-f]{8}|[0-9a-f]{16}|[0-9a-f]{32})$")
        .expect("valid regex")
});

/// Reference prefix for an entity type.
pub fn prefix(entity: EntityType) -> &'static str {
    match entity {
        EntityType::Epic => "EP",
        EntityType::UserStory => "US",
        EntityType::AcceptanceCriteria => "AC",
        EntityType::Requirement => "REQ",
    }
}

/// Advisory-lock key serializing sequential allocation per entity type.
pub fn lock_key(entity: EntityType) -> i64 {
    match entity {
        EntityType::Epic => 1001,
        EntityType::UserStory => 1002,
        EntityType::AcceptanceCriteria => 1003,
        EntityType::Requirement => 1004,
    }
}

/// Format a sequential reference, e.g. `format_sequential(Epic, 7) == "EP-007"`.
pub fn format_sequential(entity: EntityType, sequence: i32) -> String {
    format!("{}-{:03}", prefix(entity), sequence)
}

/// Format the contention fallback reference derived from the entity's own id.
pub fn format_fallback(entity: EntityType, id: DbId) -> String {
    format_fallback_width(entity, id, FALLBACK_HEX_LENGTH)
}

/// Fallback reference using the first `width` hex characters of `id`.
pub fn format_fallback_width(entity: EntityType, id: DbId, width: usize) -> String {
    let hex = id.simple().to_string();
    format!("{}-{}", prefix(entity), &hex[..width.min(hex.len())])
}

/// Fallback candidates from narrowest to the full id.
pub fn fallback_candidates(entity: EntityType, id: DbId) -> Vec<String> {
    FALLBACK_HEX_WIDTHS
        .iter()
        .map(|&width| format_fallback_width(entity, id, width))
        .collect()
}

/// Entity type implied by a reference's prefix, if it is a well-formed reference.
pub fn entity_type_of(reference: &str) -> Option<EntityType> {
    let caps = REFERENCE_RE.captures(reference)?;
    match &caps[1] {
        "EP" => Some(EntityType::Epic),
        "US" => Some(EntityType::UserStory),
        "AC" => Some(EntityType::AcceptanceCriteria),
        "REQ" => Some(EntityType::Requirement),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Identifier-or-reference
// ---------------------------------------------------------------------------

/// An entity address: either the opaque UUID or the human reference ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Id(DbId),
    Reference(String),
}

impl Identifier {
    /// Route a raw path segment or tool argument on its syntax.
    ///
    /// A 36-character dashed UUID becomes [`Identifier::Id`]; a well-formed
    /// reference whose prefix belongs to `expected` becomes
    /// [`Identifier::Reference`]. Anything else is a validation error.
    pub fn parse(raw: &str, expected: EntityType) -> Result<Self, CoreError> {
        let raw = raw.trim();
        if raw.len() == 36 {
            if let Ok(id) = Uuid::parse_str(raw) {
                return Ok(Self::Id(id));
            }
        }

        match entity_type_of(raw) {
            Some(found) if found == expected => Ok(Self::Reference(raw.to_string())),
            Some(found) => Err(CoreError::Validation(format!(
                "reference '{raw}' belongs to {} but a {} was expected",
                found.display_name(),
                expected.display_name()
            ))),
            None => Err(CoreError::Validation(format!(
                "'{raw}' is neither a UUID nor a {} reference ID ({}-...)",
                expected.display_name(),
                prefix(expected)
            ))),
        }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Reference(r) => f.write_str(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn sequential_is_three_digits_below_one_thousand() {
        assert_eq!(format_sequential(EntityType::Epic, 1), "EP-001");
        assert_eq!(format_sequential(EntityType::UserStory, 42), "US-042");
        assert_eq!(format_sequential(EntityType::Requirement, 999), "REQ-999");
        assert_eq!(format_sequential(EntityType::AcceptanceCriteria, 1000), "AC-1000");
    }

    #[test]
    fn fallback_uses_first_eight_hex_chars() {
        let id = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").unwrap();
        assert_eq!(format_fallback(EntityType::Epic, id), "EP-1a2b3c4d");
        let re = Regex::new(r"^EP-[0-9a-f]{8}$").unwrap();
        assert!(re.is_match(&format_fallback(EntityType::Epic, Uuid::new_v4())));
    }

    #[test]
    fn fallback_candidates_widen_to_the_full_id() {
        let id = Uuid::parse_str("1a2b3c4d-5e6f-4000-8000-00000000abcd").unwrap();
        let candidates = fallback_candidates(EntityType::Requirement, id);
        assert_eq!(
            candidates,
            [
                "REQ-1a2b3c4d",
                "REQ-1a2b3c4d5e6f4000",
                "REQ-1a2b3c4d5e6f4000800000000000abcd",
            ]
        );
        for candidate in &candidates {
            assert_eq!(entity_type_of(candidate), Some(EntityType::Requirement));
        }
    }

    #[test]
    fn lock_keys_are_distinct() {
        let mut keys: Vec<i64> = EntityType::ALL.iter().map(|t| lock_key(*t)).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn both_forms_are_recognised() {
        assert_eq!(entity_type_of("EP-001"), Some(EntityType::Epic));
        assert_eq!(entity_type_of("REQ-1a2b3c4d"), Some(EntityType::Requirement));
        assert_eq!(entity_type_of("EP-1"), None);
        assert_eq!(entity_type_of("XX-001"), None);
    }

    #[test]
    fn parse_routes_on_syntax() {
        let id = Uuid::new_v4();
        assert_eq!(
            Identifier::parse(&id.to_string(), EntityType::Epic).unwrap(),
            Identifier::Id(id)
        );
        assert_eq!(
            Identifier::parse("US-003", EntityType::UserStory).unwrap(),
            Identifier::Reference("US-003".into())
        );
    }

    #[test]
    fn parse_rejects_wrong_prefix_and_garbage() {
        assert_matches!(
            Identifier::parse("US-003", EntityType::Epic),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            Identifier::parse("not-an-id", EntityType::Epic),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            Identifier::parse("123", EntityType::Requirement),
            Err(CoreError::Validation(_))
        );
    }
}
