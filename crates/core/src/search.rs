//! Search constants and query helpers.
//!
//! The ranking itself happens in PostgreSQL (`ts_rank` over weighted
//! `tsvector` columns); this module sanitizes user input into safe
//! `tsquery`/`ILIKE` arguments and parses the option vocabulary.

use crate::entity::EntityType;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Score given to an exact reference-ID match.
pub const REFERENCE_MATCH_SCORE: f32 = 1.0;

/// Floor score for a plain title substring hit with no full-text match.
pub const SUBSTRING_MATCH_SCORE: f32 = 0.1;

/// Length of descriptions in search results.
pub const RESULT_DESCRIPTION_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Options vocabulary
// ---------------------------------------------------------------------------

/// Sort key for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Relevance,
    CreatedAt,
    UpdatedAt,
}

impl SortBy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "relevance" => Some(Self::Relevance),
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            _ => None,
        }
    }
}

/// Parse the `type` filter: a comma-separated subset of entity type tags.
/// Absent or empty selects every type.
pub fn parse_entity_types(value: Option<&str>) -> Result<Vec<EntityType>, CoreError> {
    let raw = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(EntityType::ALL.to_vec()),
    };

    let mut types = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let t = EntityType::parse(part).ok_or_else(|| {
            CoreError::Validation(format!(
                "unknown entity type '{part}'; expected epic, user_story, acceptance_criteria or requirement"
            ))
        })?;
        if !types.contains(&t) {
            types.push(t);
        }
    }
    Ok(types)
}

// ---------------------------------------------------------------------------
// Query builder helpers
// ---------------------------------------------------------------------------

/// Sanitize user input into a list of terms suitable for tsquery construction.
///
/// - Splits on whitespace.
/// - Strips non-alphanumeric characters (except `_`) from each term.
/// - Drops empty terms.
///
/// Returns `None` if the input yields no usable terms.
fn sanitize_terms(query: &str) -> Option<Vec<String>> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|t| {
            t.chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|t| !t.is_empty())
        .collect();

    if terms.is_empty() { None } else { Some(terms) }
}

/// Convert user input into a PostgreSQL `tsquery` string with AND semantics.
///
/// # Examples
///
/// ```
/// use reqhub_core::search::build_tsquery;
/// assert_eq!(build_tsquery("login form"), Some("login & form".to_string()));
/// assert_eq!(build_tsquery("  "), None);
/// ```
pub fn build_tsquery(query: &str) -> Option<String> {
    sanitize_terms(query).map(|terms| terms.join(" & "))
}

/// Escape `%`, `_` and `\` so user text is matched literally by `ILIKE`.
pub fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Clamp a raw score into `[0, 1]`.
pub fn normalize_score(raw: f32) -> f32 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 1.0)
}
