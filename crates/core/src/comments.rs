//! Comment content rules and inline-anchor matching.
//!
//! Offsets are character (not byte) positions into the parent entity's
//! description, half-open: `[start, end)`.

use serde::Serialize;

use crate::error::CoreError;

/// Maximum length for a comment's content.
pub const MAX_COMMENT_LENGTH: usize = 10_000;

/// Filter values accepted by `?status=` on comment listings.
pub const COMMENT_STATUS_RESOLVED: &str = "resolved";
pub const COMMENT_STATUS_UNRESOLVED: &str = "unresolved";

/// Validate comment content: non-empty after trimming and bounded.
/// Returns the trimmed content.
pub fn validate_content(content: &str) -> Result<String, CoreError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("comment content must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_COMMENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "comment content must be at most {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Parse the `?status=` comment filter into an `is_resolved` flag.
pub fn parse_status_filter(status: &str) -> Result<bool, CoreError> {
    match status {
        COMMENT_STATUS_RESOLVED => Ok(true),
        COMMENT_STATUS_UNRESOLVED => Ok(false),
        other => Err(CoreError::Validation(format!(
            "Invalid comment status '{other}'. Must be one of: {COMMENT_STATUS_RESOLVED}, {COMMENT_STATUS_UNRESOLVED}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Anchors
// ---------------------------------------------------------------------------

/// Characters `[start, end)` of `text`, or `None` when out of range.
pub fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let mut indices = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    let start_byte = indices.nth(start)?;
    let end_byte = if end == start {
        start_byte
    } else {
        indices.nth(end - start - 1)?
    };
    Some(&text[start_byte..end_byte])
}

/// Check an inline anchor against the parent description at creation time.
///
/// Requires `0 <= start < end <= len(description)` and
/// `description[start..end] == linked_text` exactly.
pub fn validate_anchor(
    description: &str,
    linked_text: &str,
    start: i32,
    end: i32,
) -> Result<(), CoreError> {
    if linked_text.is_empty() {
        return Err(CoreError::TextFragmentValidation(
            "linked_text must not be empty".into(),
        ));
    }
    if start < 0 || end <= start {
        return Err(CoreError::TextFragmentValidation(format!(
            "offsets must satisfy 0 <= start < end, got start={start} end={end}"
        )));
    }

    let length = description.chars().count();
    if end as usize > length {
        return Err(CoreError::TextFragmentValidation(format!(
            "end offset {end} exceeds description length {length}"
        )));
    }

    match char_slice(description, start as usize, end as usize) {
        Some(fragment) if fragment == linked_text => Ok(()),
        Some(fragment) => Err(CoreError::TextFragmentValidation(format!(
            "text at [{start}, {end}) is '{fragment}', expected '{linked_text}'"
        ))),
        None => Err(CoreError::TextFragmentValidation(
            "offsets are outside the description".into(),
        )),
    }
}

/// Outcome of re-matching an anchor against an edited description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Relocation {
    /// Found exactly once; the new character offsets.
    Unique { start: i32, end: i32 },
    NotFound,
    /// Found at more than one (possibly overlapping) position.
    Ambiguous,
}

impl Relocation {
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Unique { .. })
    }
}

/// Locate `linked_text` in `description`. Overlapping occurrences count.
pub fn relocate(description: &str, linked_text: &str) -> Relocation {
    if linked_text.is_empty() {
        return Relocation::NotFound;
    }

    let mut found: Option<usize> = None;
    let mut search_from = 0;
    while let Some(pos) = description[search_from..].find(linked_text) {
        let byte = search_from + pos;
        if found.is_some() {
            return Relocation::Ambiguous;
        }
        found = Some(byte);
        // Advance one character so overlapping matches are seen.
        let step = description[byte..].chars().next().map_or(1, char::len_utf8);
        search_from = byte + step;
        if search_from > description.len() {
            break;
        }
    }

    match found {
        Some(byte) => {
            let start = description[..byte].chars().count();
            let end = start + linked_text.chars().count();
            Relocation::Unique {
                start: start as i32,
                end: end as i32,
            }
        }
        None => Relocation::NotFound,
    }
}
