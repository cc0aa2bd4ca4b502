//! Comment model: general, threaded and inline comments share one table.

use reqhub_core::pagination::Page;
use reqhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    pub author_id: DbId,
    pub content: String,
    pub parent_comment_id: Option<DbId>,
    pub is_resolved: bool,
    pub is_hidden: bool,
    pub linked_text: Option<String>,
    pub start_offset: Option<i32>,
    pub end_offset: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Comment {
    /// A comment is inline iff all three anchor fields are present.
    pub fn is_inline(&self) -> bool {
        self.linked_text.is_some() && self.start_offset.is_some() && self.end_offset.is_some()
    }
}

/// Anchor into the parent description: snapshot text plus `[start, end)`.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub linked_text: String,
    pub start_offset: i32,
    pub end_offset: i32,
}

#[derive(Debug)]
pub struct NewComment {
    pub id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    pub author_id: DbId,
    pub content: String,
    pub parent_comment_id: Option<DbId>,
    pub anchor: Option<Anchor>,
}

/// Listing filters for one entity's comments.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    /// `Some(true)` keeps only inline comments, `Some(false)` only general ones.
    pub inline: Option<bool>,
    pub is_resolved: Option<bool>,
    /// Exclude comments hidden by anchor revalidation.
    pub visible_only: bool,
    /// Only comments without a parent.
    pub roots_only: bool,
    /// Window of rows to return. `None` returns every match.
    pub page: Option<Page>,
}

/// Serialized comment with its derived flag and (optionally) nested replies.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub is_inline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<CommentView>>,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        let is_inline = comment.is_inline();
        Self {
            comment,
            is_inline,
            replies: None,
        }
    }
}
