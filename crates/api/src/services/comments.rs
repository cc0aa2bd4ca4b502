//! Comment engine: general, threaded and inline comments on any primary entity.
//!
//! Inline comments anchor to a character range of the subject's description.
//! When a description changes, [`revalidate_anchors`] re-matches every anchor
//! in the same transaction: a unique match moves the offsets, anything else
//! hides the comment until a later edit restores the text.

use std::collections::HashMap;

use reqhub_core::comments::{
    parse_status_filter, relocate, validate_anchor, validate_content, Relocation,
};
use reqhub_core::entity::EntityType;
use reqhub_core::error::CoreError;
use reqhub_core::pagination::Page;
use reqhub_core::roles::Role;
use reqhub_core::types::DbId;
use reqhub_db::models::comment::{Anchor, Comment, CommentFilter, CommentView, NewComment};
use reqhub_db::repositories::{
    AcceptanceCriteriaRepo, CommentRepo, EpicRepo, RequirementRepo, UserStoryRepo,
};
use reqhub_db::DbPool;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::parse_identifier;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// Listing options for `GET /{entity}/{id}/comments`.
#[derive(Debug, Default, Deserialize)]
pub struct ListCommentsQuery {
    pub inline: Option<bool>,
    #[serde(default)]
    pub threaded: bool,
    /// `resolved` or `unresolved`.
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One page of comments plus the total number of matches.
#[derive(Debug)]
pub struct CommentPage {
    pub items: Vec<CommentView>,
    pub total: i64,
    pub page: Page,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentInput {
    pub content: String,
    pub parent_comment_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInlineCommentInput {
    pub content: String,
    pub linked_text: String,
    #[serde(alias = "start")]
    pub start_offset: i32,
    #[serde(alias = "end")]
    pub end_offset: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentInput {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateAnchorsInput {
    pub description: String,
}

/// Dry-run outcome for one inline comment against a proposed description.
#[derive(Debug, Serialize)]
pub struct AnchorCheck {
    pub comment_id: DbId,
    pub linked_text: String,
    pub start_offset: i32,
    pub end_offset: i32,
    pub currently_hidden: bool,
    pub result: Relocation,
    pub will_be_visible: bool,
}

/// What a description edit did to the subject's inline comments.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct RevalidationSummary {
    pub relocated: usize,
    pub hidden: usize,
}

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

/// The commented entity, resolved from an identifier-or-reference.
#[derive(Debug, Clone)]
pub struct Subject {
    pub entity_type: EntityType,
    pub id: DbId,
    pub reference_id: String,
    pub description: Option<String>,
}

/// Resolve `raw` to an existing entity of type `entity`.
pub async fn find_subject<'e>(
    db: impl PgExecutor<'e>,
    entity: EntityType,
    raw: &str,
) -> AppResult<Subject> {
    let identifier = parse_identifier(raw, entity)?;
    let not_found = || CoreError::not_found(entity.display_name(), raw);

    let (id, reference_id, description) = match entity {
        EntityType::Epic => EpicRepo::find(db, &identifier)
            .await?
            .map(|e| (e.id, e.reference_id, e.description)),
        EntityType::UserStory => UserStoryRepo::find(db, &identifier)
            .await?
            .map(|s| (s.id, s.reference_id, s.description)),
        EntityType::AcceptanceCriteria => AcceptanceCriteriaRepo::find(db, &identifier)
            .await?
            .map(|ac| (ac.id, ac.reference_id, Some(ac.description))),
        EntityType::Requirement => RequirementRepo::find(db, &identifier)
            .await?
            .map(|r| (r.id, r.reference_id, r.description)),
    }
    .ok_or_else(not_found)?;

    Ok(Subject {
        entity_type: entity,
        id,
        reference_id,
        description,
    })
}

async fn find_comment<'e>(db: impl PgExecutor<'e>, id: DbId) -> AppResult<Comment> {
    CommentRepo::find_by_id(db, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Comment", id).into())
}

/// Comment edits and deletes are limited to the author and administrators.
fn ensure_can_modify(actor: &AuthUser, comment: &Comment) -> AppResult<()> {
    if comment.author_id == actor.user_id || actor.role == Role::Administrator {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Only the author or an Administrator may modify this comment".into(),
        )
        .into())
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Comments on a subject, flat or as a reply tree. In threaded mode the
/// page applies to root comments.
pub async fn list(
    pool: &DbPool,
    entity: EntityType,
    raw: &str,
    query: &ListCommentsQuery,
) -> AppResult<CommentPage> {
    let page = Page::new(query.limit, query.offset)?;
    let is_resolved = query.status.as_deref().map(parse_status_filter).transpose()?;
    let subject = find_subject(pool, entity, raw).await?;

    if !query.threaded {
        let filter = CommentFilter {
            inline: query.inline,
            is_resolved,
            page: Some(page),
            ..Default::default()
        };
        let comments =
            CommentRepo::list_for_entity(pool, entity.as_str(), subject.id, &filter).await?;
        let total = CommentRepo::count_for_entity(pool, entity.as_str(), subject.id, &filter).await?;
        return Ok(CommentPage {
            items: comments.into_iter().map(CommentView::from).collect(),
            total,
            page,
        });
    }

    // Threaded: filters select roots; every root carries its full reply tree.
    let all =
        CommentRepo::list_for_entity(pool, entity.as_str(), subject.id, &CommentFilter::default())
            .await?;
    let roots: Vec<CommentView> = build_threads(all)
        .into_iter()
        .filter(|root| query.inline.map_or(true, |inline| root.is_inline == inline))
        .filter(|root| is_resolved.map_or(true, |r| root.comment.is_resolved == r))
        .collect();
    let total = roots.len() as i64;
    let items = roots
        .into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect();
    Ok(CommentPage { items, total, page })
}

/// Inline comments whose anchor currently matches the description.
pub async fn list_visible_inline(
    pool: &DbPool,
    entity: EntityType,
    raw: &str,
    page: Page,
) -> AppResult<CommentPage> {
    let subject = find_subject(pool, entity, raw).await?;
    let filter = CommentFilter {
        inline: Some(true),
        visible_only: true,
        page: Some(page),
        ..Default::default()
    };
    let comments = CommentRepo::list_for_entity(pool, entity.as_str(), subject.id, &filter).await?;
    let total = CommentRepo::count_for_entity(pool, entity.as_str(), subject.id, &filter).await?;
    Ok(CommentPage {
        items: comments.into_iter().map(CommentView::from).collect(),
        total,
        page,
    })
}

pub async fn get(pool: &DbPool, id: DbId) -> AppResult<CommentView> {
    Ok(find_comment(pool, id).await?.into())
}

/// Direct replies to a comment, oldest first.
pub async fn replies(pool: &DbPool, id: DbId, page: Page) -> AppResult<CommentPage> {
    find_comment(pool, id).await?;
    let replies = CommentRepo::list_replies(pool, id, page).await?;
    let total = CommentRepo::count_replies(pool, id).await?;
    Ok(CommentPage {
        items: replies.into_iter().map(CommentView::from).collect(),
        total,
        page,
    })
}

/// Nest a flat, chronologically ordered list into reply trees.
///
/// A comment whose parent is not in the list is treated as a root.
fn build_threads(comments: Vec<Comment>) -> Vec<CommentView> {
    let ids: std::collections::HashSet<DbId> = comments.iter().map(|c| c.id).collect();
    let mut children: HashMap<DbId, Vec<Comment>> = HashMap::new();
    let mut roots = Vec::new();

    for comment in comments {
        match comment.parent_comment_id {
            Some(parent) if ids.contains(&parent) => children.entry(parent).or_default().push(comment),
            _ => roots.push(comment),
        }
    }

    fn attach(comment: Comment, children: &mut HashMap<DbId, Vec<Comment>>) -> CommentView {
        let replies = children
            .remove(&comment.id)
            .unwrap_or_default()
            .into_iter()
            .map(|child| attach(child, children))
            .collect();
        let mut view = CommentView::from(comment);
        view.replies = Some(replies);
        view
    }

    roots
        .into_iter()
        .map(|root| attach(root, &mut children))
        .collect()
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Create a general comment, or a reply when `parent_comment_id` is set.
///
/// A reply must target a comment on the same subject; it may reply to an
/// inline comment without being inline itself.
pub async fn create(
    pool: &DbPool,
    actor: &AuthUser,
    entity: EntityType,
    raw: &str,
    input: CreateCommentInput,
) -> AppResult<CommentView> {
    let content = validate_content(&input.content)?;
    let subject = find_subject(pool, entity, raw).await?;

    if let Some(parent_id) = input.parent_comment_id {
        let parent = find_comment(pool, parent_id).await?;
        if parent.entity_type != entity.as_str() || parent.entity_id != subject.id {
            return Err(CoreError::Validation(format!(
                "parent comment {parent_id} belongs to a different entity"
            ))
            .into());
        }
    }

    let comment = CommentRepo::insert(
        pool,
        &NewComment {
            id: Uuid::new_v4(),
            entity_type: entity.as_str().to_string(),
            entity_id: subject.id,
            author_id: actor.user_id,
            content,
            parent_comment_id: input.parent_comment_id,
            anchor: None,
        },
    )
    .await?;

    tracing::info!(
        comment_id = %comment.id,
        entity_type = %entity,
        entity_id = %subject.id,
        author_id = %actor.user_id,
        is_reply = comment.parent_comment_id.is_some(),
        "Comment created"
    );
    Ok(comment.into())
}

/// Create an inline comment anchored to `[start_offset, end_offset)`.
pub async fn create_inline(
    pool: &DbPool,
    actor: &AuthUser,
    entity: EntityType,
    raw: &str,
    input: CreateInlineCommentInput,
) -> AppResult<CommentView> {
    let content = validate_content(&input.content)?;
    let subject = find_subject(pool, entity, raw).await?;

    let mut tx = pool.begin().await?;

    // Hold the subject row so the description cannot change under the check.
    let description = CommentRepo::lock_subject(&mut *tx, entity, subject.id)
        .await?
        .ok_or_else(|| CoreError::not_found(entity.display_name(), raw))?
        .unwrap_or_default();

    validate_anchor(&description, &input.linked_text, input.start_offset, input.end_offset)?;

    let comment = CommentRepo::insert(
        &mut *tx,
        &NewComment {
            id: Uuid::new_v4(),
            entity_type: entity.as_str().to_string(),
            entity_id: subject.id,
            author_id: actor.user_id,
            content,
            parent_comment_id: None,
            anchor: Some(Anchor {
                linked_text: input.linked_text,
                start_offset: input.start_offset,
                end_offset: input.end_offset,
            }),
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        comment_id = %comment.id,
        entity_type = %entity,
        entity_id = %subject.id,
        author_id = %actor.user_id,
        start = input.start_offset,
        end = input.end_offset,
        "Inline comment created"
    );
    Ok(comment.into())
}

pub async fn update(
    pool: &DbPool,
    actor: &AuthUser,
    id: DbId,
    input: UpdateCommentInput,
) -> AppResult<CommentView> {
    let content = validate_content(&input.content)?;
    let existing = find_comment(pool, id).await?;
    ensure_can_modify(actor, &existing)?;

    let comment = CommentRepo::update_content(pool, id, &content)
        .await?
        .ok_or_else(|| CoreError::not_found("Comment", id))?;

    tracing::info!(comment_id = %id, actor_id = %actor.user_id, "Comment updated");
    Ok(comment.into())
}

/// Delete a comment and, through the schema, its replies.
pub async fn delete(pool: &DbPool, actor: &AuthUser, id: DbId) -> AppResult<()> {
    let existing = find_comment(pool, id).await?;
    ensure_can_modify(actor, &existing)?;

    if !CommentRepo::delete(pool, id).await? {
        return Err(CoreError::not_found("Comment", id).into());
    }
    tracing::info!(comment_id = %id, actor_id = %actor.user_id, "Comment deleted");
    Ok(())
}

/// Set or clear the resolved flag. Idempotent.
pub async fn set_resolved(
    pool: &DbPool,
    actor: &AuthUser,
    id: DbId,
    resolved: bool,
) -> AppResult<CommentView> {
    let comment = CommentRepo::set_resolved(pool, id, resolved)
        .await?
        .ok_or_else(|| CoreError::not_found("Comment", id))?;

    tracing::info!(comment_id = %id, actor_id = %actor.user_id, resolved, "Comment resolution changed");
    Ok(comment.into())
}

// ---------------------------------------------------------------------------
// Anchor revalidation
// ---------------------------------------------------------------------------

/// Re-anchor every inline comment of a subject against its new description.
///
/// Must run on the transaction that wrote the description.
pub async fn revalidate_anchors(
    conn: &mut PgConnection,
    entity: EntityType,
    entity_id: DbId,
    description: &str,
) -> AppResult<RevalidationSummary> {
    let comments = CommentRepo::list_inline_for_update(&mut *conn, entity.as_str(), entity_id).await?;
    let mut summary = RevalidationSummary::default();

    for comment in comments {
        let Some(linked_text) = comment.linked_text.as_deref() else {
            continue;
        };
        match relocate(description, linked_text) {
            Relocation::Unique { start, end } => {
                let moved = comment.start_offset != Some(start) || comment.end_offset != Some(end);
                if moved || comment.is_hidden {
                    CommentRepo::update_anchor(&mut *conn, comment.id, Some((start, end)), false)
                        .await?;
                    summary.relocated += 1;
                }
            }
            Relocation::NotFound | Relocation::Ambiguous => {
                if !comment.is_hidden {
                    CommentRepo::update_anchor(&mut *conn, comment.id, None, true).await?;
                }
                summary.hidden += 1;
            }
        }
    }

    if summary.relocated > 0 || summary.hidden > 0 {
        tracing::info!(
            entity_type = %entity,
            entity_id = %entity_id,
            relocated = summary.relocated,
            hidden = summary.hidden,
            "Inline comment anchors revalidated"
        );
    }
    Ok(summary)
}

/// Report what [`revalidate_anchors`] would do for a proposed description.
pub async fn validate_inline(
    pool: &DbPool,
    entity: EntityType,
    raw: &str,
    input: ValidateAnchorsInput,
) -> AppResult<Vec<AnchorCheck>> {
    let subject = find_subject(pool, entity, raw).await?;
    let filter = CommentFilter {
        inline: Some(true),
        ..Default::default()
    };
    let comments = CommentRepo::list_for_entity(pool, entity.as_str(), subject.id, &filter).await?;

    Ok(comments
        .into_iter()
        .filter_map(|comment| {
            let linked_text = comment.linked_text?;
            let result = relocate(&input.description, &linked_text);
            Some(AnchorCheck {
                comment_id: comment.id,
                start_offset: comment.start_offset.unwrap_or_default(),
                end_offset: comment.end_offset.unwrap_or_default(),
                currently_hidden: comment.is_hidden,
                will_be_visible: result.is_visible(),
                result,
                linked_text,
            })
        })
        .collect())
}
