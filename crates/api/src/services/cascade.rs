//! Transitive removal of entity subtrees.
//!
//! The schema cascades stories, acceptance criteria and requirements from
//! their parents, but relationships restrict requirement deletes and comments
//! are not foreign-keyed to their subject. These helpers clear both before
//! the parent row is removed. All of them run on the caller's transaction.

use reqhub_core::entity::EntityType;
use reqhub_core::types::DbId;
use reqhub_db::repositories::{
    AcceptanceCriteriaRepo, CommentRepo, RelationshipRepo, RequirementRepo, UserStoryRepo,
};
use sqlx::PgConnection;

use crate::error::AppResult;

/// Rows removed alongside the addressed entity.
#[derive(Debug, Default, Clone, Copy)]
pub struct CascadeSummary {
    pub user_stories: usize,
    pub acceptance_criteria: usize,
    pub requirements: usize,
    pub relationships: u64,
    pub comments: u64,
}

/// Clear relationships and comments of the given requirements.
pub async fn purge_requirements(
    conn: &mut PgConnection,
    requirement_ids: &[DbId],
    summary: &mut CascadeSummary,
) -> AppResult<()> {
    if requirement_ids.is_empty() {
        return Ok(());
    }
    summary.relationships += RelationshipRepo::delete_for_requirements(&mut *conn, requirement_ids).await?;
    summary.comments += CommentRepo::delete_for_entities(
        &mut *conn,
        EntityType::Requirement.as_str(),
        requirement_ids,
    )
    .await?;
    summary.requirements += requirement_ids.len();
    Ok(())
}

/// Clear everything hanging off a user story except the story row itself:
/// requirement relationships and the comments of its requirements, acceptance
/// criteria and of the story. The rows themselves go with the story.
pub async fn purge_story(
    conn: &mut PgConnection,
    story_id: DbId,
    summary: &mut CascadeSummary,
) -> AppResult<()> {
    let requirement_ids: Vec<DbId> = RequirementRepo::list_all_for_story(&mut *conn, story_id)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();
    purge_requirements(conn, &requirement_ids, summary).await?;

    let criteria_ids: Vec<DbId> = AcceptanceCriteriaRepo::list_all_for_story(&mut *conn, story_id)
        .await?
        .into_iter()
        .map(|ac| ac.id)
        .collect();
    if !criteria_ids.is_empty() {
        summary.comments += CommentRepo::delete_for_entities(
            &mut *conn,
            EntityType::AcceptanceCriteria.as_str(),
            &criteria_ids,
        )
        .await?;
        summary.acceptance_criteria += criteria_ids.len();
    }

    summary.comments +=
        CommentRepo::delete_for_entities(&mut *conn, EntityType::UserStory.as_str(), &[story_id])
            .await?;
    Ok(())
}

/// Clear every story under an epic, plus the epic's own comments.
pub async fn purge_epic(
    conn: &mut PgConnection,
    epic_id: DbId,
    summary: &mut CascadeSummary,
) -> AppResult<()> {
    let stories = UserStoryRepo::list_all_for_epic(&mut *conn, epic_id).await?;
    for story in &stories {
        purge_story(conn, story.id, summary).await?;
    }
    summary.user_stories += stories.len();

    summary.comments +=
        CommentRepo::delete_for_entities(&mut *conn, EntityType::Epic.as_str(), &[epic_id]).await?;
    Ok(())
}
