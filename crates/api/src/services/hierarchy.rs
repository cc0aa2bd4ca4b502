//! Read-only tree view of an epic and everything under it.

use reqhub_db::models::acceptance_criteria::AcceptanceCriteria;
use reqhub_db::models::epic::Epic;
use reqhub_db::models::requirement::Requirement;
use reqhub_db::models::user_story::UserStory;
use reqhub_db::repositories::{AcceptanceCriteriaRepo, RequirementRepo, UserStoryRepo};
use reqhub_db::DbPool;
use serde::Serialize;

use super::epics;
use crate::error::AppResult;

#[derive(Debug, Serialize)]
pub struct EpicHierarchy {
    #[serde(flatten)]
    pub epic: Epic,
    pub user_stories: Vec<UserStoryNode>,
}

#[derive(Debug, Serialize)]
pub struct UserStoryNode {
    #[serde(flatten)]
    pub user_story: UserStory,
    pub acceptance_criteria: Vec<AcceptanceCriteria>,
    pub requirements: Vec<Requirement>,
}

/// Load the epic with its stories, each with criteria and requirements, from
/// one snapshot.
pub async fn epic_hierarchy(pool: &DbPool, raw: &str) -> AppResult<EpicHierarchy> {
    let mut tx = pool.begin().await?;
    let epic = epics::find(&mut *tx, raw).await?;

    let stories = UserStoryRepo::list_all_for_epic(&mut *tx, epic.id).await?;
    let mut user_stories = Vec::with_capacity(stories.len());
    for user_story in stories {
        let acceptance_criteria =
            AcceptanceCriteriaRepo::list_all_for_story(&mut *tx, user_story.id).await?;
        let requirements = RequirementRepo::list_all_for_story(&mut *tx, user_story.id).await?;
        user_stories.push(UserStoryNode {
            user_story,
            acceptance_criteria,
            requirements,
        });
    }
    tx.commit().await?;

    Ok(EpicHierarchy { epic, user_stories })
}

impl EpicHierarchy {
    /// Plain-text outline used by the tool surface.
    pub fn outline(&self) -> String {
        let mut out = format!(
            "{} {} [{}] (priority {})\n",
            self.epic.reference_id, self.epic.title, self.epic.status, self.epic.priority
        );
        for node in &self.user_stories {
            let story = &node.user_story;
            out.push_str(&format!(
                "  {} {} [{}]\n",
                story.reference_id, story.title, story.status
            ));
            for ac in &node.acceptance_criteria {
                out.push_str(&format!("    {} {}\n", ac.reference_id, ac.description));
            }
            for req in &node.requirements {
                out.push_str(&format!(
                    "    {} {} [{}]\n",
                    req.reference_id, req.title, req.status
                ));
            }
        }
        out
    }
}
