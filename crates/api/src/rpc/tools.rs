//! Tool catalogue and dispatch for `tools/call`.
//!
//! Every tool returns one text block. Entity arguments accept a UUID or a
//! reference ID; with a reference the entity type is implied by its prefix.

use reqhub_core::entity::EntityType;
use reqhub_core::error::CoreError;
use reqhub_core::pagination::MAX_LIMIT;
use reqhub_core::reference_id::entity_type_of;
use reqhub_core::roles::Role;
use reqhub_core::types::DbId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::services::acceptance_criteria::{self, CreateAcceptanceCriteriaInput};
use crate::services::comments::{self, CreateCommentInput, ListCommentsQuery};
use crate::services::epics::{self, CreateEpicInput};
use crate::services::hierarchy;
use crate::services::requirements::{self, CreateRequirementInput};
use crate::services::search::{self, SearchParams, SearchResult};
use crate::services::user_stories::{self, CreateUserStoryInput};
use crate::state::AppState;

const TOOL_NAMES: &[&str] = &[
    "search",
    "get_entity",
    "epic_hierarchy",
    "create_epic",
    "create_user_story",
    "create_acceptance_criteria",
    "create_requirement",
    "change_status",
    "add_comment",
    "list_comments",
];

pub fn is_known(name: &str) -> bool {
    TOOL_NAMES.contains(&name)
}

/// `tools/list` payload.
pub fn tool_definitions() -> Vec<Value> {
    let entity_ref = json!({
        "type": "string",
        "description": "UUID or reference ID (EP-001, US-002, AC-003, REQ-004)"
    });
    let entity_type = json!({
        "type": "string",
        "enum": ["epic", "user_story", "acceptance_criteria", "requirement"],
        "description": "Required only when the id is a UUID"
    });

    vec![
        json!({
            "name": "search",
            "description": "Full-text search across epics, user stories, acceptance criteria and requirements.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "entity_types": { "type": "string", "description": "Comma-separated type tags" },
                    "status": { "type": "string" },
                    "priority": { "type": "integer", "minimum": 1, "maximum": 4 },
                    "limit": { "type": "integer", "minimum": 1, "maximum": 100 },
                    "offset": { "type": "integer", "minimum": 0 }
                }
            }
        }),
        json!({
            "name": "get_entity",
            "description": "Fetch one entity as JSON.",
            "inputSchema": {
                "type": "object",
                "properties": { "id": entity_ref, "entity_type": entity_type },
                "required": ["id"]
            }
        }),
        json!({
            "name": "epic_hierarchy",
            "description": "Outline of an epic with its user stories, acceptance criteria and requirements.",
            "inputSchema": {
                "type": "object",
                "properties": { "epic_id": entity_ref },
                "required": ["epic_id"]
            }
        }),
        json!({
            "name": "create_epic",
            "description": "Create an epic.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                    "priority": { "type": "integer", "minimum": 1, "maximum": 4 }
                },
                "required": ["title"]
            }
        }),
        json!({
            "name": "create_user_story",
            "description": "Create a user story under an epic. The description must follow \"As a <role>, I want <goal>, so that <benefit>\".",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "epic_id": entity_ref,
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                    "priority": { "type": "integer", "minimum": 1, "maximum": 4 }
                },
                "required": ["epic_id", "title"]
            }
        }),
        json!({
            "name": "create_acceptance_criteria",
            "description": "Add an acceptance criterion to a user story.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "user_story_id": entity_ref,
                    "description": { "type": "string" }
                },
                "required": ["user_story_id", "description"]
            }
        }),
        json!({
            "name": "create_requirement",
            "description": "Create a requirement under a user story.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "user_story_id": entity_ref,
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                    "requirement_type": { "type": "string", "description": "Type name, default Functional" },
                    "acceptance_criteria_id": { "type": "string", "format": "uuid" },
                    "priority": { "type": "integer", "minimum": 1, "maximum": 4 }
                },
                "required": ["user_story_id", "title"]
            }
        }),
        json!({
            "name": "change_status",
            "description": "Move an epic, user story or requirement to another status.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "id": entity_ref,
                    "entity_type": entity_type,
                    "status": { "type": "string" }
                },
                "required": ["id", "status"]
            }
        }),
        json!({
            "name": "add_comment",
            "description": "Comment on an entity, optionally as a reply.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "id": entity_ref,
                    "entity_type": entity_type,
                    "content": { "type": "string" },
                    "parent_comment_id": { "type": "string", "format": "uuid" }
                },
                "required": ["id", "content"]
            }
        }),
        json!({
            "name": "list_comments",
            "description": "Comment threads on an entity.",
            "inputSchema": {
                "type": "object",
                "properties": { "id": entity_ref, "entity_type": entity_type },
                "required": ["id"]
            }
        }),
    ]
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EntityArgs {
    id: String,
    entity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HierarchyArgs {
    epic_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusArgs {
    #[serde(flatten)]
    entity: EntityArgs,
    status: String,
}

#[derive(Debug, Deserialize)]
struct CommentArgs {
    #[serde(flatten)]
    entity: EntityArgs,
    content: String,
    parent_comment_id: Option<DbId>,
}

fn parse_args<T: DeserializeOwned>(args: Value) -> AppResult<T> {
    serde_json::from_value(args).map_err(|e| AppError::BadRequest(format!("Invalid arguments: {e}")))
}

impl EntityArgs {
    fn entity_type(&self) -> AppResult<EntityType> {
        match self.entity_type.as_deref() {
            Some(tag) => EntityType::parse(tag)
                .ok_or_else(|| CoreError::Validation(format!("Unknown entity_type '{tag}'")).into()),
            None => entity_type_of(self.id.trim()).ok_or_else(|| {
                CoreError::Validation("entity_type is required when id is not a reference ID".into())
                    .into()
            }),
        }
    }
}

fn to_text<T: Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::InternalError(format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Run a tool. The caller has already checked the name with [`is_known`].
pub async fn call(state: &AppState, user: &AuthUser, name: &str, args: Value) -> AppResult<String> {
    let pool = &state.pool;
    match name {
        "search" => {
            user.require(Role::Commenter)?;
            let options = parse_args::<SearchParams>(args)?.into_options()?;
            let (results, total) = search::search(pool, &options).await?;
            Ok(render_search(&results, total))
        }
        "get_entity" => {
            user.require(Role::Commenter)?;
            let args: EntityArgs = parse_args(args)?;
            match args.entity_type()? {
                EntityType::Epic => to_text(&epics::get(pool, &args.id).await?),
                EntityType::UserStory => to_text(&user_stories::get(pool, &args.id).await?),
                EntityType::AcceptanceCriteria => {
                    to_text(&acceptance_criteria::get(pool, &args.id).await?)
                }
                EntityType::Requirement => to_text(&requirements::get(pool, &args.id).await?),
            }
        }
        "epic_hierarchy" => {
            user.require(Role::Commenter)?;
            let args: HierarchyArgs = parse_args(args)?;
            Ok(hierarchy::epic_hierarchy(pool, &args.epic_id).await?.outline())
        }
        "create_epic" => {
            user.require(Role::User)?;
            let epic = epics::create(pool, user, parse_args::<CreateEpicInput>(args)?).await?;
            Ok(format!("Created {} {}", epic.reference_id, epic.title))
        }
        "create_user_story" => {
            user.require(Role::User)?;
            let input: CreateUserStoryInput = parse_args(args)?;
            let story = user_stories::create(pool, user, input).await?;
            Ok(format!("Created {} {}", story.reference_id, story.title))
        }
        "create_acceptance_criteria" => {
            user.require(Role::User)?;
            let input: CreateAcceptanceCriteriaInput = parse_args(args)?;
            let criteria = acceptance_criteria::create(pool, user, input).await?;
            Ok(format!("Created {} {}", criteria.reference_id, criteria.description))
        }
        "create_requirement" => {
            user.require(Role::User)?;
            let input: CreateRequirementInput = parse_args(args)?;
            let requirement = requirements::create(pool, user, input).await?;
            Ok(format!(
                "Created {} {}",
                requirement.reference_id, requirement.title
            ))
        }
        "change_status" => {
            user.require(Role::User)?;
            let args: StatusArgs = parse_args(args)?;
            let id = &args.entity.id;
            let (reference, status) = match args.entity.entity_type()? {
                EntityType::Epic => {
                    let e = epics::change_status(pool, user, id, &args.status).await?;
                    (e.reference_id, e.status)
                }
                EntityType::UserStory => {
                    let s = user_stories::change_status(pool, user, id, &args.status).await?;
                    (s.reference_id, s.status)
                }
                EntityType::Requirement => {
                    let r = requirements::change_status(pool, user, id, &args.status).await?;
                    (r.reference_id, r.status)
                }
                EntityType::AcceptanceCriteria => {
                    return Err(
                        CoreError::Validation("Acceptance criteria have no status".into()).into(),
                    );
                }
            };
            Ok(format!("{reference} is now {status}"))
        }
        "add_comment" => {
            user.require(Role::Commenter)?;
            let args: CommentArgs = parse_args(args)?;
            let entity = args.entity.entity_type()?;
            let input = CreateCommentInput {
                content: args.content,
                parent_comment_id: args.parent_comment_id,
            };
            let comment = comments::create(pool, user, entity, &args.entity.id, input).await?;
            Ok(format!("Added comment {}", comment.comment.id))
        }
        "list_comments" => {
            user.require(Role::Commenter)?;
            let args: EntityArgs = parse_args(args)?;
            let query = ListCommentsQuery {
                threaded: true,
                limit: Some(MAX_LIMIT),
                ..Default::default()
            };
            let threads = comments::list(pool, args.entity_type()?, &args.id, &query).await?;
            to_text(&threads.items)
        }
        other => Err(AppError::BadRequest(format!("Unknown tool: {other}"))),
    }
}

fn render_search(results: &[SearchResult], total: i64) -> String {
    let mut out = format!("{} of {total} results\n", results.len());
    for hit in results {
        out.push_str(&format!(
            "{} [{}] {} (score {:.2})\n",
            hit.reference_id, hit.entity_type, hit.title, hit.score
        ));
    }
    out
}
