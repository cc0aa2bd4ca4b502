//! Repository-level integration tests for the planning hierarchy.
//!
//! Exercises the repositories against a real database:
//! - hierarchy creation and lookup by id or reference
//! - filtered, ordered listings
//! - FK refusals and unique/check violations
//! - comment storage and anchor updates
//! - status model defaults and transitions

use assert_matches::assert_matches;
use reqhub_core::entity::EntityType;
use reqhub_core::pagination::{Page, SortOrder};
use reqhub_core::reference_id::Identifier;
use reqhub_core::roles::Role;
use reqhub_core::types::DbId;
use reqhub_db::models::acceptance_criteria::{AcceptanceCriteria, NewAcceptanceCriteria};
use reqhub_db::models::comment::{Anchor, CommentFilter, NewComment};
use reqhub_db::models::epic::{Epic, NewEpic, UpdateEpic};
use reqhub_db::models::filter::{EntityFilter, SortColumn};
use reqhub_db::models::relationship::NewRelationship;
use reqhub_db::models::requirement::{NewRequirement, Requirement};
use reqhub_db::models::status_model::{CreateStatus, CreateStatusModel};
use reqhub_db::models::user::CreateUser;
use reqhub_db::models::user_story::{NewUserStory, UserStory};
use reqhub_db::repositories::{
    AcceptanceCriteriaRepo, CommentRepo, EpicRepo, ReferenceIdRepo, RelationshipRepo,
    RelationshipTypeRepo, RequirementRepo, RequirementTypeRepo, StatusModelRepo, UserRepo,
    UserStoryRepo,
};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, name: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            role: Role::User,
        },
    )
    .await
    .unwrap()
    .id
}

async fn create_epic(pool: &PgPool, creator: DbId, title: &str, priority: i16) -> Epic {
    let mut tx = pool.begin().await.unwrap();
    let id = Uuid::new_v4();
    let r = ReferenceIdRepo::allocate(&mut tx, EntityType::Epic, id).await.unwrap();
    let epic = EpicRepo::insert(
        &mut *tx,
        &NewEpic {
            id,
            reference_id: r.reference_id,
            sequence_number: r.sequence_number,
            title: title.to_string(),
            description: Some(format!("{title} description")),
            priority,
            status: "Backlog".to_string(),
            creator_id: creator,
            assignee_id: Some(creator),
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    epic
}

async fn create_story(pool: &PgPool, epic: &Epic, title: &str) -> UserStory {
    let mut tx = pool.begin().await.unwrap();
    let id = Uuid::new_v4();
    let r = ReferenceIdRepo::allocate(&mut tx, EntityType::UserStory, id).await.unwrap();
    let story = UserStoryRepo::insert(
        &mut *tx,
        &NewUserStory {
            id,
            reference_id: r.reference_id,
            sequence_number: r.sequence_number,
            epic_id: epic.id,
            title: title.to_string(),
            description: Some("As a user, I want to login, so that I can work".to_string()),
            priority: 3,
            status: "Backlog".to_string(),
            creator_id: epic.creator_id,
            assignee_id: None,
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    story
}

async fn create_ac(pool: &PgPool, story: &UserStory, text: &str) -> AcceptanceCriteria {
    let mut tx = pool.begin().await.unwrap();
    let id = Uuid::new_v4();
    let r = ReferenceIdRepo::allocate(&mut tx, EntityType::AcceptanceCriteria, id)
        .await
        .unwrap();
    let ac = AcceptanceCriteriaRepo::insert(
        &mut *tx,
        &NewAcceptanceCriteria {
            id,
            reference_id: r.reference_id,
            sequence_number: r.sequence_number,
            user_story_id: story.id,
            description: text.to_string(),
            author_id: story.creator_id,
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    ac
}

async fn create_requirement(
    pool: &PgPool,
    story: &UserStory,
    ac: Option<&AcceptanceCriteria>,
    title: &str,
) -> Requirement {
    let functional = RequirementTypeRepo::find_by_name(pool, "Functional")
        .await
        .unwrap()
        .unwrap();
    let mut tx = pool.begin().await.unwrap();
    let id = Uuid::new_v4();
    let r = ReferenceIdRepo::allocate(&mut tx, EntityType::Requirement, id)
        .await
        .unwrap();
    let req = RequirementRepo::insert(
        &mut *tx,
        &NewRequirement {
            id,
            reference_id: r.reference_id,
            sequence_number: r.sequence_number,
            user_story_id: story.id,
            acceptance_criteria_id: ac.map(|a| a.id),
            requirement_type_id: functional.id,
            title: title.to_string(),
            description: None,
            priority: 2,
            status: "Draft".to_string(),
            creator_id: story.creator_id,
            assignee_id: None,
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    req
}

fn db_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_full_hierarchy(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let epic = create_epic(&pool, user, "Authentication", 2).await;
    let story = create_story(&pool, &epic, "Login").await;
    let ac = create_ac(&pool, &story, "WHEN user submits form THEN system SHALL validate").await;
    let req = create_requirement(&pool, &story, Some(&ac), "Validate credentials").await;

    assert_eq!(epic.reference_id, "EP-001");
    assert_eq!(story.reference_id, "US-001");
    assert_eq!(ac.reference_id, "AC-001");
    assert_eq!(req.reference_id, "REQ-001");
    assert_eq!(req.acceptance_criteria_id, Some(ac.id));

    let by_ref = EpicRepo::find(&pool, &Identifier::Reference("EP-001".into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_ref.id, epic.id);
    assert_eq!(by_ref.title, "Authentication");

    let by_id = UserStoryRepo::find(&pool, &Identifier::Id(story.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_id.epic_id, epic.id);

    assert_eq!(UserStoryRepo::count_for_epic(&pool, epic.id).await.unwrap(), 1);
    assert_eq!(AcceptanceCriteriaRepo::count_for_story(&pool, story.id).await.unwrap(), 1);
    assert_eq!(RequirementRepo::count_for_story(&pool, story.id).await.unwrap(), 1);
    assert_eq!(
        RequirementRepo::count_for_acceptance_criteria(&pool, ac.id).await.unwrap(),
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_is_partial(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let epic = create_epic(&pool, user, "Original", 2).await;

    let updated = EpicRepo::update(
        &pool,
        epic.id,
        &UpdateEpic {
            priority: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.title, "Original");
    assert_eq!(updated.priority, 1);
    assert_eq!(updated.description, epic.description);
    assert!(updated.updated_at >= epic.updated_at);

    let missing = EpicRepo::update(&pool, Uuid::new_v4(), &UpdateEpic::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_and_order(pool: PgPool) {
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    create_epic(&pool, alice, "Bravo", 2).await;
    create_epic(&pool, alice, "Alpha", 1).await;
    let charlie = create_epic(&pool, bob, "Charlie", 2).await;
    EpicRepo::set_status(&pool, charlie.id, "In Progress").await.unwrap();

    let by_title = EntityFilter {
        sort_by: SortColumn::Title,
        sort_order: SortOrder::Asc,
        ..Default::default()
    };
    let titles: Vec<String> = EpicRepo::list(&pool, &by_title)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert_eq!(titles, ["Alpha", "Bravo", "Charlie"]);

    let priority_two = EntityFilter {
        priority: Some(2),
        ..Default::default()
    };
    assert_eq!(EpicRepo::count(&pool, &priority_two).await.unwrap(), 2);

    let in_progress = EntityFilter {
        status: Some("in progress".to_string()),
        ..Default::default()
    };
    let rows = EpicRepo::list(&pool, &in_progress).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, charlie.id);

    let bobs = EntityFilter {
        creator_id: Some(bob),
        ..Default::default()
    };
    assert_eq!(EpicRepo::count(&pool, &bobs).await.unwrap(), 1);

    let paged = EntityFilter {
        sort_by: SortColumn::Title,
        sort_order: SortOrder::Asc,
        page: Page { limit: 1, offset: 1 },
        ..Default::default()
    };
    let page = EpicRepo::list(&pool, &paged).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title, "Bravo");
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_user_referenced_by_epic_cannot_be_deleted(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    create_epic(&pool, user, "Owned", 3).await;

    let err = UserRepo::delete(&pool, user).await.unwrap_err();
    assert_eq!(db_code(&err).as_deref(), Some("23503"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_username_is_rejected(pool: PgPool) {
    seed_user(&pool, "alice").await;
    let err = UserRepo::create(
        &pool,
        &CreateUser {
            username: "alice".to_string(),
            email: "other@example.com".to_string(),
            password_hash: "x".to_string(),
            role: Role::Commenter,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(db_code(&err).as_deref(), Some("23505"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_relationship_constraints(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let epic = create_epic(&pool, user, "Epic", 2).await;
    let story = create_story(&pool, &epic, "Story").await;
    let a = create_requirement(&pool, &story, None, "A").await;
    let b = create_requirement(&pool, &story, None, "B").await;
    let depends_on = RelationshipTypeRepo::find_by_name(&pool, "Depends_On")
        .await
        .unwrap()
        .unwrap();

    let edge = NewRelationship {
        source_requirement_id: a.id,
        target_requirement_id: b.id,
        relationship_type_id: depends_on.id,
        created_by: user,
    };
    let created = RelationshipRepo::create(&pool, &edge).await.unwrap();

    let dup = RelationshipRepo::create(&pool, &edge).await.unwrap_err();
    assert_eq!(db_code(&dup).as_deref(), Some("23505"));

    let self_loop = NewRelationship {
        target_requirement_id: a.id,
        ..edge
    };
    let err = RelationshipRepo::create(&pool, &self_loop).await.unwrap_err();
    assert_eq!(db_code(&err).as_deref(), Some("23514"));

    // Incoming and outgoing edges are both listed.
    let from_b = RelationshipRepo::list_for_requirement(&pool, b.id, Page::default()).await.unwrap();
    assert_eq!(from_b.len(), 1);
    assert_eq!(from_b[0].relationship_type, "depends_on");
    assert_eq!(from_b[0].source_reference_id, a.reference_id);

    // A referenced requirement cannot be deleted until its edges are gone.
    let err = RequirementRepo::delete(&pool, a.id).await.unwrap_err();
    assert_eq!(db_code(&err).as_deref(), Some("23503"));
    assert_eq!(RelationshipRepo::count_for_story(&pool, story.id).await.unwrap(), 1);

    RelationshipRepo::delete_for_requirements(&pool, &[a.id]).await.unwrap();
    assert!(RelationshipRepo::find_view(&pool, created.id).await.unwrap().is_none());
    assert!(RequirementRepo::delete(&pool, a.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_story_delete_cascades_children(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let epic = create_epic(&pool, user, "Epic", 2).await;
    let story = create_story(&pool, &epic, "Story").await;
    let ac = create_ac(&pool, &story, "criterion").await;
    let req = create_requirement(&pool, &story, Some(&ac), "Req").await;

    assert!(UserStoryRepo::delete(&pool, story.id).await.unwrap());
    assert!(AcceptanceCriteriaRepo::find_by_id(&pool, ac.id).await.unwrap().is_none());
    assert!(RequirementRepo::find_by_id(&pool, req.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_clearing_acceptance_criteria_orphans_requirements(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let epic = create_epic(&pool, user, "Epic", 2).await;
    let story = create_story(&pool, &epic, "Story").await;
    let ac = create_ac(&pool, &story, "criterion").await;
    let req = create_requirement(&pool, &story, Some(&ac), "Req").await;

    assert_eq!(RequirementRepo::clear_acceptance_criteria(&pool, ac.id).await.unwrap(), 1);
    assert!(AcceptanceCriteriaRepo::delete(&pool, ac.id).await.unwrap());

    let req = RequirementRepo::find_by_id(&pool, req.id).await.unwrap().unwrap();
    assert!(req.acceptance_criteria_id.is_none());
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_comment_filters_and_anchor_update(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let epic = create_epic(&pool, user, "Epic", 2).await;

    let general = CommentRepo::insert(
        &pool,
        &NewComment {
            id: Uuid::new_v4(),
            entity_type: "epic".to_string(),
            entity_id: epic.id,
            author_id: user,
            content: "Looks good".to_string(),
            parent_comment_id: None,
            anchor: None,
        },
    )
    .await
    .unwrap();
    let inline = CommentRepo::insert(
        &pool,
        &NewComment {
            id: Uuid::new_v4(),
            entity_type: "epic".to_string(),
            entity_id: epic.id,
            author_id: user,
            content: "Clarify this".to_string(),
            parent_comment_id: None,
            anchor: Some(Anchor {
                linked_text: "description".to_string(),
                start_offset: 5,
                end_offset: 16,
            }),
        },
    )
    .await
    .unwrap();
    let reply = CommentRepo::insert(
        &pool,
        &NewComment {
            id: Uuid::new_v4(),
            entity_type: "epic".to_string(),
            entity_id: epic.id,
            author_id: user,
            content: "Done".to_string(),
            parent_comment_id: Some(inline.id),
            anchor: None,
        },
    )
    .await
    .unwrap();

    assert!(!general.is_inline());
    assert!(inline.is_inline());

    let inline_only = CommentFilter {
        inline: Some(true),
        ..Default::default()
    };
    let rows = CommentRepo::list_for_entity(&pool, "epic", epic.id, &inline_only)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    let roots = CommentFilter {
        roots_only: true,
        ..Default::default()
    };
    let rows = CommentRepo::list_for_entity(&pool, "epic", epic.id, &roots)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let first_root = CommentFilter {
        page: Some(Page::new(Some(1), Some(0)).unwrap()),
        ..roots.clone()
    };
    let rows = CommentRepo::list_for_entity(&pool, "epic", epic.id, &first_root)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let total = CommentRepo::count_for_entity(&pool, "epic", epic.id, &first_root)
        .await
        .unwrap();
    assert_eq!(total, 2);

    let replies = CommentRepo::list_replies(&pool, inline.id, Page::default()).await.unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].id, reply.id);

    // Hiding keeps the last good offsets.
    CommentRepo::update_anchor(&pool, inline.id, None, true).await.unwrap();
    let hidden = CommentRepo::find_by_id(&pool, inline.id).await.unwrap().unwrap();
    assert!(hidden.is_hidden);
    assert_eq!(hidden.start_offset, Some(5));

    let visible_inline = CommentFilter {
        inline: Some(true),
        visible_only: true,
        ..Default::default()
    };
    let rows = CommentRepo::list_for_entity(&pool, "epic", epic.id, &visible_inline)
        .await
        .unwrap();
    assert!(rows.is_empty());

    CommentRepo::update_anchor(&pool, inline.id, Some((0, 11)), false).await.unwrap();
    let moved = CommentRepo::find_by_id(&pool, inline.id).await.unwrap().unwrap();
    assert!(!moved.is_hidden);
    assert_eq!((moved.start_offset, moved.end_offset), (Some(0), Some(11)));

    let resolved = CommentRepo::set_resolved(&pool, general.id, true).await.unwrap().unwrap();
    assert!(resolved.is_resolved);
    assert_eq!(resolved.content, general.content);

    // Deleting a parent removes its replies.
    assert!(CommentRepo::delete(&pool, inline.id).await.unwrap());
    assert!(CommentRepo::find_by_id(&pool, reply.id).await.unwrap().is_none());

    let removed = CommentRepo::delete_for_entities(&pool, "epic", &[epic.id]).await.unwrap();
    assert_eq!(removed, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_partial_anchor_is_rejected(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let epic = create_epic(&pool, user, "Epic", 2).await;

    let err = sqlx::query(
        "INSERT INTO comments (id, entity_type, entity_id, author_id, content, linked_text)
         VALUES ($1, 'epic', $2, $3, 'x', 'orphan')",
    )
    .bind(Uuid::new_v4())
    .bind(epic.id)
    .bind(user)
    .execute(&pool)
    .await
    .unwrap_err();
    assert_eq!(db_code(&err).as_deref(), Some("23514"));
}

// ---------------------------------------------------------------------------
// Status models
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seeded_default_workflow(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let workflow = StatusModelRepo::load_workflow(&mut conn, EntityType::Epic)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(workflow.initial_status(), Some("Backlog"));
    assert!(workflow.transitions.is_empty());
    assert!(workflow.is_final("Done"));

    let none = StatusModelRepo::load_workflow(&mut conn, EntityType::AcceptanceCriteria)
        .await
        .unwrap();
    assert!(none.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_default_model_with_transitions(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let model = StatusModelRepo::create(
        &mut tx,
        &CreateStatusModel {
            entity_type: "epic".to_string(),
            name: "Strict".to_string(),
            description: None,
            is_default: true,
        },
    )
    .await
    .unwrap();

    let status = |name: &str, order: i32, initial: bool| CreateStatus {
        name: name.to_string(),
        description: None,
        sort_order: order,
        is_initial: initial,
        is_final: false,
    };
    let open = StatusModelRepo::create_status(&mut tx, model.id, &status("Open", 1, true))
        .await
        .unwrap();
    let closed = StatusModelRepo::create_status(&mut tx, model.id, &status("Closed", 2, false))
        .await
        .unwrap();
    let edge = StatusModelRepo::create_transition(&mut tx, model.id, open.id, closed.id)
        .await
        .unwrap();
    assert_eq!(edge.from_status, "Open");
    assert_eq!(edge.to_status, "Closed");
    tx.commit().await.unwrap();

    let defaults = StatusModelRepo::list(&pool, Some(EntityType::Epic)).await.unwrap();
    assert_eq!(defaults.iter().filter(|m| m.is_default).count(), 1);

    let mut conn = pool.acquire().await.unwrap();
    let workflow = StatusModelRepo::load_workflow(&mut conn, EntityType::Epic)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(workflow.initial_status(), Some("Open"));
    assert!(workflow.validate_transition(Some("Open"), "Closed").is_ok());
    assert_matches!(workflow.validate_transition(Some("Closed"), "Open"), Err(_));

    // A status from another model cannot be used in this model's edges.
    let seeded = StatusModelRepo::list(&pool, Some(EntityType::Requirement))
        .await
        .unwrap()
        .remove(0);
    let foreign = StatusModelRepo::list_statuses(&pool, seeded.id).await.unwrap().remove(0);
    let err = StatusModelRepo::create_transition(&mut conn, model.id, open.id, foreign.id)
        .await
        .unwrap_err();
    assert_eq!(db_code(&err).as_deref(), Some("23503"));
}
