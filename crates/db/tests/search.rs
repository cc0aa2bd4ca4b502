//! Unified search across entity tables.

use reqhub_core::entity::EntityType;
use reqhub_core::pagination::{Page, SortOrder};
use reqhub_core::roles::Role;
use reqhub_core::search::SortBy;
use reqhub_core::types::DbId;
use reqhub_db::models::acceptance_criteria::NewAcceptanceCriteria;
use reqhub_db::models::epic::{Epic, NewEpic};
use reqhub_db::models::search::SearchOptions;
use reqhub_db::models::user::CreateUser;
use reqhub_db::models::user_story::NewUserStory;
use reqhub_db::repositories::{
    AcceptanceCriteriaRepo, EpicRepo, ReferenceIdRepo, SearchRepo, UserRepo, UserStoryRepo,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_user(pool: &PgPool) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: "searcher".to_string(),
            email: "searcher@example.com".to_string(),
            password_hash: "x".to_string(),
            role: Role::User,
        },
    )
    .await
    .unwrap()
    .id
}

async fn epic(pool: &PgPool, creator: DbId, title: &str, description: &str, priority: i16) -> Epic {
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
            description: Some(description.to_string()),
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

/// Epics plus one story and one acceptance criterion under the first epic.
async fn seed_corpus(pool: &PgPool) -> Vec<Epic> {
    let user = seed_user(pool).await;
    let epics = vec![
        epic(pool, user, "User Authentication", "Login and session handling", 1).await,
        epic(pool, user, "Reporting", "Dashboards for authentication metrics", 2).await,
        epic(pool, user, "Billing", "Invoices and payments", 3).await,
    ];

    let mut tx = pool.begin().await.unwrap();
    let story_id = Uuid::new_v4();
    let r = ReferenceIdRepo::allocate(&mut tx, EntityType::UserStory, story_id)
        .await
        .unwrap();
    UserStoryRepo::insert(
        &mut *tx,
        &NewUserStory {
            id: story_id,
            reference_id: r.reference_id,
            sequence_number: r.sequence_number,
            epic_id: epics[0].id,
            title: "Password reset".to_string(),
            description: Some(
                "As a user, I want to reset my password, so that I can log in again".to_string(),
            ),
            priority: 2,
            status: "Backlog".to_string(),
            creator_id: user,
            assignee_id: None,
        },
    )
    .await
    .unwrap();

    let ac_id = Uuid::new_v4();
    let r = ReferenceIdRepo::allocate(&mut tx, EntityType::AcceptanceCriteria, ac_id)
        .await
        .unwrap();
    AcceptanceCriteriaRepo::insert(
        &mut *tx,
        &NewAcceptanceCriteria {
            id: ac_id,
            reference_id: r.reference_id,
            sequence_number: r.sequence_number,
            user_story_id: story_id,
            description: "WHEN the reset link expires THEN the system SHALL reject it".to_string(),
            author_id: user,
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    epics
}

fn query(q: &str) -> SearchOptions {
    SearchOptions {
        query: Some(q.to_string()),
        ..Default::default()
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn title_match_ranks_above_description_match(pool: PgPool) {
    let epics = seed_corpus(&pool).await;

    let options = SearchOptions {
        entity_types: vec![EntityType::Epic],
        ..query("authentication")
    };
    let rows = SearchRepo::search(&pool, &options).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, epics[0].id);
    assert_eq!(rows[1].id, epics[1].id);
    assert!(rows[0].score > rows[1].score);
    for row in &rows {
        assert!((0.0..=1.0).contains(&row.score));
        assert_eq!(row.entity_type, "epic");
    }
    assert_eq!(SearchRepo::count(&pool, &options).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reference_match_scores_one(pool: PgPool) {
    seed_corpus(&pool).await;

    let rows = SearchRepo::search(&pool, &query("ep-003")).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].reference_id, "EP-003");
    assert_eq!(rows[0].score, 1.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stemming_reaches_stories_and_criteria(pool: PgPool) {
    seed_corpus(&pool).await;

    let rows = SearchRepo::search(&pool, &query("resetting")).await.unwrap();
    let types: Vec<&str> = rows.iter().map(|r| r.entity_type.as_str()).collect();
    assert!(types.contains(&"user_story"), "{types:?}");
    assert!(types.contains(&"acceptance_criteria"), "{types:?}");

    let ac = rows
        .iter()
        .find(|r| r.entity_type == "acceptance_criteria")
        .unwrap();
    assert!(ac.status.is_none());
    assert!(ac.priority.is_none());
    assert!(ac.title.starts_with("WHEN the reset link"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn substring_match_on_title(pool: PgPool) {
    seed_corpus(&pool).await;

    let rows = SearchRepo::search(&pool, &query("Bill")).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Billing");
    assert!(rows[0].score >= 0.1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_query_lists_with_filters(pool: PgPool) {
    seed_corpus(&pool).await;

    let all = SearchOptions::default();
    assert_eq!(SearchRepo::count(&pool, &all).await.unwrap(), 5);

    let urgent = SearchOptions {
        priority: Some(1),
        ..Default::default()
    };
    let rows = SearchRepo::search(&pool, &urgent).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "User Authentication");
    assert_eq!(rows[0].score, 0.0);

    let backlog = SearchOptions {
        status: Some("BACKLOG".to_string()),
        ..Default::default()
    };
    assert_eq!(SearchRepo::count(&pool, &backlog).await.unwrap(), 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pagination_is_stable(pool: PgPool) {
    seed_corpus(&pool).await;

    let ordered = SearchOptions {
        sort_by: SortBy::CreatedAt,
        sort_order: SortOrder::Asc,
        page: Page { limit: 5, offset: 0 },
        ..Default::default()
    };
    let whole = SearchRepo::search(&pool, &ordered).await.unwrap();

    let mut windowed = SearchRepo::search(
        &pool,
        &SearchOptions {
            page: Page { limit: 2, offset: 0 },
            ..ordered.clone()
        },
    )
    .await
    .unwrap();
    windowed.extend(
        SearchRepo::search(
            &pool,
            &SearchOptions {
                page: Page { limit: 3, offset: 2 },
                ..ordered.clone()
            },
        )
        .await
        .unwrap(),
    );

    let whole_ids: Vec<_> = whole.iter().map(|r| r.id).collect();
    let windowed_ids: Vec<_> = windowed.iter().map(|r| r.id).collect();
    assert_eq!(whole_ids, windowed_ids);
}
