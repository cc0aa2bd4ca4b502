//! Reference-ID allocation under the advisory lock, sequential and contended.

use std::collections::HashSet;

use reqhub_core::entity::EntityType;
use reqhub_core::roles::Role;
use reqhub_core::types::DbId;
use reqhub_db::models::epic::{Epic, NewEpic};
use reqhub_db::models::user::CreateUser;
use reqhub_db::repositories::{EpicRepo, ReferenceIdRepo, UserRepo};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool) -> DbId {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: "planner".to_string(),
            email: "planner@example.com".to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role: Role::Administrator,
        },
    )
    .await
    .unwrap();
    user.id
}

/// Allocate and insert in one transaction, the way the epic service does.
async fn create_epic(pool: &PgPool, creator_id: DbId, title: &str) -> Epic {
    create_epic_with_id(pool, Uuid::new_v4(), creator_id, title).await
}

async fn create_epic_with_id(pool: &PgPool, id: DbId, creator_id: DbId, title: &str) -> Epic {
    let mut tx = pool.begin().await.unwrap();
    let reference = ReferenceIdRepo::allocate(&mut tx, EntityType::Epic, id)
        .await
        .unwrap();
    let epic = EpicRepo::insert(
        &mut *tx,
        &NewEpic {
            id,
            reference_id: reference.reference_id,
            sequence_number: reference.sequence_number,
            title: title.to_string(),
            description: None,
            priority: 2,
            status: "Backlog".to_string(),
            creator_id,
            assignee_id: Some(creator_id),
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    epic
}

fn is_fallback_reference(reference: &str) -> bool {
    reference
        .strip_prefix("EP-")
        .is_some_and(|rest| rest.len() == 8 && rest.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')))
}

fn is_sequential_reference(reference: &str) -> bool {
    reference
        .strip_prefix("EP-")
        .is_some_and(|rest| rest.len() >= 3 && rest.chars().all(|c| c.is_ascii_digit()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn sequential_references_increment(pool: PgPool) {
    let user = seed_user(&pool).await;

    let first = create_epic(&pool, user, "User Authentication Epic").await;
    let second = create_epic(&pool, user, "Reporting Epic").await;

    assert_eq!(first.reference_id, "EP-001");
    assert_eq!(first.sequence_number, Some(1));
    assert_eq!(second.reference_id, "EP-002");
    assert_eq!(second.sequence_number, Some(2));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rolled_back_allocation_is_reused(pool: PgPool) {
    let user = seed_user(&pool).await;
    create_epic(&pool, user, "Kept").await;

    let mut tx = pool.begin().await.unwrap();
    let reference = ReferenceIdRepo::allocate(&mut tx, EntityType::Epic, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(reference.reference_id, "EP-002");
    tx.rollback().await.unwrap();

    let next = create_epic(&pool, user, "Also kept").await;
    assert_eq!(next.reference_id, "EP-002");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn held_lock_forces_fallback(pool: PgPool) {
    let user = seed_user(&pool).await;

    // Hold the epic lock in another transaction.
    let mut holder = pool.begin().await.unwrap();
    let first = ReferenceIdRepo::allocate(&mut holder, EntityType::Epic, Uuid::new_v4())
        .await
        .unwrap();
    assert!(first.is_sequential());

    let epic = create_epic(&pool, user, "Contended").await;
    assert!(epic.sequence_number.is_none());
    assert!(is_fallback_reference(&epic.reference_id), "{}", epic.reference_id);
    assert_eq!(epic.reference_id[3..], epic.id.simple().to_string()[..8]);

    holder.rollback().await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn fallback_widens_when_prefix_is_taken(pool: PgPool) {
    let user = seed_user(&pool).await;
    let id = Uuid::parse_str("abcdef01-2345-4678-89ab-cdef01234567").unwrap();

    // Another epic already owns the eight-character form of `id`.
    EpicRepo::insert(
        &pool,
        &NewEpic {
            id: Uuid::parse_str("abcdef01-ffff-4fff-8fff-ffffffffffff").unwrap(),
            reference_id: "EP-abcdef01".to_string(),
            sequence_number: None,
            title: "Squatter".to_string(),
            description: None,
            priority: 3,
            status: "Backlog".to_string(),
            creator_id: user,
            assignee_id: None,
        },
    )
    .await
    .unwrap();

    let mut holder = pool.begin().await.unwrap();
    ReferenceIdRepo::allocate(&mut holder, EntityType::Epic, Uuid::new_v4())
        .await
        .unwrap();

    let epic = create_epic_with_id(&pool, id, user, "Collides").await;
    assert_eq!(epic.reference_id, "EP-abcdef0123454678");
    assert!(epic.sequence_number.is_none());

    holder.rollback().await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn locks_are_per_entity_type(pool: PgPool) {
    let mut holder = pool.begin().await.unwrap();
    ReferenceIdRepo::allocate(&mut holder, EntityType::Epic, Uuid::new_v4())
        .await
        .unwrap();

    let mut other = pool.begin().await.unwrap();
    let story = ReferenceIdRepo::allocate(&mut other, EntityType::UserStory, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(story.reference_id, "US-001");

    other.rollback().await.unwrap();
    holder.rollback().await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_creates_never_collide(pool: PgPool) {
    let user = seed_user(&pool).await;

    let clients = (0..10).map(|client| {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut refs = Vec::new();
            for n in 0..5 {
                let epic = create_epic(&pool, user, &format!("Epic {client}-{n}")).await;
                refs.push(epic.reference_id);
            }
            refs
        })
    });

    let references: Vec<String> = futures::future::join_all(clients)
        .await
        .into_iter()
        .flat_map(|r| r.unwrap())
        .collect();

    assert_eq!(references.len(), 50);
    let unique: HashSet<&String> = references.iter().collect();
    assert_eq!(unique.len(), 50, "duplicate references: {references:?}");

    assert!(references.iter().any(|r| is_sequential_reference(r)));
    for reference in &references {
        assert!(
            is_sequential_reference(reference) || is_fallback_reference(reference),
            "unexpected reference form: {reference}"
        );
    }
}
