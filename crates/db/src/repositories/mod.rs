//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Single
//! statement methods accept any `PgExecutor` (the pool or an open
//! transaction); multi-statement methods take `&mut PgConnection` so the
//! caller decides the transaction boundary.

pub mod acceptance_criteria_repo;
pub mod comment_repo;
pub mod epic_repo;
pub mod pat_repo;
pub mod reference_id_repo;
pub mod refresh_token_repo;
pub mod relationship_repo;
pub mod relationship_type_repo;
pub mod requirement_repo;
pub mod requirement_type_repo;
pub mod search_repo;
pub mod status_model_repo;
pub mod user_repo;
pub mod user_story_repo;

pub use acceptance_criteria_repo::AcceptanceCriteriaRepo;
pub use comment_repo::CommentRepo;
pub use epic_repo::EpicRepo;
pub use pat_repo::PatRepo;
pub use reference_id_repo::{AllocatedReference, ReferenceIdRepo};
pub use refresh_token_repo::RefreshTokenRepo;
pub use relationship_repo::RelationshipRepo;
pub use relationship_type_repo::RelationshipTypeRepo;
pub use requirement_repo::RequirementRepo;
pub use requirement_type_repo::RequirementTypeRepo;
pub use search_repo::SearchRepo;
pub use status_model_repo::StatusModelRepo;
pub use user_repo::UserRepo;
pub use user_story_repo::UserStoryRepo;
