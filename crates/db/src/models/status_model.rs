//! Status models, statuses and transitions.

use reqhub_core::types::{DbId, Timestamp};
use reqhub_core::workflow::{StatusDef, TransitionDef, WorkflowModel};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `status_models` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusModel {
    pub id: DbId,
    pub entity_type: String,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `statuses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Status {
    pub id: DbId,
    pub status_model_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_initial: bool,
    pub is_final: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A transition joined with both status names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusTransition {
    pub id: DbId,
    pub status_model_id: DbId,
    pub from_status_id: DbId,
    pub from_status: String,
    pub to_status_id: DbId,
    pub to_status: String,
    pub created_at: Timestamp,
}

/// A model with its statuses and transitions.
#[derive(Debug, Clone, Serialize)]
pub struct StatusModelDetail {
    #[serde(flatten)]
    pub model: StatusModel,
    pub statuses: Vec<Status>,
    pub transitions: Vec<StatusTransition>,
}

impl StatusModelDetail {
    /// Snapshot for the pure transition validator.
    pub fn to_workflow(&self) -> WorkflowModel {
        WorkflowModel {
            statuses: self
                .statuses
                .iter()
                .map(|s| StatusDef {
                    name: s.name.clone(),
                    is_initial: s.is_initial,
                    is_final: s.is_final,
                    sort_order: s.sort_order,
                })
                .collect(),
            transitions: self
                .transitions
                .iter()
                .map(|t| TransitionDef {
                    from: t.from_status.clone(),
                    to: t.to_status.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug)]
pub struct CreateStatusModel {
    pub entity_type: String,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Default)]
pub struct UpdateStatusModel {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct CreateStatus {
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_initial: bool,
    pub is_final: bool,
}

#[derive(Debug, Default)]
pub struct UpdateStatus {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_initial: Option<bool>,
    pub is_final: Option<bool>,
}
