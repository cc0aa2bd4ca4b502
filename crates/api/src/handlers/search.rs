//! Handler for `GET /search`.

use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::extract::AppQuery;
use crate::middleware::rbac::RequireCommenter;
use crate::response::PaginatedResponse;
use crate::services::search::{self, SearchParams, SearchResult};
use crate::state::AppState;

/// GET /api/v1/search?q=&type=&priority=&status=&creator_id=&assignee_id=
///     &created_from=&created_to=&sort_by=&sort_order=&limit=&offset=
pub async fn search(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SearchParams>,
) -> AppResult<Json<PaginatedResponse<SearchResult>>> {
    let options = params.into_options()?;
    let (results, total) = search::search(&state.pool, &options).await?;
    Ok(Json(PaginatedResponse::new(results, total, options.page)))
}
