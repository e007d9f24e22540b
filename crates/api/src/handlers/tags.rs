//! Handlers for the `/tags` resource.

use axum::extract::State;
use axum::Json;
use segment3d_db::models::tag::Tag;
use segment3d_db::repositories::TagRepo;

use crate::error::AppResult;
use crate::extract::AppQuery;
use crate::query::TagSearchParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/tags/search?keyword=&limit=
///
/// Substring match on tag names, shortest first. `limit` defaults to 10 and
/// is capped at 50.
pub async fn search_tags(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TagSearchParams>,
) -> AppResult<Json<DataResponse<Vec<Tag>>>> {
    let tags = TagRepo::search(&state.pool, params.keyword.trim(), params.limit).await?;
    Ok(Json(DataResponse { data: tags }))
}
