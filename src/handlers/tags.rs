use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use common::TagView;
use tracing::{debug, instrument, trace};

use crate::error::{ApiError, error_response};
use crate::extract::ApiPath;
use crate::schemas::{AppState, CachedCatalog, ErrorResponse};

const TAGS_CACHE_KEY: &str = "tags";

/// List all tags
#[utoipa::path(
    get,
    path = "/api/tags/",
    tag = "tags",
    responses(
        (status = 200, description = "All tags", body = Vec<TagView>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_tags(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<TagView>>), ApiError> {
    if let Some(CachedCatalog::Tags(tags)) = state.cache.get(TAGS_CACHE_KEY).await {
        trace!("Serving {} tags from cache", tags.len());
        return Ok((StatusCode::OK, Json(tags)));
    }

    let tags = pipeline::catalog::list_tags(&state.db)
        .await
        .map_err(error_response)?;
    debug!("Loaded {} tags", tags.len());

    state
        .cache
        .insert(TAGS_CACHE_KEY.to_string(), CachedCatalog::Tags(tags.clone()))
        .await;
    Ok((StatusCode::OK, Json(tags)))
}

/// Get a tag
#[utoipa::path(
    get,
    path = "/api/tags/{tag_id}/",
    tag = "tags",
    params(("tag_id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag", body = TagView),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_tag(
    ApiPath(tag_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TagView>), ApiError> {
    let tag = pipeline::catalog::get_tag(&state.db, tag_id)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::OK, Json(tag)))
}
