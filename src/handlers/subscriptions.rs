use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use common::{Page, SubscriptionPage, SubscriptionView};
use serde::Deserialize;
use tracing::{debug, instrument};
use utoipa::IntoParams;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ApiError, error_response};
use crate::extract::{ApiPath, ValidQuery};
use crate::schemas::{AppState, ErrorResponse};

/// Query parameters of subscription listings
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
pub struct SubscriptionQuery {
    /// 1-based page number
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    /// Page size
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
    /// Maximum number of recipes embedded per author
    pub recipes_limit: Option<u64>,
}

/// Authors the current user follows
#[utoipa::path(
    get,
    path = "/api/users/subscriptions/",
    tag = "users",
    params(SubscriptionQuery),
    responses(
        (status = 200, description = "Followed authors", body = SubscriptionPage),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user))]
pub async fn list_subscriptions(
    ValidQuery(query): ValidQuery<SubscriptionQuery>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<Page<SubscriptionView>>), ApiError> {
    let (page, limit) = state.settings.page_bounds(query.page, query.limit);
    debug!("Listing subscriptions of user {} page {}", user.0.id, page);

    let authors = pipeline::subscriptions::list_subscriptions(
        &state.db,
        user.viewer(),
        page,
        limit,
        query.recipes_limit,
    )
    .await
    .map_err(error_response)?;
    Ok((StatusCode::OK, Json(authors)))
}

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
pub struct RecipesLimitQuery {
    /// Maximum number of recipes embedded in the response
    pub recipes_limit: Option<u64>,
}

/// Follow an author
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/subscribe/",
    tag = "users",
    params(("user_id" = i32, Path, description = "Author ID"), RecipesLimitQuery),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionView),
        (status = 400, description = "Already subscribed or subscribing to oneself", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user))]
pub async fn subscribe(
    ApiPath(user_id): ApiPath<i32>,
    ValidQuery(query): ValidQuery<RecipesLimitQuery>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<SubscriptionView>), ApiError> {
    let author = pipeline::subscriptions::subscribe(
        &state.db,
        user.viewer(),
        user_id,
        query.recipes_limit,
    )
    .await
    .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// Unfollow an author
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/subscribe/",
    tag = "users",
    params(("user_id" = i32, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user))]
pub async fn unsubscribe(
    ApiPath(user_id): ApiPath<i32>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    pipeline::subscriptions::unsubscribe(&state.db, user.viewer(), user_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
