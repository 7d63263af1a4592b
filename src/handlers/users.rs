use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use common::{Page, UserPage, UserView};
use pipeline::users::NewUser;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::crypto::{hash_password, verify_password};
use crate::auth::{AuthUser, MaybeUser};
use crate::error::{ApiError, api_error, error_response};
use crate::extract::{ApiPath, ValidJson, ValidQuery};
use crate::schemas::{AppState, ErrorResponse, PageQuery};

/// Registration form
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct SetPasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

fn password_hash_failed(e: argon2::password_hash::Error) -> ApiError {
    error!("Password hashing failed: {}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal server error")
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/users/",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserView),
        (status = 400, description = "Invalid data or email/username taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let password_hash = hash_password(&request.password).map_err(password_hash_failed)?;

    let user = pipeline::users::create_user(
        &state.db,
        NewUser {
            email: request.email,
            username: request.username,
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash,
        },
    )
    .await
    .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// List users
#[utoipa::path(
    get,
    path = "/api/users/",
    tag = "users",
    params(PageQuery),
    responses(
        (status = 200, description = "Users page", body = UserPage),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, viewer))]
pub async fn list_users(
    ValidQuery(query): ValidQuery<PageQuery>,
    State(state): State<AppState>,
    viewer: MaybeUser,
) -> Result<(StatusCode, Json<Page<UserView>>), ApiError> {
    let (page, limit) = state.settings.page_bounds(query.page, query.limit);
    debug!("Listing users page {} limit {}", page, limit);

    let users = pipeline::users::list_users(&state.db, viewer.viewer(), page, limit)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::OK, Json(users)))
}

/// Get a user profile
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserView),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, viewer))]
pub async fn get_user(
    ApiPath(user_id): ApiPath<i32>,
    State(state): State<AppState>,
    viewer: MaybeUser,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let user = pipeline::users::get_user(&state.db, viewer.viewer(), user_id)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::OK, Json(user)))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/users/me/",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserView),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(user))]
pub async fn me(user: AuthUser) -> Result<(StatusCode, Json<UserView>), ApiError> {
    Ok((StatusCode::OK, Json(pipeline::render::user_view(&user.0, false))))
}

/// Change the current user's password
#[utoipa::path(
    post,
    path = "/api/users/set_password/",
    tag = "users",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password or weak new password", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user, request))]
pub async fn set_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(request): ValidJson<SetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let AuthUser(user) = user;

    if !verify_password(&request.current_password, &user.password_hash) {
        warn!("User {} gave a wrong current password", user.id);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_PASSWORD",
            "Current password is incorrect",
        ));
    }

    let password_hash = hash_password(&request.new_password).map_err(password_hash_failed)?;
    let user_id = user.id;
    let mut active: model::entities::user::ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    active.update(&state.db).await.map_err(|e| {
        error!("Failed to update password of user {}: {}", user_id, e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Internal server error")
    })?;

    info!("User {} changed their password", user_id);
    Ok(StatusCode::NO_CONTENT)
}
