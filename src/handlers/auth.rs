use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use model::entities::{prelude::*, user};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::crypto::verify_password;
use crate::auth::extractor::presented_token;
use crate::auth::tokens::{issue_token, revoke_token};
use crate::auth::{AuthError, AuthUser};
use crate::error::{ApiError, api_error};
use crate::extract::ValidJson;
use crate::schemas::{AppState, ErrorResponse};

/// Credentials exchanged for a token
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenResponse {
    /// Send as `Authorization: Token <auth_token>`
    pub auth_token: String,
}

/// Obtain an auth token
#[utoipa::path(
    post,
    path = "/api/auth/token/login/",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let found = User::find()
        .filter(user::Column::Email.eq(request.email.as_str()))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Internal server error")
        })?;

    let Some(user) = found.filter(|u| verify_password(&request.password, &u.password_hash)) else {
        warn!("Login failed");
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_CREDENTIALS",
            "Unable to log in with provided credentials",
        ));
    };

    let auth_token = issue_token(&state.db, user.id).await.map_err(|e| {
        error!("Failed to store token: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Internal server error")
    })?;

    info!("User {} logged in", user.id);
    Ok((StatusCode::OK, Json(TokenResponse { auth_token })))
}

/// Revoke the presented token
#[utoipa::path(
    post,
    path = "/api/auth/token/logout/",
    tag = "auth",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user, headers))]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
) -> Result<StatusCode, AuthError> {
    let Some(token) = presented_token(&headers)? else {
        return Err(AuthError::MissingHeader);
    };
    let revoked = revoke_token(&state.db, &token).await?;
    debug!("Logout of user {} revoked token: {}", user.0.id, revoked);
    Ok(StatusCode::NO_CONTENT)
}
