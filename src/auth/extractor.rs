use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Json, Response},
};
use model::entities::user;
use pipeline::Viewer;
use thiserror::Error;
use tracing::{error, trace, warn};

use super::tokens::user_for_token;
use crate::schemas::{AppState, ErrorResponse};

/// The authenticated caller. Rejects the request with 401 when no valid
/// token is presented.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

/// The caller if a token was presented, `None` for anonymous requests. A
/// presented but invalid token still rejects with 401.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<user::Model>);

impl AuthUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::user(self.0.id)
    }
}

impl MaybeUser {
    pub fn viewer(&self) -> Viewer {
        match &self.0 {
            Some(user) => Viewer::user(user.id),
            None => Viewer::anonymous(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided")]
    MissingHeader,
    #[error("Invalid Authorization header")]
    InvalidHeader,
    #[error("Authorization header must be `Token <key>` or `Bearer <key>`")]
    InvalidFormat,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Internal server error")]
    Database(#[from] sea_orm::DbErr),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::MissingHeader => (StatusCode::UNAUTHORIZED, "NOT_AUTHENTICATED"),
            AuthError::InvalidHeader | AuthError::InvalidFormat | AuthError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED")
            }
            AuthError::Database(db_error) => {
                error!("Token lookup failed: {}", db_error);
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
                code: code.to_string(),
                success: false,
            }),
        )
            .into_response()
    }
}

/// Pulls the token out of `Authorization: Token <key>` or `Bearer <key>`.
/// `Ok(None)` when the header is absent.
pub fn presented_token(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::InvalidHeader)?;

    let token = value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidFormat)?;

    Ok(Some(token.to_string()))
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<user::Model>, AuthError> {
    let Some(token) = presented_token(&parts.headers)? else {
        trace!("No Authorization header, treating request as anonymous");
        return Ok(None);
    };

    match user_for_token(&state.db, &token).await? {
        Some(user) => {
            trace!("Authenticated user {}", user.id);
            Ok(Some(user))
        }
        None => {
            warn!("Rejected unknown auth token");
            Err(AuthError::InvalidToken)
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await?
            .map(AuthUser)
            .ok_or(AuthError::MissingHeader)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve(parts, state).await?))
    }
}
