//! Request extractors whose rejections answer with [`ErrorResponse`] bodies.
//!
//! Handlers take these instead of `axum::Json`, `Query` and `Path` so that a
//! malformed body, query string or path segment gets the same error shape as
//! every other failure.
//!
//! [`ErrorResponse`]: crate::schemas::ErrorResponse

use axum::{
    async_trait,
    extract::{
        FromRequest, FromRequestParts, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_valid::{HasValidate, Valid, ValidRejection, ValidationRejection};
use serde::de::DeserializeOwned;
use tracing::{error, warn};
use validator::Validate;

use crate::error::{ApiError, api_error};

/// Rejection of the API extractors.
#[derive(Debug)]
pub struct ApiRejection(pub ApiError);

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

impl From<JsonRejection> for ApiRejection {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            rejection.body_text(),
        ))
    }
}

impl From<QueryRejection> for ApiRejection {
    fn from(rejection: QueryRejection) -> Self {
        warn!("Rejected query string: {}", rejection.body_text());
        Self(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_QUERY",
            rejection.body_text(),
        ))
    }
}

impl From<PathRejection> for ApiRejection {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            // `/api/recipes/abc/` names no resource
            PathRejection::FailedToDeserializePathParams(inner) => {
                warn!("Unresolvable path: {}", inner.body_text());
                Self(api_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Not found"))
            }
            other => {
                error!("Path extraction failed: {}", other.body_text());
                Self(api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error",
                ))
            }
        }
    }
}

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiRejection))]
pub struct ApiJson<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiRejection))]
pub struct ApiQuery<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiRejection))]
pub struct ApiPath<T>(pub T);

impl<T> HasValidate for ApiJson<T> {
    type Validate = T;

    fn get_validate(&self) -> &T {
        &self.0
    }
}

impl<T> HasValidate for ApiQuery<T> {
    type Validate = T;

    fn get_validate(&self) -> &T {
        &self.0
    }
}

fn invalid_input(rejection: ValidRejection<ApiRejection>) -> ApiRejection {
    match rejection {
        ValidationRejection::Valid(errors) => {
            warn!("Input failed validation: {}", errors);
            ApiRejection(api_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                errors.to_string(),
            ))
        }
        ValidationRejection::Inner(rejection) => rejection,
    }
}

/// JSON body that must also pass its `validator` rules.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ApiRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Valid(ApiJson(value)) = Valid::<ApiJson<T>>::from_request(req, state)
            .await
            .map_err(invalid_input)?;
        Ok(Self(value))
    }
}

/// Query string that must also pass its `validator` rules.
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ApiRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Valid(ApiQuery(value)) = Valid::<ApiQuery<T>>::from_request_parts(parts, state)
            .await
            .map_err(invalid_input)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Debug, Deserialize, Validate)]
    struct Form {
        #[validate(range(min = 1))]
        amount: i32,
    }

    fn json_request(body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_of(rejection: ApiRejection) -> (StatusCode, Value) {
        let response = rejection.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_wrong_type_is_a_validation_error() {
        let rejection = ValidJson::<Form>::from_request(json_request(r#"{"amount": "abc"}"#), &())
            .await
            .unwrap_err();

        let (status, body) = body_of(rejection).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_rule_violation_is_a_validation_error() {
        let rejection = ValidJson::<Form>::from_request(json_request(r#"{"amount": 0}"#), &())
            .await
            .unwrap_err();

        let (status, body) = body_of(rejection).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["error"].as_str().unwrap().contains("amount"));
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let ValidJson(form) = ValidJson::<Form>::from_request(json_request(r#"{"amount": 3}"#), &())
            .await
            .unwrap();
        assert_eq!(form.amount, 3);
    }
}
