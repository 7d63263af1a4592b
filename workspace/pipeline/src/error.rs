use thiserror::Error;

/// Error types for the recipe pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A payload field failed validation
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    /// A referenced row does not exist
    #[error("{0}")]
    NotFound(String),

    /// The request contradicts existing state, e.g. a duplicate subscription
    #[error("{0}")]
    Conflict(String),

    /// The requester is not allowed to touch the resource
    #[error("{0}")]
    Forbidden(String),

    /// The operation needs an authenticated requester
    #[error("Authentication credentials were not provided")]
    Unauthenticated,
}

impl PipelineError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        PipelineError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Type alias for Result with PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;
