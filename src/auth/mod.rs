//! Token authentication: password hashing, token storage and the request
//! extractors handlers use to learn who is calling.

pub mod crypto;
pub mod extractor;
pub mod tokens;

pub use extractor::{AuthError, AuthUser, MaybeUser};
