use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::RecipeShortView;

/// Public profile of a user, decorated for the requesting user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserView {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the requesting user follows this user (false for anonymous requests)
    pub is_subscribed: bool,
}

/// An author the requesting user follows, with a preview of their recipes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SubscriptionView {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    /// Author's recipes, newest first, capped by `recipes_limit` when given
    pub recipes: Vec<RecipeShortView>,
    /// Total number of recipes by the author, regardless of the cap
    pub recipes_count: u64,
}
