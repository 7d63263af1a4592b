//! Common transport-layer types shared between the HTTP layer and the recipe
//! pipeline. Every struct here is a wire representation: the pipeline maps
//! database rows into them and the handlers serialize them as-is.

mod catalog;
mod recipes;
mod users;

pub use catalog::{IngredientView, TagView};
pub use recipes::{IngredientAmount, RecipeIngredientView, RecipePayload, RecipeShortView, RecipeView};
pub use users::{SubscriptionView, UserView};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[aliases(
    RecipePage = Page<RecipeView>,
    UserPage = Page<UserView>,
    SubscriptionPage = Page<SubscriptionView>
)]
pub struct Page<T> {
    /// Total number of items across all pages
    pub count: u64,
    /// Items on this page
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(count: u64, results: Vec<T>) -> Self {
        Self { count, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_serializes_count_and_results() {
        let page = Page::new(1, vec![TagView {
            id: 1,
            name: "Breakfast".to_string(),
            color: "#E26C2D".to_string(),
            slug: "breakfast".to_string(),
        }]);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["results"][0]["slug"], "breakfast");
    }
}
