use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{TagView, UserView};

/// One ingredient line of a recipe write payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct IngredientAmount {
    /// Ingredient catalog id
    pub id: i32,
    /// Quantity in the ingredient's measurement unit, must be positive
    pub amount: i32,
}

/// Body of recipe create (`POST`) and update (`PATCH`) requests.
///
/// Missing collections and strings deserialize to empty values so that the
/// pipeline can reject them with a readable validation message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(default)]
pub struct RecipePayload {
    pub ingredients: Vec<IngredientAmount>,
    /// Tag ids
    pub tags: Vec<i32>,
    /// Base64 image, either a data URI (`data:image/png;base64,...`) or bare
    /// base64. Required on create; on update the stored image is kept when
    /// omitted.
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    /// Minutes, at least 1
    pub cooking_time: i32,
}

/// Ingredient line of a rendered recipe.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RecipeIngredientView {
    /// Ingredient catalog id
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe representation, decorated for the requesting user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RecipeView {
    pub id: i32,
    pub tags: Vec<TagView>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientView>,
    /// False for anonymous requests
    pub is_favorited: bool,
    /// False for anonymous requests
    pub is_in_shopping_cart: bool,
    pub name: String,
    /// Data URI
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Minimal recipe representation used by favorites, the shopping cart and
/// subscription previews.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RecipeShortView {
    pub id: i32,
    pub name: String,
    /// Data URI
    pub image: String,
    pub cooking_time: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_missing_fields_default_to_empty() {
        let payload: RecipePayload = serde_json::from_str(r#"{"name": "Soup"}"#).unwrap();

        assert_eq!(payload.name, "Soup");
        assert!(payload.tags.is_empty());
        assert!(payload.ingredients.is_empty());
        assert_eq!(payload.image, None);
        assert_eq!(payload.cooking_time, 0);
    }

    #[test]
    fn test_payload_full_body() {
        let payload: RecipePayload = serde_json::from_str(
            r#"{
                "ingredients": [{"id": 1123, "amount": 10}],
                "tags": [1, 2],
                "image": "data:image/png;base64,iVBORw0KGgo=",
                "name": "string",
                "text": "string",
                "cooking_time": 1
            }"#,
        )
        .unwrap();

        assert_eq!(payload.ingredients, vec![IngredientAmount { id: 1123, amount: 10 }]);
        assert_eq!(payload.tags, vec![1, 2]);
        assert!(payload.image.as_deref().unwrap().starts_with("data:image/png"));
        assert_eq!(payload.cooking_time, 1);
    }
}
