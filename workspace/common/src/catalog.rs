use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tag as shown to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct TagView {
    pub id: i32,
    pub name: String,
    /// Hex color code, e.g. `#E26C2D`
    pub color: String,
    pub slug: String,
}

/// Ingredient catalog entry as shown to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IngredientView {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}
