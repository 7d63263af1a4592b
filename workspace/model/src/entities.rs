//! Root of the SeaORM entity modules for the recipe service.
//!
//! Reference data (ingredients, tags) is read-only from the API. Recipes own
//! their join rows (`recipe_tag`, `ingredient_recipe`); favorites, shopping
//! cart rows and subscriptions are marker rows whose existence is the fact.

pub mod auth_token;
pub mod favorite;
pub mod ingredient;
pub mod ingredient_recipe;
pub mod recipe;
pub mod recipe_tag;
pub mod shopping_cart;
pub mod subscription;
pub mod tag;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::auth_token::Entity as AuthToken;
    pub use super::favorite::Entity as Favorite;
    pub use super::ingredient::Entity as Ingredient;
    pub use super::ingredient_recipe::Entity as IngredientRecipe;
    pub use super::recipe::Entity as Recipe;
    pub use super::recipe_tag::Entity as RecipeTag;
    pub use super::shopping_cart::Entity as ShoppingCart;
    pub use super::subscription::Entity as Subscription;
    pub use super::tag::Entity as Tag;
    pub use super::user::Entity as User;
}
