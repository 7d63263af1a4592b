use common::{
    IngredientAmount, IngredientView, RecipeIngredientView, RecipePage, RecipePayload,
    RecipeShortView, RecipeView, SubscriptionPage, SubscriptionView, TagView, UserPage, UserView,
};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{
    IntoParams, Modify, OpenApi, ToSchema,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use validator::Validate;

use crate::config::{Settings, catalog_cache};
use crate::handlers::auth::{LoginRequest, TokenResponse};
use crate::handlers::users::{RegisterRequest, SetPasswordRequest};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    pub settings: Settings,
    /// Tag and ingredient listings
    pub cache: Cache<String, CachedCatalog>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, settings: Settings) -> Self {
        let cache = catalog_cache(&settings);
        Self { db, settings, cache }
    }
}

/// Cached catalog listings
#[derive(Clone, Debug)]
pub enum CachedCatalog {
    Tags(Vec<TagView>),
    Ingredients(Vec<IngredientView>),
}

/// Query parameters of paginated listings
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
pub struct PageQuery {
    /// 1-based page number
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    /// Page size
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct TokenAuth;

impl Modify for TokenAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "`Token <key>` as returned by /api/auth/token/login/",
                ))),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::users::register,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::me,
        crate::handlers::users::set_password,
        crate::handlers::subscriptions::list_subscriptions,
        crate::handlers::subscriptions::subscribe,
        crate::handlers::subscriptions::unsubscribe,
        crate::handlers::tags::list_tags,
        crate::handlers::tags::get_tag,
        crate::handlers::ingredients::list_ingredients,
        crate::handlers::ingredients::get_ingredient,
        crate::handlers::recipes::list_recipes,
        crate::handlers::recipes::create_recipe,
        crate::handlers::recipes::get_recipe,
        crate::handlers::recipes::update_recipe,
        crate::handlers::recipes::delete_recipe,
        crate::handlers::recipes::add_favorite,
        crate::handlers::recipes::remove_favorite,
        crate::handlers::recipes::add_to_shopping_cart,
        crate::handlers::recipes::remove_from_shopping_cart,
        crate::handlers::recipes::download_shopping_cart,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            LoginRequest,
            TokenResponse,
            RegisterRequest,
            SetPasswordRequest,
            UserView,
            UserPage,
            SubscriptionView,
            SubscriptionPage,
            TagView,
            IngredientView,
            IngredientAmount,
            RecipePayload,
            RecipeIngredientView,
            RecipeView,
            RecipeShortView,
            RecipePage,
        )
    ),
    modifiers(&TokenAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Token login and logout"),
        (name = "users", description = "User accounts and subscriptions"),
        (name = "tags", description = "Tag catalog"),
        (name = "ingredients", description = "Ingredient catalog"),
        (name = "recipes", description = "Recipes, favorites and the shopping cart"),
    ),
    info(
        title = "Foodgram API",
        description = "Recipe sharing API: recipes, favorites, subscriptions and shopping lists",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
