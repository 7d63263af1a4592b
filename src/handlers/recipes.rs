use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json},
};
use common::{Page, RecipePage, RecipePayload, RecipeShortView, RecipeView};
use pipeline::markers::{Marker, add_marker, remove_marker};
use pipeline::recipe::RecipeFilter;
use pipeline::shopping_list::{CSV_CONTENT_TYPE, CSV_FILENAME, export_shopping_list};
use tracing::{debug, info, instrument, warn};
use utoipa::IntoParams;

use crate::auth::{AuthUser, MaybeUser};
use crate::error::{ApiError, api_error, error_response};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::schemas::{AppState, ErrorResponse};

/// Query parameters of the recipe listing. `tags` may repeat.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
    /// Tag slugs, any of which must match (`?tags=lunch&tags=dinner`)
    pub tags: Vec<String>,
    /// Author ID
    pub author: Option<i32>,
    /// `1` to list only the current user's favorites
    pub is_favorited: Option<String>,
    /// `1` to list only recipes in the current user's shopping cart
    pub is_in_shopping_cart: Option<String>,
}

impl RecipeListQuery {
    /// Collects raw query pairs; repeated `tags` keys accumulate.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, ApiError> {
        let mut query = RecipeListQuery::default();

        for (key, value) in pairs {
            match key.as_str() {
                "page" => query.page = Some(parse_number(&key, &value)?),
                "limit" => query.limit = Some(parse_number(&key, &value)?),
                "author" => query.author = Some(parse_number(&key, &value)?),
                "tags" => query.tags.push(value),
                "is_favorited" => query.is_favorited = Some(value),
                "is_in_shopping_cart" => query.is_in_shopping_cart = Some(value),
                _ => debug!("Ignoring unknown query parameter {}", key),
            }
        }

        Ok(query)
    }

    pub fn filter(&self) -> RecipeFilter {
        RecipeFilter {
            tags: self.tags.clone(),
            author: self.author,
            is_favorited: is_truthy(self.is_favorited.as_deref()),
            is_in_shopping_cart: is_truthy(self.is_in_shopping_cart.as_deref()),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ApiError> {
    value.parse().map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_QUERY",
            format!("`{key}` must be a number, got `{value}`"),
        )
    })
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true") | Some("True"))
}

/// List recipes
#[utoipa::path(
    get,
    path = "/api/recipes/",
    tag = "recipes",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "Recipes, newest first", body = RecipePage),
        (status = 400, description = "Malformed query", body = ErrorResponse)
    )
)]
#[instrument(skip(state, pairs, viewer))]
pub async fn list_recipes(
    ApiQuery(pairs): ApiQuery<Vec<(String, String)>>,
    State(state): State<AppState>,
    viewer: MaybeUser,
) -> Result<(StatusCode, Json<Page<RecipeView>>), ApiError> {
    let query = RecipeListQuery::from_pairs(pairs)?;
    let (page, limit) = state.settings.page_bounds(query.page, query.limit);
    let filter = query.filter();
    debug!("Listing recipes page {} limit {} with {:?}", page, limit, filter);

    let recipes = pipeline::recipe::list_recipes(&state.db, viewer.viewer(), &filter, page, limit)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::OK, Json(recipes)))
}

/// Create a recipe
#[utoipa::path(
    post,
    path = "/api/recipes/",
    tag = "recipes",
    request_body = RecipePayload,
    responses(
        (status = 201, description = "Recipe created", body = RecipeView),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Unknown tag or ingredient", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeView>), ApiError> {
    let recipe = pipeline::recipe::create_recipe(&state.db, user.viewer(), &payload)
        .await
        .map_err(error_response)?;
    info!("User {} created recipe {}", user.0.id, recipe.id);
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// Get a recipe
#[utoipa::path(
    get,
    path = "/api/recipes/{recipe_id}/",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe", body = RecipeView),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, viewer))]
pub async fn get_recipe(
    ApiPath(recipe_id): ApiPath<i32>,
    State(state): State<AppState>,
    viewer: MaybeUser,
) -> Result<(StatusCode, Json<RecipeView>), ApiError> {
    let recipe = pipeline::recipe::get_recipe(&state.db, viewer.viewer(), recipe_id)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::OK, Json(recipe)))
}

/// Update a recipe
///
/// Tags and ingredients are replaced as a whole. The image is kept when
/// omitted.
#[utoipa::path(
    patch,
    path = "/api/recipes/{recipe_id}/",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    request_body = RecipePayload,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeView),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe, tag or ingredient not found", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user, payload))]
pub async fn update_recipe(
    ApiPath(recipe_id): ApiPath<i32>,
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeView>), ApiError> {
    let recipe = pipeline::recipe::update_recipe(&state.db, user.viewer(), recipe_id, &payload)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::OK, Json(recipe)))
}

/// Delete a recipe
#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}/",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user))]
pub async fn delete_recipe(
    ApiPath(recipe_id): ApiPath<i32>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    pipeline::recipe::delete_recipe(&state.db, user.viewer(), recipe_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark(
    state: &AppState,
    user: &AuthUser,
    marker: Marker,
    recipe_id: i32,
) -> Result<(StatusCode, Json<RecipeShortView>), ApiError> {
    let recipe = add_marker(&state.db, user.viewer(), marker, recipe_id)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn unmark(
    state: &AppState,
    user: &AuthUser,
    marker: Marker,
    recipe_id: i32,
) -> Result<StatusCode, ApiError> {
    remove_marker(&state.db, user.viewer(), marker, recipe_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a recipe to favorites
#[utoipa::path(
    post,
    path = "/api/recipes/{recipe_id}/favorite/",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added", body = RecipeShortView),
        (status = 400, description = "Already in favorites", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user))]
pub async fn add_favorite(
    ApiPath(recipe_id): ApiPath<i32>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<RecipeShortView>), ApiError> {
    mark(&state, &user, Marker::Favorite, recipe_id).await
}

/// Remove a recipe from favorites
#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}/favorite/",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed"),
        (status = 400, description = "Not in favorites", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user))]
pub async fn remove_favorite(
    ApiPath(recipe_id): ApiPath<i32>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    unmark(&state, &user, Marker::Favorite, recipe_id).await
}

/// Add a recipe to the shopping cart
#[utoipa::path(
    post,
    path = "/api/recipes/{recipe_id}/shopping_cart/",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added", body = RecipeShortView),
        (status = 400, description = "Already in the shopping cart", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user))]
pub async fn add_to_shopping_cart(
    ApiPath(recipe_id): ApiPath<i32>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<RecipeShortView>), ApiError> {
    mark(&state, &user, Marker::ShoppingCart, recipe_id).await
}

/// Remove a recipe from the shopping cart
#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}/shopping_cart/",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed"),
        (status = 400, description = "Not in the shopping cart", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user))]
pub async fn remove_from_shopping_cart(
    ApiPath(recipe_id): ApiPath<i32>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    unmark(&state, &user, Marker::ShoppingCart, recipe_id).await
}

/// Download the shopping list
///
/// Ingredient totals over every recipe in the cart, as CSV.
#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart/",
    tag = "recipes",
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, user))]
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let csv = export_shopping_list(&state.db, user.viewer())
        .await
        .map_err(|e| {
            warn!("Shopping list export failed for user {}", user.0.id);
            error_response(e)
        })?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{CSV_FILENAME}\""),
            ),
        ],
        csv,
    ))
}
