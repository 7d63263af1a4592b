use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use common::IngredientView;
use serde::Deserialize;
use tracing::{debug, instrument, trace};
use utoipa::IntoParams;
use validator::Validate;

use crate::error::{ApiError, error_response};
use crate::extract::{ApiPath, ValidQuery};
use crate::schemas::{AppState, CachedCatalog, ErrorResponse};

const INGREDIENTS_CACHE_KEY: &str = "ingredients";

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

/// List ingredients
#[utoipa::path(
    get,
    path = "/api/ingredients/",
    tag = "ingredients",
    params(IngredientQuery),
    responses(
        (status = 200, description = "Matching ingredients ordered by name", body = Vec<IngredientView>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_ingredients(
    ValidQuery(query): ValidQuery<IngredientQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<IngredientView>>), ApiError> {
    let prefix = query.name.as_deref().map(str::trim).filter(|p| !p.is_empty());

    // Only the unfiltered listing is cached
    if prefix.is_none() {
        if let Some(CachedCatalog::Ingredients(items)) =
            state.cache.get(INGREDIENTS_CACHE_KEY).await
        {
            trace!("Serving {} ingredients from cache", items.len());
            return Ok((StatusCode::OK, Json(items)));
        }
    }

    let items = pipeline::catalog::list_ingredients(&state.db, prefix)
        .await
        .map_err(error_response)?;
    debug!("Found {} ingredients for prefix {:?}", items.len(), prefix);

    if prefix.is_none() {
        state
            .cache
            .insert(
                INGREDIENTS_CACHE_KEY.to_string(),
                CachedCatalog::Ingredients(items.clone()),
            )
            .await;
    }
    Ok((StatusCode::OK, Json(items)))
}

/// Get an ingredient
#[utoipa::path(
    get,
    path = "/api/ingredients/{ingredient_id}/",
    tag = "ingredients",
    params(("ingredient_id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient", body = IngredientView),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_ingredient(
    ApiPath(ingredient_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<IngredientView>), ApiError> {
    let ingredient = pipeline::catalog::get_ingredient(&state.db, ingredient_id)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::OK, Json(ingredient)))
}
