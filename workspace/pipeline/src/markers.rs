//! Favorite and shopping cart membership.
//!
//! Both are `(user, recipe)` marker rows with identical rules, so one pair of
//! routines serves both, parameterized by [`Marker`].

use common::RecipeShortView;
use model::entities::{favorite, prelude::*, shopping_cart};
use sea_orm::{ConnectionTrait, EntityTrait, Set};
use tracing::{info, instrument, warn};

use crate::error::{PipelineError, Result};
use crate::recipe::find_recipe;
use crate::render::recipe_short_view;
use crate::viewer::Viewer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Favorite,
    ShoppingCart,
}

impl Marker {
    fn list_name(self) -> &'static str {
        match self {
            Marker::Favorite => "favorites",
            Marker::ShoppingCart => "shopping cart",
        }
    }

    async fn exists<C: ConnectionTrait>(self, db: &C, user_id: i32, recipe_id: i32) -> Result<bool> {
        let found = match self {
            Marker::Favorite => Favorite::find_by_id((user_id, recipe_id))
                .one(db)
                .await?
                .is_some(),
            Marker::ShoppingCart => ShoppingCart::find_by_id((user_id, recipe_id))
                .one(db)
                .await?
                .is_some(),
        };
        Ok(found)
    }

    async fn insert<C: ConnectionTrait>(self, db: &C, user_id: i32, recipe_id: i32) -> Result<()> {
        match self {
            Marker::Favorite => {
                Favorite::insert(favorite::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                })
                .exec_without_returning(db)
                .await?;
            }
            Marker::ShoppingCart => {
                ShoppingCart::insert(shopping_cart::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                })
                .exec_without_returning(db)
                .await?;
            }
        }
        Ok(())
    }

    /// Returns the number of deleted rows.
    async fn delete<C: ConnectionTrait>(self, db: &C, user_id: i32, recipe_id: i32) -> Result<u64> {
        let result = match self {
            Marker::Favorite => Favorite::delete_by_id((user_id, recipe_id)).exec(db).await?,
            Marker::ShoppingCart => {
                ShoppingCart::delete_by_id((user_id, recipe_id)).exec(db).await?
            }
        };
        Ok(result.rows_affected)
    }
}

/// Marks a recipe for the viewer and returns its short representation.
#[instrument(skip(db))]
pub async fn add_marker<C: ConnectionTrait>(
    db: &C,
    viewer: Viewer,
    marker: Marker,
    recipe_id: i32,
) -> Result<RecipeShortView> {
    let user_id = viewer.require()?;
    let recipe = find_recipe(db, recipe_id).await?;

    if marker.exists(db, user_id, recipe_id).await? {
        warn!("Recipe {} already in {} of user {}", recipe_id, marker.list_name(), user_id);
        return Err(PipelineError::Conflict(format!(
            "Recipe is already in your {}",
            marker.list_name()
        )));
    }

    marker.insert(db, user_id, recipe_id).await?;
    info!("Added recipe {} to {} of user {}", recipe_id, marker.list_name(), user_id);
    Ok(recipe_short_view(&recipe))
}

/// Removes a recipe from the viewer's list. Fails when it is not there.
#[instrument(skip(db))]
pub async fn remove_marker<C: ConnectionTrait>(
    db: &C,
    viewer: Viewer,
    marker: Marker,
    recipe_id: i32,
) -> Result<()> {
    let user_id = viewer.require()?;
    find_recipe(db, recipe_id).await?;

    if marker.delete(db, user_id, recipe_id).await? == 0 {
        return Err(PipelineError::Conflict(format!(
            "Recipe is not in your {}",
            marker.list_name()
        )));
    }

    info!("Removed recipe {} from {} of user {}", recipe_id, marker.list_name(), user_id);
    Ok(())
}
