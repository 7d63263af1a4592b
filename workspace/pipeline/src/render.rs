//! Row to wire mapping.
//!
//! Single rows map through plain functions. Lists are rendered in batches: one
//! query per association, keyed by recipe id, instead of one query per row.

use std::collections::{HashMap, HashSet};

use common::{
    IngredientView, RecipeIngredientView, RecipeShortView, RecipeView, TagView, UserView,
};
use model::entities::{
    favorite, ingredient, ingredient_recipe, prelude::*, recipe, recipe_tag, shopping_cart,
    subscription, tag, user,
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::{instrument, trace};

use crate::error::{PipelineError, Result};
use crate::image::encode_image;
use crate::viewer::Viewer;

pub fn tag_view(tag: tag::Model) -> TagView {
    TagView {
        id: tag.id,
        name: tag.name,
        color: tag.color,
        slug: tag.slug,
    }
}

pub fn ingredient_view(ingredient: ingredient::Model) -> IngredientView {
    IngredientView {
        id: ingredient.id,
        name: ingredient.name,
        measurement_unit: ingredient.measurement_unit,
    }
}

pub fn user_view(user: &user::Model, is_subscribed: bool) -> UserView {
    UserView {
        email: user.email.clone(),
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_subscribed,
    }
}

pub fn recipe_short_view(recipe: &recipe::Model) -> RecipeShortView {
    RecipeShortView {
        id: recipe.id,
        name: recipe.name.clone(),
        image: encode_image(&recipe.image, &recipe.image_mime),
        cooking_time: recipe.cooking_time,
    }
}

/// Ids among `author_ids` the viewer follows. Always empty for anonymous viewers.
pub async fn followed_authors<C: ConnectionTrait>(
    db: &C,
    viewer: Viewer,
    author_ids: &[i32],
) -> Result<HashSet<i32>> {
    let Some(user_id) = viewer.user_id() else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let rows = Subscription::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::AuthorId.is_in(author_ids.iter().copied()))
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|s| s.author_id).collect())
}

/// Renders users with the viewer's `is_subscribed` flag, keeping input order.
pub async fn render_users<C: ConnectionTrait>(
    db: &C,
    viewer: Viewer,
    users: Vec<user::Model>,
) -> Result<Vec<UserView>> {
    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let followed = followed_authors(db, viewer, &ids).await?;

    Ok(users
        .iter()
        .map(|u| user_view(u, followed.contains(&u.id)))
        .collect())
}

pub async fn render_recipe<C: ConnectionTrait>(
    db: &C,
    viewer: Viewer,
    recipe: recipe::Model,
) -> Result<RecipeView> {
    let id = recipe.id;
    render_recipes(db, viewer, vec![recipe])
        .await?
        .pop()
        .ok_or_else(|| PipelineError::NotFound(format!("Recipe {id} not found")))
}

/// Renders recipes for `viewer`, keeping input order.
#[instrument(skip(db, recipes), fields(num_recipes = recipes.len()))]
pub async fn render_recipes<C: ConnectionTrait>(
    db: &C,
    viewer: Viewer,
    recipes: Vec<recipe::Model>,
) -> Result<Vec<RecipeView>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let mut author_ids: Vec<i32> = recipes.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let mut tags_by_recipe: HashMap<i32, Vec<TagView>> = HashMap::new();
    for (link, tag) in RecipeTag::find()
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .order_by_asc(recipe_tag::Column::TagId)
        .find_also_related(Tag)
        .all(db)
        .await?
    {
        if let Some(tag) = tag {
            tags_by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(tag_view(tag));
        }
    }

    let mut ingredients_by_recipe: HashMap<i32, Vec<RecipeIngredientView>> = HashMap::new();
    for (line, ingredient) in IngredientRecipe::find()
        .filter(ingredient_recipe::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .order_by_asc(ingredient_recipe::Column::Id)
        .find_also_related(Ingredient)
        .all(db)
        .await?
    {
        if let Some(ingredient) = ingredient {
            ingredients_by_recipe
                .entry(line.recipe_id)
                .or_default()
                .push(RecipeIngredientView {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount: line.amount,
                });
        }
    }

    let authors: HashMap<i32, user::Model> = User::find()
        .filter(user::Column::Id.is_in(author_ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let followed = followed_authors(db, viewer, &author_ids).await?;

    let (favorited, in_cart) = match viewer.user_id() {
        Some(user_id) => {
            let favorited: HashSet<i32> = Favorite::find()
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                .all(db)
                .await?
                .into_iter()
                .map(|f| f.recipe_id)
                .collect();
            let in_cart: HashSet<i32> = ShoppingCart::find()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                .all(db)
                .await?
                .into_iter()
                .map(|c| c.recipe_id)
                .collect();
            (favorited, in_cart)
        }
        None => (HashSet::new(), HashSet::new()),
    };

    trace!(
        "Loaded associations for {} recipes ({} authors)",
        recipe_ids.len(),
        authors.len()
    );

    recipes
        .into_iter()
        .map(|recipe| {
            let author = authors.get(&recipe.author_id).ok_or_else(|| {
                PipelineError::NotFound(format!("Author {} not found", recipe.author_id))
            })?;

            Ok(RecipeView {
                id: recipe.id,
                tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                author: user_view(author, followed.contains(&author.id)),
                ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                image: encode_image(&recipe.image, &recipe.image_mime),
                name: recipe.name,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}
