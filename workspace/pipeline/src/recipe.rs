//! Recipe write and read paths.
//!
//! Writes go payload -> [`validate_recipe_payload`] -> one transaction that
//! stores the recipe row and replaces its tag and ingredient associations.

use std::collections::HashSet;

use chrono::Utc;
use common::{IngredientAmount, Page, RecipePayload, RecipeView};
use model::entities::{
    favorite, ingredient, ingredient_recipe, prelude::*, recipe, recipe_tag, shopping_cart, tag,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, Query},
};
use tracing::{debug, info, instrument, warn};

use crate::error::{PipelineError, Result};
use crate::paging::page_index;
use crate::image::{DecodedImage, decode_image};
use crate::render::{render_recipe, render_recipes};
use crate::viewer::Viewer;

pub const MAX_NAME_LENGTH: usize = 200;

/// Whether a payload creates a new recipe or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// A payload that passed every check that does not need the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    /// `None` only on update, meaning "keep the stored image".
    pub image: Option<DecodedImage>,
    pub tags: Vec<i32>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Recipe list filters. User-relative flags are ignored for anonymous viewers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Tag slugs; a recipe matches when it carries any of them.
    pub tags: Vec<String>,
    pub author: Option<i32>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Checks a write payload, reporting the first violation.
///
/// Tag and ingredient existence is checked later, inside the write
/// transaction.
pub fn validate_recipe_payload(payload: &RecipePayload, mode: WriteMode) -> Result<ValidatedRecipe> {
    if payload.tags.is_empty() {
        return Err(PipelineError::validation("tags", "At least one tag is required"));
    }

    let mut seen_tags = HashSet::new();
    if let Some(dup) = payload.tags.iter().find(|id| !seen_tags.insert(**id)) {
        return Err(PipelineError::validation(
            "tags",
            format!("Tag {dup} is listed more than once"),
        ));
    }

    if payload.ingredients.is_empty() {
        return Err(PipelineError::validation(
            "ingredients",
            "At least one ingredient is required",
        ));
    }

    if let Some(line) = payload.ingredients.iter().find(|i| i.amount <= 0) {
        return Err(PipelineError::validation(
            "ingredients",
            format!(
                "Amount of ingredient {} must be a positive integer, got {}",
                line.id, line.amount
            ),
        ));
    }

    // Pairs, not ids: the same ingredient may appear with different amounts.
    let mut seen_lines = HashSet::new();
    if let Some(dup) = payload.ingredients.iter().find(|i| !seen_lines.insert(**i)) {
        return Err(PipelineError::validation(
            "ingredients",
            format!(
                "Ingredient {} with amount {} is listed more than once",
                dup.id, dup.amount
            ),
        ));
    }

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(PipelineError::validation("name", "This field may not be blank"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(PipelineError::validation(
            "name",
            format!("Ensure this field has no more than {MAX_NAME_LENGTH} characters"),
        ));
    }

    if payload.text.trim().is_empty() {
        return Err(PipelineError::validation("text", "This field may not be blank"));
    }

    if payload.cooking_time < 1 {
        return Err(PipelineError::validation(
            "cooking_time",
            "Cooking time must be at least 1 minute",
        ));
    }

    let image = match (payload.image.as_deref(), mode) {
        (Some(raw), _) => Some(decode_image(raw)?),
        (None, WriteMode::Update) => None,
        (None, WriteMode::Create) => {
            return Err(PipelineError::validation("image", "This field is required"));
        }
    };

    Ok(ValidatedRecipe {
        name: name.to_string(),
        text: payload.text.clone(),
        cooking_time: payload.cooking_time,
        image,
        tags: payload.tags.clone(),
        ingredients: payload.ingredients.clone(),
    })
}

/// Creates a recipe authored by `viewer`.
#[instrument(skip(db, payload))]
pub async fn create_recipe(
    db: &DatabaseConnection,
    viewer: Viewer,
    payload: &RecipePayload,
) -> Result<RecipeView> {
    let author_id = viewer.require()?;
    let valid = validate_recipe_payload(payload, WriteMode::Create)?;
    let Some(image) = valid.image else {
        return Err(PipelineError::validation("image", "This field is required"));
    };

    let txn = db.begin().await?;
    let written = async {
        let recipe = recipe::ActiveModel {
            author_id: Set(author_id),
            name: Set(valid.name.clone()),
            image: Set(image.bytes),
            image_mime: Set(image.mime),
            text: Set(valid.text.clone()),
            cooking_time: Set(valid.cooking_time),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        replace_associations(&txn, recipe.id, &valid.tags, &valid.ingredients).await?;
        Ok::<_, PipelineError>(recipe)
    }
    .await;

    let recipe = match written {
        Ok(recipe) => {
            txn.commit().await?;
            recipe
        }
        Err(e) => {
            warn!("Recipe create rolled back: {}", e);
            txn.rollback().await?;
            return Err(e);
        }
    };

    info!("Created recipe {} for author {}", recipe.id, author_id);
    render_recipe(db, viewer, recipe).await
}

/// Replaces a recipe's fields and associations. Author only.
#[instrument(skip(db, payload))]
pub async fn update_recipe(
    db: &DatabaseConnection,
    viewer: Viewer,
    recipe_id: i32,
    payload: &RecipePayload,
) -> Result<RecipeView> {
    let recipe = owned_recipe(db, viewer, recipe_id).await?;
    let valid = validate_recipe_payload(payload, WriteMode::Update)?;

    let txn = db.begin().await?;
    let written = async {
        let mut active: recipe::ActiveModel = recipe.into();
        active.name = Set(valid.name.clone());
        active.text = Set(valid.text.clone());
        active.cooking_time = Set(valid.cooking_time);
        if let Some(image) = valid.image.clone() {
            active.image = Set(image.bytes);
            active.image_mime = Set(image.mime);
        }
        let recipe = active.update(&txn).await?;

        replace_associations(&txn, recipe.id, &valid.tags, &valid.ingredients).await?;
        Ok::<_, PipelineError>(recipe)
    }
    .await;

    let recipe = match written {
        Ok(recipe) => {
            txn.commit().await?;
            recipe
        }
        Err(e) => {
            warn!("Recipe {} update rolled back: {}", recipe_id, e);
            txn.rollback().await?;
            return Err(e);
        }
    };

    info!("Updated recipe {}", recipe.id);
    render_recipe(db, viewer, recipe).await
}

/// Deletes a recipe. Author only; join and marker rows cascade.
#[instrument(skip(db))]
pub async fn delete_recipe(db: &DatabaseConnection, viewer: Viewer, recipe_id: i32) -> Result<()> {
    let recipe = owned_recipe(db, viewer, recipe_id).await?;
    Recipe::delete_by_id(recipe.id).exec(db).await?;
    info!("Deleted recipe {}", recipe_id);
    Ok(())
}

#[instrument(skip(db))]
pub async fn get_recipe(db: &DatabaseConnection, viewer: Viewer, recipe_id: i32) -> Result<RecipeView> {
    let recipe = find_recipe(db, recipe_id).await?;
    render_recipe(db, viewer, recipe).await
}

/// Lists recipes newest first. `page` is 1-based.
#[instrument(skip(db))]
pub async fn list_recipes(
    db: &DatabaseConnection,
    viewer: Viewer,
    filter: &RecipeFilter,
    page: u64,
    limit: u64,
) -> Result<Page<RecipeView>> {
    let mut query = Recipe::find();

    if !filter.tags.is_empty() {
        query = query.filter(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column((recipe_tag::Entity, recipe_tag::Column::RecipeId))
                    .from(recipe_tag::Entity)
                    .inner_join(
                        tag::Entity,
                        Expr::col((tag::Entity, tag::Column::Id))
                            .equals((recipe_tag::Entity, recipe_tag::Column::TagId)),
                    )
                    .and_where(
                        Expr::col((tag::Entity, tag::Column::Slug))
                            .is_in(filter.tags.iter().cloned()),
                    )
                    .to_owned(),
            ),
        );
    }

    if let Some(author_id) = filter.author {
        query = query.filter(recipe::Column::AuthorId.eq(author_id));
    }

    if let Some(user_id) = viewer.user_id() {
        if filter.is_favorited {
            query = query.filter(
                recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(favorite::Column::RecipeId)
                        .from(favorite::Entity)
                        .and_where(favorite::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            );
        }
        if filter.is_in_shopping_cart {
            query = query.filter(
                recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(shopping_cart::Column::RecipeId)
                        .from(shopping_cart::Entity)
                        .and_where(shopping_cart::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            );
        }
    } else if filter.is_favorited || filter.is_in_shopping_cart {
        debug!("Ignoring user-relative filters for anonymous viewer");
    }

    let paginator = query
        .order_by_desc(recipe::Column::CreatedAt)
        .order_by_desc(recipe::Column::Id)
        .paginate(db, limit);
    let count = paginator.num_items().await?;
    let rows = match page_index(page, limit) {
        Some(index) => paginator.fetch_page(index).await?,
        None => Vec::new(),
    };

    debug!("Listing {} of {} recipes on page {}", rows.len(), count, page);
    let results = render_recipes(db, viewer, rows).await?;
    Ok(Page::new(count, results))
}

pub(crate) async fn find_recipe<C: ConnectionTrait>(db: &C, recipe_id: i32) -> Result<recipe::Model> {
    Recipe::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| PipelineError::NotFound(format!("Recipe {recipe_id} not found")))
}

async fn owned_recipe(db: &DatabaseConnection, viewer: Viewer, recipe_id: i32) -> Result<recipe::Model> {
    let user_id = viewer.require()?;
    let recipe = find_recipe(db, recipe_id).await?;
    if recipe.author_id != user_id {
        warn!(
            "User {} tried to modify recipe {} owned by {}",
            user_id, recipe_id, recipe.author_id
        );
        return Err(PipelineError::Forbidden(
            "You do not have permission to modify this recipe".to_string(),
        ));
    }
    Ok(recipe)
}

/// Drops every tag and ingredient association of the recipe and attaches
/// the given ones.
pub async fn replace_associations<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    tags: &[i32],
    ingredients: &[IngredientAmount],
) -> Result<()> {
    let removed_tags = RecipeTag::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?
        .rows_affected;
    let removed_lines = IngredientRecipe::delete_many()
        .filter(ingredient_recipe::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?
        .rows_affected;
    debug!(
        "Cleared {} tags and {} ingredient lines of recipe {}",
        removed_tags, removed_lines, recipe_id
    );

    attach_tags(db, recipe_id, tags).await?;
    attach_ingredients(db, recipe_id, ingredients).await
}

async fn attach_tags<C: ConnectionTrait>(db: &C, recipe_id: i32, tags: &[i32]) -> Result<()> {
    let known: HashSet<i32> = Tag::find()
        .filter(tag::Column::Id.is_in(tags.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    if let Some(missing) = tags.iter().find(|id| !known.contains(id)) {
        return Err(PipelineError::NotFound(format!("Tag {missing} not found")));
    }

    RecipeTag::insert_many(tags.iter().map(|&tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    }))
    .exec_without_returning(db)
    .await?;
    Ok(())
}

async fn attach_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    lines: &[IngredientAmount],
) -> Result<()> {
    let known: HashSet<i32> = Ingredient::find()
        .filter(ingredient::Column::Id.is_in(lines.iter().map(|l| l.id)))
        .all(db)
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();
    if let Some(missing) = lines.iter().find(|l| !known.contains(&l.id)) {
        return Err(PipelineError::NotFound(format!(
            "Ingredient {} not found",
            missing.id
        )));
    }

    IngredientRecipe::insert_many(lines.iter().map(|line| ingredient_recipe::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(line.id),
        amount: Set(line.amount),
        ..Default::default()
    }))
    .exec_without_returning(db)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::{Marker, add_marker};
    use crate::testing::*;

    fn field_of(err: PipelineError) -> &'static str {
        match err {
            PipelineError::Validation { field, .. } => field,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_rules_in_order() {
        let mut p = payload(&[], &[]);
        assert_eq!(field_of(validate_recipe_payload(&p, WriteMode::Create).unwrap_err()), "tags");

        p.tags = vec![1, 1];
        assert_eq!(field_of(validate_recipe_payload(&p, WriteMode::Create).unwrap_err()), "tags");

        p.tags = vec![1, 2];
        assert_eq!(
            field_of(validate_recipe_payload(&p, WriteMode::Create).unwrap_err()),
            "ingredients"
        );

        p.ingredients = vec![IngredientAmount { id: 1, amount: 0 }];
        assert_eq!(
            field_of(validate_recipe_payload(&p, WriteMode::Create).unwrap_err()),
            "ingredients"
        );

        p.ingredients = vec![IngredientAmount { id: 1, amount: -3 }];
        assert!(validate_recipe_payload(&p, WriteMode::Create).is_err());

        p.ingredients = vec![
            IngredientAmount { id: 1, amount: 5 },
            IngredientAmount { id: 1, amount: 5 },
        ];
        assert_eq!(
            field_of(validate_recipe_payload(&p, WriteMode::Create).unwrap_err()),
            "ingredients"
        );

        p.ingredients = vec![IngredientAmount { id: 1, amount: 5 }];
        p.name = "   ".to_string();
        assert_eq!(field_of(validate_recipe_payload(&p, WriteMode::Create).unwrap_err()), "name");

        p.name = "x".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(field_of(validate_recipe_payload(&p, WriteMode::Create).unwrap_err()), "name");

        p.name = "Soup".to_string();
        p.text = String::new();
        assert_eq!(field_of(validate_recipe_payload(&p, WriteMode::Create).unwrap_err()), "text");

        p.text = "Boil.".to_string();
        p.cooking_time = 0;
        assert_eq!(
            field_of(validate_recipe_payload(&p, WriteMode::Create).unwrap_err()),
            "cooking_time"
        );

        p.cooking_time = 5;
        p.image = None;
        assert_eq!(field_of(validate_recipe_payload(&p, WriteMode::Create).unwrap_err()), "image");
        assert!(validate_recipe_payload(&p, WriteMode::Update).unwrap().image.is_none());

        p.image = Some("not base64!".to_string());
        assert_eq!(field_of(validate_recipe_payload(&p, WriteMode::Update).unwrap_err()), "image");
    }

    #[test]
    fn test_same_ingredient_with_different_amounts_passes() {
        let p = payload(&[1], &[(7, 5), (7, 10)]);
        let valid = validate_recipe_payload(&p, WriteMode::Create).unwrap();
        assert_eq!(valid.ingredients.len(), 2);
    }

    #[tokio::test]
    async fn test_create_returns_input_sets() -> Result<()> {
        let db = setup_db().await?;
        let author = new_user(&db, "author").await?;
        let lunch = new_tag(&db, "lunch").await?;
        let dinner = new_tag(&db, "dinner").await?;
        let eggs = new_ingredient(&db, "eggs", "pcs").await?;
        let flour = new_ingredient(&db, "flour", "g").await?;

        let view = create_recipe(
            &db,
            Viewer::user(author.id),
            &payload(&[dinner.id, lunch.id], &[(eggs.id, 2), (flour.id, 300)]),
        )
        .await?;

        let tag_ids: HashSet<i32> = view.tags.iter().map(|t| t.id).collect();
        assert_eq!(tag_ids, HashSet::from([lunch.id, dinner.id]));

        let lines: HashSet<(i32, i32)> = view.ingredients.iter().map(|i| (i.id, i.amount)).collect();
        assert_eq!(lines, HashSet::from([(eggs.id, 2), (flour.id, 300)]));

        assert_eq!(view.author.id, author.id);
        assert_eq!(view.image, PNG_DATA_URI);
        assert!(!view.is_favorited);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_keeps_same_ingredient_twice() -> Result<()> {
        let db = setup_db().await?;
        let author = new_user(&db, "author").await?;
        let lunch = new_tag(&db, "lunch").await?;
        let salt = new_ingredient(&db, "salt", "g").await?;

        let view = create_recipe(
            &db,
            Viewer::user(author.id),
            &payload(&[lunch.id], &[(salt.id, 5), (salt.id, 10)]),
        )
        .await?;

        assert_eq!(view.ingredients.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_ingredient_leaves_no_recipe() -> Result<()> {
        let db = setup_db().await?;
        let author = new_user(&db, "author").await?;
        let lunch = new_tag(&db, "lunch").await?;
        let eggs = new_ingredient(&db, "eggs", "pcs").await?;

        let err = create_recipe(
            &db,
            Viewer::user(author.id),
            &payload(&[lunch.id], &[(eggs.id, 2), (9999, 1)]),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::NotFound(_)));
        assert_eq!(Recipe::find().count(&db).await?, 0);
        assert_eq!(RecipeTag::find().count(&db).await?, 0);
        assert_eq!(IngredientRecipe::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_tag_is_not_found() -> Result<()> {
        let db = setup_db().await?;
        let author = new_user(&db, "author").await?;
        let eggs = new_ingredient(&db, "eggs", "pcs").await?;

        let err = create_recipe(&db, Viewer::user(author.id), &payload(&[42], &[(eggs.id, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NotFound(_)));
        assert_eq!(Recipe::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_anonymous_cannot_create() -> Result<()> {
        let db = setup_db().await?;
        let err = create_recipe(&db, Viewer::anonymous(), &payload(&[1], &[(1, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Unauthenticated));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_replaces_associations() -> Result<()> {
        let db = setup_db().await?;
        let author = new_user(&db, "author").await?;
        let lunch = new_tag(&db, "lunch").await?;
        let dinner = new_tag(&db, "dinner").await?;
        let eggs = new_ingredient(&db, "eggs", "pcs").await?;
        let milk = new_ingredient(&db, "milk", "ml").await?;
        let flour = new_ingredient(&db, "flour", "g").await?;

        let created = create_recipe(
            &db,
            Viewer::user(author.id),
            &payload(&[lunch.id], &[(eggs.id, 2), (milk.id, 100)]),
        )
        .await?;

        let mut update = payload(&[dinner.id], &[(flour.id, 250), (milk.id, 150)]);
        update.image = None;
        update.name = "Crepes".to_string();
        let updated = update_recipe(&db, Viewer::user(author.id), created.id, &update).await?;

        assert_eq!(updated.name, "Crepes");
        assert_eq!(updated.tags.iter().map(|t| t.id).collect::<Vec<_>>(), vec![dinner.id]);
        let lines: HashSet<(i32, i32)> =
            updated.ingredients.iter().map(|i| (i.id, i.amount)).collect();
        assert_eq!(lines, HashSet::from([(flour.id, 250), (milk.id, 150)]));
        // Image was omitted, so the stored one is kept
        assert_eq!(updated.image, created.image);

        assert_eq!(RecipeTag::find().count(&db).await?, 1);
        assert_eq!(IngredientRecipe::find().count(&db).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_failed_update_keeps_previous_rows() -> Result<()> {
        let db = setup_db().await?;
        let author = new_user(&db, "author").await?;
        let lunch = new_tag(&db, "lunch").await?;
        let eggs = new_ingredient(&db, "eggs", "pcs").await?;

        let created =
            create_recipe(&db, Viewer::user(author.id), &payload(&[lunch.id], &[(eggs.id, 2)]))
                .await?;

        let err = update_recipe(
            &db,
            Viewer::user(author.id),
            created.id,
            &payload(&[lunch.id], &[(4242, 1)]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));

        let current = get_recipe(&db, Viewer::anonymous(), created.id).await?;
        assert_eq!(current.ingredients.len(), 1);
        assert_eq!(current.ingredients[0].id, eggs.id);
        assert_eq!(current.name, created.name);

        Ok(())
    }

    #[tokio::test]
    async fn test_only_author_may_modify() -> Result<()> {
        let db = setup_db().await?;
        let author = new_user(&db, "author").await?;
        let other = new_user(&db, "other").await?;
        let lunch = new_tag(&db, "lunch").await?;
        let eggs = new_ingredient(&db, "eggs", "pcs").await?;
        let recipe = new_recipe(&db, &author, &[lunch.id], &[(eggs.id, 1)]).await?;

        let err = update_recipe(
            &db,
            Viewer::user(other.id),
            recipe.id,
            &payload(&[lunch.id], &[(eggs.id, 3)]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PipelineError::Forbidden(_)));

        let err = delete_recipe(&db, Viewer::user(other.id), recipe.id).await.unwrap_err();
        assert!(matches!(err, PipelineError::Forbidden(_)));

        delete_recipe(&db, Viewer::user(author.id), recipe.id).await?;
        assert!(matches!(
            get_recipe(&db, Viewer::anonymous(), recipe.id).await.unwrap_err(),
            PipelineError::NotFound(_)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_filters() -> Result<()> {
        let db = setup_db().await?;
        let alice = new_user(&db, "alice").await?;
        let bob = new_user(&db, "bob").await?;
        let lunch = new_tag(&db, "lunch").await?;
        let dinner = new_tag(&db, "dinner").await?;
        let breakfast = new_tag(&db, "breakfast").await?;
        let eggs = new_ingredient(&db, "eggs", "pcs").await?;

        let r1 = new_recipe(&db, &alice, &[lunch.id], &[(eggs.id, 1)]).await?;
        let r2 = new_recipe(&db, &alice, &[dinner.id, lunch.id], &[(eggs.id, 2)]).await?;
        let r3 = new_recipe(&db, &bob, &[breakfast.id], &[(eggs.id, 3)]).await?;

        let ids = |page: Page<RecipeView>| page.results.iter().map(|r| r.id).collect::<Vec<_>>();

        // Newest first
        let all = list_recipes(&db, Viewer::anonymous(), &RecipeFilter::default(), 1, 10).await?;
        assert_eq!(all.count, 3);
        assert_eq!(ids(all), vec![r3.id, r2.id, r1.id]);

        // Any tag matches, no duplicates for recipes matching several
        let filter = RecipeFilter {
            tags: vec!["lunch".to_string(), "dinner".to_string()],
            ..Default::default()
        };
        let tagged = list_recipes(&db, Viewer::anonymous(), &filter, 1, 10).await?;
        assert_eq!(tagged.count, 2);
        assert_eq!(ids(tagged), vec![r2.id, r1.id]);

        let filter = RecipeFilter {
            author: Some(bob.id),
            ..Default::default()
        };
        assert_eq!(ids(list_recipes(&db, Viewer::anonymous(), &filter, 1, 10).await?), vec![r3.id]);

        add_marker(&db, Viewer::user(bob.id), Marker::Favorite, r1.id).await?;
        add_marker(&db, Viewer::user(bob.id), Marker::ShoppingCart, r2.id).await?;

        let filter = RecipeFilter {
            is_favorited: true,
            ..Default::default()
        };
        assert_eq!(ids(list_recipes(&db, Viewer::user(bob.id), &filter, 1, 10).await?), vec![r1.id]);
        // Ignored for anonymous viewers
        assert_eq!(list_recipes(&db, Viewer::anonymous(), &filter, 1, 10).await?.count, 3);

        let filter = RecipeFilter {
            is_in_shopping_cart: true,
            ..Default::default()
        };
        assert_eq!(ids(list_recipes(&db, Viewer::user(bob.id), &filter, 1, 10).await?), vec![r2.id]);

        // Pagination
        let second_page =
            list_recipes(&db, Viewer::anonymous(), &RecipeFilter::default(), 2, 2).await?;
        assert_eq!(second_page.count, 3);
        assert_eq!(ids(second_page), vec![r1.id]);

        Ok(())
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() -> Result<()> {
        let db = setup_db().await?;
        let alice = new_user(&db, "alice").await?;
        let lunch = new_tag(&db, "lunch").await?;
        let eggs = new_ingredient(&db, "eggs", "pcs").await?;
        new_recipe(&db, &alice, &[lunch.id], &[(eggs.id, 1)]).await?;
        new_recipe(&db, &alice, &[lunch.id], &[(eggs.id, 2)]).await?;

        let far = list_recipes(&db, Viewer::anonymous(), &RecipeFilter::default(), 5, 10).await?;
        assert_eq!(far.count, 2);
        assert!(far.results.is_empty());

        let last =
            list_recipes(&db, Viewer::anonymous(), &RecipeFilter::default(), u64::MAX, 100).await?;
        assert_eq!(last.count, 2);
        assert!(last.results.is_empty());

        Ok(())
    }
}
