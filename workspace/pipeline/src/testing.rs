//! Fixtures shared by the pipeline unit tests.

use std::sync::Once;

use chrono::{Duration, Utc};
use common::{IngredientAmount, RecipePayload};
use migration::{Migrator, MigratorTrait};
use model::entities::{ingredient, ingredient_recipe, recipe, recipe_tag, tag, user};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
use tracing::Level;

use crate::error::Result;

/// 1x1 transparent PNG as a data URI.
pub const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

static INIT: Once = Once::new();

pub fn init_test_tracing() {
    INIT.call_once(|| {
        let level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|l| l.parse::<Level>().ok())
            .unwrap_or(Level::WARN);

        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .try_init();
    });
}

pub async fn setup_db() -> Result<DatabaseConnection> {
    init_test_tracing();

    let db = Database::connect("sqlite::memory:").await?;
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn new_user(db: &DatabaseConnection, username: &str) -> Result<user::Model> {
    Ok(user::ActiveModel {
        email: Set(format!("{username}@example.com")),
        username: Set(username.to_string()),
        first_name: Set(username.to_string()),
        last_name: Set("Tester".to_string()),
        password_hash: Set("unused".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn new_tag(db: &DatabaseConnection, slug: &str) -> Result<tag::Model> {
    Ok(tag::ActiveModel {
        name: Set(slug.to_uppercase()),
        color: Set("#49B64E".to_string()),
        slug: Set(slug.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn new_ingredient(
    db: &DatabaseConnection,
    name: &str,
    unit: &str,
) -> Result<ingredient::Model> {
    Ok(ingredient::ActiveModel {
        name: Set(name.to_string()),
        measurement_unit: Set(unit.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Inserts a recipe directly, bypassing validation. Each call is stamped one
/// second after the previous one so that "newest first" ordering is stable.
pub async fn new_recipe(
    db: &DatabaseConnection,
    author: &user::Model,
    tags: &[i32],
    ingredients: &[(i32, i32)],
) -> Result<recipe::Model> {
    static COUNTER: std::sync::atomic::AtomicI64 = std::sync::atomic::AtomicI64::new(0);
    let n = COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

    let recipe = recipe::ActiveModel {
        author_id: Set(author.id),
        name: Set(format!("Recipe {n}")),
        image: Set(vec![0x89, b'P', b'N', b'G']),
        image_mime: Set("image/png".to_string()),
        text: Set("Mix and cook.".to_string()),
        cooking_time: Set(15),
        created_at: Set(Utc::now().naive_utc() + Duration::seconds(n)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for tag_id in tags {
        recipe_tag::ActiveModel {
            recipe_id: Set(recipe.id),
            tag_id: Set(*tag_id),
        }
        .insert(db)
        .await?;
    }

    for (ingredient_id, amount) in ingredients {
        ingredient_recipe::ActiveModel {
            recipe_id: Set(recipe.id),
            ingredient_id: Set(*ingredient_id),
            amount: Set(*amount),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(recipe)
}

pub fn payload(tags: &[i32], ingredients: &[(i32, i32)]) -> RecipePayload {
    RecipePayload {
        ingredients: ingredients
            .iter()
            .map(|&(id, amount)| IngredientAmount { id, amount })
            .collect(),
        tags: tags.to_vec(),
        image: Some(PNG_DATA_URI.to_string()),
        name: "Pancakes".to_string(),
        text: "Whisk everything, fry on both sides.".to_string(),
        cooking_time: 20,
    }
}
