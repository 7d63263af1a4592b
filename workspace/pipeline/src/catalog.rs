//! Read-only tag and ingredient catalogs.

use common::{IngredientView, TagView};
use model::entities::{ingredient, prelude::*, tag};
use sea_orm::{
    ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, Func, LikeExpr},
};
use tracing::{debug, instrument};

use crate::error::{PipelineError, Result};
use crate::render::{ingredient_view, tag_view};

pub async fn list_tags<C: ConnectionTrait>(db: &C) -> Result<Vec<TagView>> {
    let tags = Tag::find().order_by_asc(tag::Column::Id).all(db).await?;
    Ok(tags.into_iter().map(tag_view).collect())
}

pub async fn get_tag<C: ConnectionTrait>(db: &C, tag_id: i32) -> Result<TagView> {
    Tag::find_by_id(tag_id)
        .one(db)
        .await?
        .map(tag_view)
        .ok_or_else(|| PipelineError::NotFound(format!("Tag {tag_id} not found")))
}

/// Ingredients ordered by name, optionally narrowed to a case-insensitive
/// name prefix.
#[instrument(skip(db))]
pub async fn list_ingredients<C: ConnectionTrait>(
    db: &C,
    name_prefix: Option<&str>,
) -> Result<Vec<IngredientView>> {
    let mut query = Ingredient::find();

    if let Some(prefix) = name_prefix.map(str::trim).filter(|p| !p.is_empty()) {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        debug!("Filtering ingredients by pattern {}", pattern);
        query = query.filter(
            Expr::expr(Func::lower(Expr::col((
                ingredient::Entity,
                ingredient::Column::Name,
            ))))
            .like(LikeExpr::new(pattern).escape('\\')),
        );
    }

    let ingredients = query
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await?;
    Ok(ingredients.into_iter().map(ingredient_view).collect())
}

pub async fn get_ingredient<C: ConnectionTrait>(db: &C, ingredient_id: i32) -> Result<IngredientView> {
    Ingredient::find_by_id(ingredient_id)
        .one(db)
        .await?
        .map(ingredient_view)
        .ok_or_else(|| PipelineError::NotFound(format!("Ingredient {ingredient_id} not found")))
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[tokio::test]
    async fn test_ingredient_prefix_search() -> Result<()> {
        let db = setup_db().await?;
        new_ingredient(&db, "sugar", "g").await?;
        new_ingredient(&db, "Salt", "g").await?;
        new_ingredient(&db, "salmon", "g").await?;
        new_ingredient(&db, "basil", "g").await?;

        let names = |items: Vec<IngredientView>| items.into_iter().map(|i| i.name).collect::<Vec<_>>();

        assert_eq!(names(list_ingredients(&db, Some("SAL")).await?), vec!["Salt", "salmon"]);
        assert_eq!(names(list_ingredients(&db, Some("s")).await?).len(), 3);
        // Prefix only, not substring
        assert!(list_ingredients(&db, Some("alt")).await?.is_empty());
        assert_eq!(list_ingredients(&db, None).await?.len(), 4);
        assert_eq!(list_ingredients(&db, Some("%")).await?.len(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_tag_lookup() -> Result<()> {
        let db = setup_db().await?;
        let lunch = new_tag(&db, "lunch").await?;
        new_tag(&db, "dinner").await?;

        assert_eq!(list_tags(&db).await?.len(), 2);
        assert_eq!(get_tag(&db, lunch.id).await?.slug, "lunch");
        assert!(matches!(get_tag(&db, 77).await.unwrap_err(), PipelineError::NotFound(_)));
        assert!(matches!(
            get_ingredient(&db, 77).await.unwrap_err(),
            PipelineError::NotFound(_)
        ));

        Ok(())
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_a\\"), "50\\%\\_a\\\\");
    }
}
