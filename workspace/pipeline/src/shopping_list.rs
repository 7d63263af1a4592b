//! Shopping list export: ingredient totals across every recipe in the
//! viewer's cart, rendered as CSV.

use model::entities::{ingredient, ingredient_recipe, prelude::*, shopping_cart};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    sea_query::{JoinType, Query},
};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::viewer::Viewer;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const CSV_FILENAME: &str = "shopping_cart.csv";

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Sums amounts per `(ingredient name, measurement unit)` over the viewer's
/// cart, ordered by name.
#[instrument(skip(db))]
pub async fn shopping_list<C: ConnectionTrait>(db: &C, viewer: Viewer) -> Result<Vec<ShoppingListItem>> {
    let user_id = viewer.require()?;

    let rows: Vec<(String, String, i64)> = IngredientRecipe::find()
        .select_only()
        .column_as(ingredient::Column::Name, "name")
        .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
        .column_as(ingredient_recipe::Column::Amount.sum(), "total_amount")
        .join(JoinType::InnerJoin, ingredient_recipe::Relation::Ingredient.def())
        .filter(
            ingredient_recipe::Column::RecipeId.in_subquery(
                Query::select()
                    .column(shopping_cart::Column::RecipeId)
                    .from(shopping_cart::Entity)
                    .and_where(shopping_cart::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
        .group_by(ingredient::Column::Name)
        .group_by(ingredient::Column::MeasurementUnit)
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::MeasurementUnit)
        .into_tuple()
        .all(db)
        .await?;

    debug!("Shopping list of user {} has {} lines", user_id, rows.len());

    Ok(rows
        .into_iter()
        .map(|(name, measurement_unit, total_amount)| ShoppingListItem {
            name,
            measurement_unit,
            total_amount,
        })
        .collect())
}

/// Renders items as headerless CSV: BOM prefix, CRLF line endings, fields
/// quoted only when needed.
pub fn render_csv(items: &[ShoppingListItem]) -> String {
    let mut out = String::new();
    out.push(BOM);
    for item in items {
        out.push_str(&csv_field(&item.name));
        out.push(',');
        out.push_str(&csv_field(&item.measurement_unit));
        out.push(',');
        out.push_str(&item.total_amount.to_string());
        out.push_str("\r\n");
    }
    out
}

pub async fn export_shopping_list<C: ConnectionTrait>(db: &C, viewer: Viewer) -> Result<String> {
    let items = shopping_list(db, viewer).await?;
    Ok(render_csv(&items))
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::{Marker, add_marker};
    use crate::testing::*;

    #[tokio::test]
    async fn test_amounts_are_summed_across_recipes() -> Result<()> {
        let db = setup_db().await?;
        let author = new_user(&db, "author").await?;
        let shopper = new_user(&db, "shopper").await?;
        let eggs = new_ingredient(&db, "eggs", "pcs").await?;
        let milk = new_ingredient(&db, "milk", "ml").await?;

        let omelette = new_recipe(&db, &author, &[], &[(eggs.id, 2)]).await?;
        let pancakes = new_recipe(&db, &author, &[], &[(eggs.id, 2), (milk.id, 300)]).await?;
        // Not in the cart
        new_recipe(&db, &author, &[], &[(eggs.id, 10)]).await?;

        let viewer = Viewer::user(shopper.id);
        add_marker(&db, viewer, Marker::ShoppingCart, omelette.id).await?;
        add_marker(&db, viewer, Marker::ShoppingCart, pancakes.id).await?;

        let items = shopping_list(&db, viewer).await?;
        assert_eq!(
            items,
            vec![
                ShoppingListItem {
                    name: "eggs".to_string(),
                    measurement_unit: "pcs".to_string(),
                    total_amount: 4,
                },
                ShoppingListItem {
                    name: "milk".to_string(),
                    measurement_unit: "ml".to_string(),
                    total_amount: 300,
                },
            ]
        );

        let csv = export_shopping_list(&db, viewer).await?;
        assert_eq!(csv, "\u{feff}eggs,pcs,4\r\nmilk,ml,300\r\n");

        // Another user's cart is empty
        let other = export_shopping_list(&db, Viewer::user(author.id)).await?;
        assert_eq!(other, "\u{feff}");

        Ok(())
    }

    #[test]
    fn test_render_csv_quotes_only_when_needed() {
        let items = vec![
            ShoppingListItem {
                name: "salt, coarse".to_string(),
                measurement_unit: "g".to_string(),
                total_amount: 5,
            },
            ShoppingListItem {
                name: "\"fresh\" basil".to_string(),
                measurement_unit: "leaves".to_string(),
                total_amount: 12,
            },
        ];

        assert_eq!(
            render_csv(&items),
            "\u{feff}\"salt, coarse\",g,5\r\n\"\"\"fresh\"\" basil\",leaves,12\r\n"
        );
    }
}
