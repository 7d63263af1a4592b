use std::fs;

use anyhow::{Context, Result, bail};
use model::entities::{ingredient, prelude::*, tag};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Ingredients,
    Tags,
}

#[derive(Debug, Deserialize)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

#[derive(Debug, Deserialize)]
struct TagRecord {
    name: String,
    color: String,
    slug: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

pub async fn import_catalog(kind: CatalogKind, json_path: &str, database_url: &str) -> Result<()> {
    info!("Importing {:?} from {}", kind, json_path);

    let raw = fs::read_to_string(json_path)
        .with_context(|| format!("Failed to read {json_path}"))?;
    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{database_url}'"))?;

    let summary = import_records(&db, kind, &raw).await?;
    info!(
        "Import finished: {} inserted, {} already present or invalid",
        summary.inserted, summary.skipped
    );
    Ok(())
}

/// Inserts every record not already present. Existing rows are left alone,
/// so the import can be re-run.
pub async fn import_records(
    db: &DatabaseConnection,
    kind: CatalogKind,
    raw: &str,
) -> Result<ImportSummary> {
    match kind {
        CatalogKind::Ingredients => {
            let records: Vec<IngredientRecord> =
                serde_json::from_str(raw).context("Malformed ingredient list")?;
            import_ingredients(db, records).await
        }
        CatalogKind::Tags => {
            let records: Vec<TagRecord> = serde_json::from_str(raw).context("Malformed tag list")?;
            import_tags(db, records).await
        }
    }
}

async fn import_ingredients(
    db: &DatabaseConnection,
    records: Vec<IngredientRecord>,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for record in records {
        let name = record.name.trim();
        let unit = record.measurement_unit.trim();
        if name.is_empty() || unit.is_empty() {
            warn!("Skipping ingredient with empty name or unit: {:?}", record);
            summary.skipped += 1;
            continue;
        }

        let exists = Ingredient::find()
            .filter(ingredient::Column::Name.eq(name))
            .filter(ingredient::Column::MeasurementUnit.eq(unit))
            .count(db)
            .await?
            > 0;
        if exists {
            summary.skipped += 1;
            continue;
        }

        ingredient::ActiveModel {
            name: Set(name.to_string()),
            measurement_unit: Set(unit.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        summary.inserted += 1;
    }

    debug!("Ingredient import: {:?}", summary);
    Ok(summary)
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

async fn import_tags(db: &DatabaseConnection, records: Vec<TagRecord>) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for record in records {
        if record.name.trim().is_empty() || record.slug.trim().is_empty() {
            bail!("Tag records need a name and a slug: {:?}", record);
        }
        if !is_hex_color(&record.color) {
            warn!("Skipping tag {} with invalid color {}", record.slug, record.color);
            summary.skipped += 1;
            continue;
        }

        let exists = Tag::find()
            .filter(
                tag::Column::Slug
                    .eq(record.slug.as_str())
                    .or(tag::Column::Name.eq(record.name.as_str())),
            )
            .count(db)
            .await?
            > 0;
        if exists {
            summary.skipped += 1;
            continue;
        }

        tag::ActiveModel {
            name: Set(record.name),
            color: Set(record.color.to_uppercase()),
            slug: Set(record.slug),
            ..Default::default()
        }
        .insert(db)
        .await?;
        summary.inserted += 1;
    }

    debug!("Tag import: {:?}", summary);
    Ok(summary)
}
