use std::time::Duration;

use anyhow::Result;
use moka::future::Cache;
use sea_orm::Database;
use serde::Deserialize;
use tracing::{debug, info};

use crate::schemas::AppState;

/// Tunables read from `foodgram.toml` and `FOODGRAM_*` environment variables.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Page size used when a request does not pass `limit`
    pub page_size: u64,
    /// Upper bound for `limit`
    pub max_page_size: u64,
    /// How long tag and ingredient listings stay cached
    pub catalog_cache_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: 6,
            max_page_size: 100,
            catalog_cache_ttl_secs: 300,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let defaults = Settings::default();
        let settings = config::Config::builder()
            .set_default("page_size", defaults.page_size)?
            .set_default("max_page_size", defaults.max_page_size)?
            .set_default("catalog_cache_ttl_secs", defaults.catalog_cache_ttl_secs)?
            .add_source(config::File::with_name("foodgram").required(false))
            .add_source(config::Environment::with_prefix("FOODGRAM"))
            .build()?
            .try_deserialize::<Settings>()?;

        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Resolves `page`/`limit` query values into a 1-based page and a bounded size.
    ///
    /// `page` is capped so the row offset of the page still fits a query.
    pub fn page_bounds(&self, page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
        let limit = limit
            .unwrap_or(self.page_size)
            .clamp(1, self.max_page_size.max(1));
        let last_page = i64::MAX as u64 / limit + 1;
        let page = page.unwrap_or(1).clamp(1, last_page);
        (page, limit)
    }
}

/// Connects to the database and builds the shared state.
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    let settings = Settings::load()?;

    info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    Ok(AppState::new(db, settings))
}

pub fn catalog_cache(settings: &Settings) -> Cache<String, crate::schemas::CachedCatalog> {
    Cache::builder()
        .max_capacity(16)
        .time_to_live(Duration::from_secs(settings.catalog_cache_ttl_secs))
        .build()
}
