use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::services::config::AppConfig;
use crate::services::media::MediaStore;
use crate::services::stl::{HttpArchiveSource, StlExtractor};

pub struct AppState {
    pub pool: SqlitePool,
    pub config: AppConfig,
    pub media: MediaStore,
    pub stl: StlExtractor<HttpArchiveSource>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Open the database (creating it if needed), run migrations and wire services.
    pub async fn init(config: AppConfig) -> anyhow::Result<SharedState> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .with_context(|| format!("Invalid DATABASE_URL '{}'", config.database_url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to open database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        info!("Database ready at {}", config.database_url);

        Self::with_pool(config, pool)
    }

    /// Wire services around an existing, already migrated pool.
    pub fn with_pool(config: AppConfig, pool: SqlitePool) -> anyhow::Result<SharedState> {
        std::fs::create_dir_all(&config.media_root).with_context(|| {
            format!("Failed to create media root {}", config.media_root.display())
        })?;

        let media = MediaStore::new(config.media_root.clone(), config.media_url.clone());
        let source =
            HttpArchiveSource::new(config.stl.fetch_timeout, config.stl.limits.max_archive_bytes)?;
        let stl = StlExtractor::new(
            source,
            media.clone(),
            &config.stl,
            config.blob_base_url.clone(),
        );

        Ok(Arc::new(Self {
            pool,
            config,
            media,
            stl,
        }))
    }
}
