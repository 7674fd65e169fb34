use std::sync::Arc;

use sqlx::PgPool;

use catalog_infra::media::{CloudinaryClient, InMemoryMediaHost};
use catalog_infra::{
    CatalogConfig, CatalogRepository, CatalogService, InMemoryCatalogRepository, MediaHost,
    PostgresCatalogRepository, RepositoryError, db,
};

/// Shared per-process services handed to every handler.
pub struct AppServices {
    catalog: CatalogService,
    pool: Option<PgPool>,
}

impl AppServices {
    pub fn new(catalog: CatalogService, pool: Option<PgPool>) -> Self {
        Self { catalog, pool }
    }

    /// Fully in-process wiring (dev and tests).
    pub fn in_memory(
        repo: Arc<InMemoryCatalogRepository>,
        media: Arc<dyn MediaHost>,
        media_folder: impl Into<String>,
    ) -> Self {
        Self::new(CatalogService::new(repo, media, media_folder), None)
    }

    /// Wire storage and media host from configuration.
    ///
    /// With a database configured the pool is opened and the schema bootstrapped
    /// before any request is served.
    pub async fn from_config(config: &CatalogConfig) -> Result<Self, RepositoryError> {
        let media: Arc<dyn MediaHost> = match &config.media.cloudinary {
            Some(cloudinary) => Arc::new(CloudinaryClient::new(cloudinary.clone())),
            None => Arc::new(InMemoryMediaHost::new()),
        };

        let (repo, pool): (Arc<dyn CatalogRepository>, Option<PgPool>) = match &config.database {
            Some(database) => {
                let pool = db::connect(database).await?;
                db::migrate(&pool).await?;
                tracing::info!(max_connections = database.max_connections, "connected to postgres");
                (Arc::new(PostgresCatalogRepository::new(pool.clone())), Some(pool))
            }
            None => (Arc::new(InMemoryCatalogRepository::new()), None),
        };

        Ok(Self::new(
            CatalogService::new(repo, media, config.media.folder.clone()),
            pool,
        ))
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    /// Close the database pool, if any. Call after the server has drained.
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            tracing::info!("database pool closed");
        }
    }
}
