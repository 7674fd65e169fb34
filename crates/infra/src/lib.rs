//! Infrastructure layer: storage backends, the media host adapter, configuration,
//! and the catalog service that ties them to the domain.

pub mod catalog_service;
pub mod config;
pub mod db;
pub mod media;
pub mod repository;

pub use catalog_service::{CatalogError, CatalogService, ImageUpload};
pub use config::{CatalogConfig, ConfigError};
pub use media::{HostedMedia, MediaError, MediaHost, UploadOptions};
pub use repository::{CatalogRepository, InMemoryCatalogRepository, PostgresCatalogRepository, RepositoryError};
