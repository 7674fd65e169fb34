//! Product repository interface: CRUD plus the reads the analytic views need.
//!
//! Backends:
//! - [`InMemoryCatalogRepository`]: tests/dev, insertion order is the natural order
//! - [`PostgresCatalogRepository`]: `sqlx` over a shared `PgPool`

use thiserror::Error;

use catalog_core::{ProductId, UserId};
use catalog_products::{Page, Product, ProductFilter, Review, VendorAccount};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryCatalogRepository;
pub use postgres::PostgresCatalogRepository;

/// Storage operation error.
///
/// These are **infrastructure errors** (connectivity, constraints, corrupt rows) as
/// opposed to domain errors (validation, missing records).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// The store refused a value (check/unique constraint).
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// A stored row could not be mapped back into a domain record.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Async storage contract for the catalog.
///
/// Reads of missing records return `Ok(None)`; deciding whether that is an error is
/// the caller's business.
#[async_trait::async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Persist a new, already validated product.
    async fn insert(&self, product: Product) -> Result<Product, RepositoryError>;

    /// Apply listing criteria: filter, optional creation-time sort, skip/limit.
    async fn find_page(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Overwrite the stored product with the same id. `None` if it no longer exists.
    async fn replace(&self, product: Product) -> Result<Option<Product>, RepositoryError>;

    /// Remove a product together with its reviews, returning the removed snapshot.
    async fn delete(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Every product, in storage natural order.
    async fn all(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Reviews attached to a product, oldest first.
    async fn reviews_for(&self, product: ProductId) -> Result<Vec<Review>, RepositoryError>;

    /// Accounts for the given ids. Unknown ids are skipped.
    async fn accounts(&self, ids: &[UserId]) -> Result<Vec<VendorAccount>, RepositoryError>;
}
