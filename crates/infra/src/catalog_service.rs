//! Catalog service: the operations behind every product endpoint.
//!
//! Handlers never touch storage directly. Each method loads what it needs through
//! [`CatalogRepository`], applies the pure domain functions from `catalog-products`
//! and returns the projection the caller is allowed to see.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use catalog_core::{DomainError, ProductId, UserId};
use catalog_products::analytics;
use catalog_products::{
    BrandName, NewProduct, Page, Product, ProductDetail, ProductFilter, ProductPatch, ProductView,
    ReviewView, VendorAccount, VendorCard, VendorRank,
};

use crate::media::{MediaError, MediaHost, UploadOptions};
use crate::repository::{CatalogRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(RepositoryError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

impl From<DomainError> for CatalogError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidId(msg) => Self::BadRequest(msg),
        }
    }
}

impl From<RepositoryError> for CatalogError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Constraint(msg) => Self::Validation(msg),
            other => Self::Store(other),
        }
    }
}

/// An image received from a client, not yet hosted.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
    media: Arc<dyn MediaHost>,
    media_folder: String,
}

fn product_not_found(id: ProductId) -> CatalogError {
    CatalogError::NotFound(format!("product {id} not found"))
}

impl CatalogService {
    pub fn new(
        repo: Arc<dyn CatalogRepository>,
        media: Arc<dyn MediaHost>,
        media_folder: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            media,
            media_folder: media_folder.into(),
        }
    }

    /// Create a product owned by `vendor`.
    #[instrument(skip(self, input), fields(vendor = %vendor), err)]
    pub async fn create(&self, vendor: UserId, input: NewProduct) -> Result<Product, CatalogError> {
        let product = Product::create(ProductId::new(), input, vendor, Utc::now())?;
        let stored = self.repo.insert(product).await?;
        tracing::info!(product_id = %stored.id, "product created");
        Ok(stored)
    }

    #[instrument(skip(self), err)]
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<Vec<ProductView>, CatalogError> {
        let products = self.repo.find_page(filter, page).await?;
        Ok(products.into_iter().map(ProductView::from).collect())
    }

    /// One product with its vendor and reviews expanded.
    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn get(&self, id: ProductId) -> Result<ProductDetail, CatalogError> {
        let product = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| product_not_found(id))?;
        let reviews = self.repo.reviews_for(id).await?;

        let mut ids: Vec<UserId> = reviews.iter().map(|r| r.user).collect();
        ids.push(product.vendor);
        ids.sort_by_key(|id| *id.as_uuid());
        ids.dedup();
        let accounts = self.accounts_by_id(&ids).await?;

        let reviews = reviews
            .iter()
            .map(|r| ReviewView::new(r, accounts.get(&r.user)))
            .collect();
        let vendor = accounts.get(&product.vendor);
        Ok(ProductDetail::assemble(product, vendor, reviews))
    }

    /// Merge a partial update into the stored product.
    #[instrument(skip(self, patch), fields(product_id = %id, empty_patch = patch.is_empty()), err)]
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, CatalogError> {
        let current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| product_not_found(id))?;
        let merged = current.apply_patch(patch, Utc::now())?;

        // The product may have been deleted between the read and the write.
        self.repo
            .replace(merged)
            .await?
            .ok_or_else(|| product_not_found(id))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn delete(&self, id: ProductId) -> Result<Product, CatalogError> {
        let removed = self
            .repo
            .delete(id)
            .await?
            .ok_or_else(|| product_not_found(id))?;
        tracing::info!("product deleted");
        Ok(removed)
    }

    /// Host an image and return its public URL.
    ///
    /// The payload is spooled to a temp file that is removed whether or not the
    /// host accepts it.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()), err)]
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<String, CatalogError> {
        let is_image = upload
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"));
        if !is_image {
            return Err(CatalogError::BadRequest("please upload image".to_string()));
        }
        if upload.bytes.is_empty() {
            return Err(CatalogError::BadRequest("uploaded image is empty".to_string()));
        }

        let file_name = Path::new(&upload.file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("image")
            .to_string();

        let spool = tempfile::NamedTempFile::new().map_err(MediaError::Io)?;
        let result = match tokio::fs::write(spool.path(), &upload.bytes).await {
            Ok(()) => {
                let options = UploadOptions::named(self.media_folder.clone(), file_name);
                self.media.upload(spool.path(), &options).await
            }
            Err(e) => Err(MediaError::Io(e)),
        };

        if let Err(e) = spool.close() {
            tracing::warn!(error = %e, "failed to remove spooled upload");
        }

        let hosted = result?;
        Ok(hosted.secure_url)
    }

    #[instrument(skip(self), err)]
    pub async fn top_rated(&self) -> Result<Vec<Product>, CatalogError> {
        let products = self.repo.all().await?;
        Ok(analytics::top_rated(&products))
    }

    #[instrument(skip(self), err)]
    pub async fn top_brands(&self) -> Result<Vec<BrandName>, CatalogError> {
        let products = self.repo.all().await?;
        Ok(analytics::top_brands(&products))
    }

    #[instrument(skip(self), err)]
    pub async fn new_arrivals(&self) -> Result<Vec<Product>, CatalogError> {
        let products = self.repo.all().await?;
        Ok(analytics::new_arrivals(&products))
    }

    #[instrument(skip(self), err)]
    pub async fn recommended(&self) -> Result<Vec<ProductView>, CatalogError> {
        let products = self.repo.all().await?;
        let sample = analytics::recommended(&products, &mut rand::thread_rng());
        Ok(sample.into_iter().map(ProductView::from).collect())
    }

    /// Vendors ranked by product count; vendors without an account render as `None`.
    #[instrument(skip(self), err)]
    pub async fn top_vendors(&self) -> Result<Vec<VendorRank>, CatalogError> {
        let products = self.repo.all().await?;
        let counts = analytics::vendor_counts(&products);

        let ids: Vec<UserId> = counts.iter().map(|c| c.vendor).collect();
        let accounts = self.accounts_by_id(&ids).await?;

        Ok(counts
            .into_iter()
            .map(|c| VendorRank {
                vendor: accounts.get(&c.vendor).map(VendorCard::from),
                product_count: c.product_count,
            })
            .collect())
    }

    async fn accounts_by_id(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, VendorAccount>, CatalogError> {
        let accounts = self.repo.accounts(ids).await?;
        Ok(accounts.into_iter().map(|a| (a.id, a)).collect())
    }
}
