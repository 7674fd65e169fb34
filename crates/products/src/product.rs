use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{DomainError, DomainResult, Entity, ProductId, UserId};

/// Maximum product name length (characters).
pub const NAME_MAX_CHARS: usize = 100;

/// Maximum product description length (characters).
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// A catalog product.
///
/// `average_rating` and `number_of_reviews` are owned by the review subsystem: this
/// crate never derives them and callers can never set them through [`NewProduct`] or
/// [`ProductPatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub brand: String,
    pub image: Option<String>,
    pub vendor: UserId,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub average_rating: f64,
    pub number_of_reviews: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product.
///
/// There is deliberately no `vendor` field: ownership comes from the authenticated
/// caller, so anything a client sends under that key is dropped during decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub brand: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: u64,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub price: Option<u64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Product {
    /// Build a new product owned by `vendor`.
    ///
    /// Ratings start at zero; the review subsystem maintains them afterwards.
    pub fn create(
        id: ProductId,
        input: NewProduct,
        vendor: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let product = Self {
            id,
            name: input.name.trim().to_string(),
            description: input.description,
            category: input.category.trim().to_string(),
            brand: input.brand.trim().to_string(),
            image: input.image,
            vendor,
            price: input.price,
            average_rating: 0.0,
            number_of_reviews: 0,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    /// Merge `patch` into a copy of this product and validate the result.
    ///
    /// `self` is left untouched so a rejected patch never leaks into storage.
    pub fn apply_patch(&self, patch: ProductPatch, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut merged = self.clone();
        if let Some(name) = patch.name {
            merged.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            merged.description = Some(description);
        }
        if let Some(category) = patch.category {
            merged.category = category.trim().to_string();
        }
        if let Some(brand) = patch.brand {
            merged.brand = brand.trim().to_string();
        }
        if let Some(image) = patch.image {
            merged.image = Some(image);
        }
        if let Some(price) = patch.price {
            merged.price = price;
        }
        merged.updated_at = now;

        merged.validate()?;
        Ok(merged)
    }

    /// Schema checks shared by create and update.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.name.chars().count() > NAME_MAX_CHARS {
            return Err(DomainError::validation(format!(
                "name cannot be more than {NAME_MAX_CHARS} characters"
            )));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }
        if self.brand.trim().is_empty() {
            return Err(DomainError::validation("brand cannot be empty"));
        }
        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX_CHARS {
                return Err(DomainError::validation(format!(
                    "description cannot be more than {DESCRIPTION_MAX_CHARS} characters"
                )));
            }
        }
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
