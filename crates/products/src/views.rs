//! Public projections: the only shapes that leave the service.

use serde::Serialize;

use catalog_core::{ProductId, UserId};

use crate::product::Product;
use crate::reference::{Review, VendorAccount};

/// A product without its bookkeeping timestamps (listings, recommendations).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub brand: String,
    pub image: Option<String>,
    pub vendor: UserId,
    pub price: u64,
    pub average_rating: f64,
    pub number_of_reviews: u32,
}

impl From<Product> for ProductView {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            category: p.category,
            brand: p.brand,
            image: p.image,
            vendor: p.vendor,
            price: p.price,
            average_rating: p.average_rating,
            number_of_reviews: p.number_of_reviews,
        }
    }
}

/// Review author reduced to display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAuthor {
    pub first_name: String,
    pub last_name: String,
}

impl From<&VendorAccount> for ReviewAuthor {
    fn from(account: &VendorAccount) -> Self {
        Self {
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
        }
    }
}

/// A review as embedded in a single-product read (no id, no timestamps).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub product: ProductId,
    pub rating: u8,
    pub title: String,
    pub comment: String,
    pub user: Option<ReviewAuthor>,
}

impl ReviewView {
    pub fn new(review: &Review, author: Option<&VendorAccount>) -> Self {
        Self {
            product: review.product,
            rating: review.rating,
            title: review.title.clone(),
            comment: review.comment.clone(),
            user: author.map(ReviewAuthor::from),
        }
    }
}

/// Vendor as embedded in a single-product read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorPublic {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

impl From<&VendorAccount> for VendorPublic {
    fn from(account: &VendorAccount) -> Self {
        Self {
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            role: account.role.clone(),
        }
    }
}

/// Single-product read: vendor and reviews expanded, timestamps dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub brand: String,
    pub image: Option<String>,
    /// `None` when the owning account no longer exists.
    pub vendor: Option<VendorPublic>,
    pub price: u64,
    pub average_rating: f64,
    pub number_of_reviews: u32,
    pub reviews: Vec<ReviewView>,
}

impl ProductDetail {
    pub fn assemble(
        product: Product,
        vendor: Option<&VendorAccount>,
        reviews: Vec<ReviewView>,
    ) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            category: product.category,
            brand: product.brand,
            image: product.image,
            vendor: vendor.map(VendorPublic::from),
            price: product.price,
            average_rating: product.average_rating,
            number_of_reviews: product.number_of_reviews,
            reviews,
        }
    }
}

/// Vendor card for the top-vendors ranking (no role, no credentials).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorCard {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&VendorAccount> for VendorCard {
    fn from(account: &VendorAccount) -> Self {
        Self {
            id: account.id,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorRank {
    pub vendor: Option<VendorCard>,
    pub product_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandName {
    pub brand_name: String,
}
