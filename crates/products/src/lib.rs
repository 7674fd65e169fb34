//! Products domain module (catalog).
//!
//! This crate contains business rules for the product catalog, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage): product validation, listing
//! criteria, the public projections that are allowed to leave the service, and the
//! analytic views computed over the catalog.

pub mod analytics;
pub mod listing;
pub mod product;
pub mod reference;
pub mod views;

pub use analytics::{BrandCount, CalendarBucket, VendorCount};
pub use listing::{PAGE_SIZE, Page, ProductFilter, SortOrder};
pub use product::{NewProduct, Product, ProductPatch};
pub use reference::{Review, VendorAccount};
pub use views::{
    BrandName, ProductDetail, ProductView, ReviewAuthor, ReviewView, VendorCard, VendorPublic,
    VendorRank,
};
