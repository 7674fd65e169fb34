//! Records owned by neighbouring subsystems that the catalog only reads.
//!
//! Neither type implements `Serialize`: credentials live on [`VendorAccount`] and the
//! only way out of the service is through the projections in [`crate::views`].

use chrono::{DateTime, Utc};

use catalog_core::{Entity, ProductId, ReviewId, UserId};

/// A user account as stored by the user subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorAccount {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    /// Password hash. Never projected.
    pub password: String,
    /// Confirmation hash kept by the user subsystem. Never projected.
    pub confirm_password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for VendorAccount {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A product review as stored by the review subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: ReviewId,
    pub product: ProductId,
    pub user: UserId,
    pub rating: u8,
    pub title: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Review {
    type Id = ReviewId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
