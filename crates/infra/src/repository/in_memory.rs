use std::collections::HashMap;
use std::sync::RwLock;

use catalog_core::{Entity, ProductId, UserId};
use catalog_products::listing::select_page;
use catalog_products::{Page, Product, ProductFilter, Review, VendorAccount};

use super::{CatalogRepository, RepositoryError};

/// In-memory catalog store for tests/dev.
///
/// Products are kept in insertion order, which doubles as the natural order for
/// unsorted listings. Accounts and reviews belong to other subsystems; the `put_*`
/// methods stand in for them.
#[derive(Debug, Default)]
pub struct InMemoryCatalogRepository {
    products: RwLock<Vec<Product>>,
    accounts: RwLock<HashMap<UserId, VendorAccount>>,
    reviews: RwLock<Vec<Review>>,
}

fn poisoned(what: &str) -> RepositoryError {
    RepositoryError::Unavailable(format!("{what} lock poisoned"))
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) a user account.
    pub fn put_account(&self, account: VendorAccount) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned("accounts"))?;
        accounts.insert(*account.id(), account);
        Ok(())
    }

    /// Attach a review to a product.
    pub fn put_review(&self, review: Review) -> Result<(), RepositoryError> {
        let mut reviews = self.reviews.write().map_err(|_| poisoned("reviews"))?;
        reviews.push(review);
        Ok(())
    }

    /// Overwrite the rating aggregates, as the review subsystem would.
    pub fn set_rating(
        &self,
        id: ProductId,
        average_rating: f64,
        number_of_reviews: u32,
    ) -> Result<bool, RepositoryError> {
        let mut products = self.products.write().map_err(|_| poisoned("products"))?;
        match products.iter_mut().find(|p| p.id() == &id) {
            Some(p) => {
                p.average_rating = average_rating;
                p.number_of_reviews = number_of_reviews;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn review_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.reviews.read().map_err(|_| poisoned("reviews"))?.len())
    }
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn insert(&self, product: Product) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().map_err(|_| poisoned("products"))?;
        if products.iter().any(|p| p.id() == product.id()) {
            return Err(RepositoryError::Constraint(format!(
                "product {} already exists",
                product.id
            )));
        }
        products.push(product.clone());
        Ok(product)
    }

    async fn find_page(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().map_err(|_| poisoned("products"))?;
        Ok(select_page(&products, filter, page))
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().map_err(|_| poisoned("products"))?;
        Ok(products.iter().find(|p| p.id() == &id).cloned())
    }

    async fn replace(&self, product: Product) -> Result<Option<Product>, RepositoryError> {
        let mut products = self.products.write().map_err(|_| poisoned("products"))?;
        match products.iter_mut().find(|p| p.id() == product.id()) {
            Some(slot) => {
                *slot = product.clone();
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let removed = {
            let mut products = self.products.write().map_err(|_| poisoned("products"))?;
            match products.iter().position(|p| p.id() == &id) {
                Some(idx) => products.remove(idx),
                None => return Ok(None),
            }
        };

        let mut reviews = self.reviews.write().map_err(|_| poisoned("reviews"))?;
        reviews.retain(|r| r.product != id);
        Ok(Some(removed))
    }

    async fn all(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().map_err(|_| poisoned("products"))?;
        Ok(products.clone())
    }

    async fn reviews_for(&self, product: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let reviews = self.reviews.read().map_err(|_| poisoned("reviews"))?;
        let mut found: Vec<Review> = reviews.iter().filter(|r| r.product == product).cloned().collect();
        found.sort_by_key(|r| r.created_at);
        Ok(found)
    }

    async fn accounts(&self, ids: &[UserId]) -> Result<Vec<VendorAccount>, RepositoryError> {
        let accounts = self.accounts.read().map_err(|_| poisoned("accounts"))?;
        Ok(ids.iter().filter_map(|id| accounts.get(id).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::ReviewId;
    use catalog_products::NewProduct;
    use chrono::{Duration, Utc};

    fn product(name: &str, minutes: i64) -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                name: name.to_string(),
                description: None,
                category: "audio".to_string(),
                brand: "Sonic".to_string(),
                image: None,
                price: 9_900,
            },
            UserId::new(),
            Utc::now() + Duration::minutes(minutes),
        )
        .unwrap()
    }

    fn review(product: ProductId) -> Review {
        Review {
            id: ReviewId::new(),
            product,
            user: UserId::new(),
            rating: 4,
            title: "ok".to_string(),
            comment: "fine".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_then_find_by_id() {
        let repo = InMemoryCatalogRepository::new();
        let p = repo.insert(product("Headphones", 0)).await.unwrap();

        assert_eq!(repo.find_by_id(p.id).await.unwrap(), Some(p.clone()));
        assert_eq!(repo.find_by_id(ProductId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_constraint_violation() {
        let repo = InMemoryCatalogRepository::new();
        let p = product("Headphones", 0);
        repo.insert(p.clone()).await.unwrap();

        assert!(matches!(
            repo.insert(p).await,
            Err(RepositoryError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn all_keeps_insertion_order() {
        let repo = InMemoryCatalogRepository::new();
        for (i, name) in ["c", "a", "b"].iter().enumerate() {
            repo.insert(product(name, i as i64)).await.unwrap();
        }
        let names: Vec<String> = repo.all().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn replace_missing_returns_none() {
        let repo = InMemoryCatalogRepository::new();
        assert_eq!(repo.replace(product("ghost", 0)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_product_and_its_reviews() {
        let repo = InMemoryCatalogRepository::new();
        let keep = repo.insert(product("keep", 0)).await.unwrap();
        let gone = repo.insert(product("gone", 1)).await.unwrap();
        repo.put_review(review(keep.id)).unwrap();
        repo.put_review(review(gone.id)).unwrap();
        repo.put_review(review(gone.id)).unwrap();

        let removed = repo.delete(gone.id).await.unwrap();
        assert_eq!(removed.map(|p| p.id), Some(gone.id));
        assert_eq!(repo.review_count().unwrap(), 1);
        assert!(repo.delete(gone.id).await.unwrap().is_none());
        assert_eq!(repo.reviews_for(keep.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn accounts_skips_unknown_ids() {
        let repo = InMemoryCatalogRepository::new();
        let known = VendorAccount {
            id: UserId::new(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            role: "vendor".to_string(),
            password: "hash".to_string(),
            confirm_password: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        repo.put_account(known.clone()).unwrap();

        let found = repo.accounts(&[UserId::new(), known.id]).await.unwrap();
        assert_eq!(found, vec![known]);
    }

    #[tokio::test]
    async fn set_rating_updates_aggregates() {
        let repo = InMemoryCatalogRepository::new();
        let p = repo.insert(product("rated", 0)).await.unwrap();

        assert!(repo.set_rating(p.id, 4.5, 10).unwrap());
        let stored = repo.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(stored.average_rating, 4.5);
        assert_eq!(stored.number_of_reviews, 10);
        assert!(!repo.set_rating(ProductId::new(), 1.0, 1).unwrap());
    }
}
