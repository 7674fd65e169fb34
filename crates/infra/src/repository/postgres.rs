//! Postgres-backed catalog repository.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RepositoryError |
//! |------------|----------------------|-----------------|
//! | Database (unique violation) | `23505` | `Constraint` |
//! | Database (check constraint violation) | `23514` | `Constraint` |
//! | Database (other) | Any other | `Database` |
//! | PoolClosed / PoolTimedOut | N/A | `Unavailable` |
//! | Other | N/A | `Database` |
//!
//! Rows are mapped by hand (`try_get`) and then converted into domain records;
//! values that do not fit the domain types (negative price, rating outside `u8`)
//! surface as `Corrupt`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use catalog_core::{ProductId, ReviewId, UserId};
use catalog_products::{Page, Product, ProductFilter, Review, SortOrder, VendorAccount};

use super::{CatalogRepository, RepositoryError};

const PRODUCT_COLUMNS: &str = "id, name, description, category, brand, image, vendor, price, \
     average_rating, number_of_reviews, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresCatalogRepository {
    pool: Arc<PgPool>,
}

impl PostgresCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn insert(&self, product: Product) -> Result<Product, RepositoryError> {
        let price = i64::try_from(product.price)
            .map_err(|_| RepositoryError::Constraint(format!("price {} out of range", product.price)))?;
        let reviews = i32::try_from(product.number_of_reviews).map_err(|_| {
            RepositoryError::Constraint(format!(
                "number_of_reviews {} out of range",
                product.number_of_reviews
            ))
        })?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (
                id, name, description, category, brand, image, vendor, price,
                average_rating, number_of_reviews, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.image)
        .bind(product.vendor.as_uuid())
        .bind(price)
        .bind(product.average_rating)
        .bind(reviews)
        .bind(product.created_at)
        .bind(product.updated_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        product_from_row(&row)
    }

    #[instrument(skip(self, filter), fields(page = page.number()), err)]
    async fn find_page(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<Vec<Product>, RepositoryError> {
        let pattern = filter
            .search
            .as_deref()
            .map(|s| format!("%{}%", escape_like(s)));
        let sort = filter.sort.map(|s| match s {
            SortOrder::Latest => "latest",
            SortOrder::Oldest => "oldest",
        });

        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\')
                AND ($2::text IS NULL OR category = $2)
            ORDER BY
                CASE WHEN $3::text = 'latest' THEN created_at END DESC,
                CASE WHEN $3::text = 'oldest' THEN created_at END ASC,
                seq ASC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(pattern)
        .bind(filter.category.as_deref())
        .bind(sort)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_page", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn replace(&self, product: Product) -> Result<Option<Product>, RepositoryError> {
        let price = i64::try_from(product.price)
            .map_err(|_| RepositoryError::Constraint(format!("price {} out of range", product.price)))?;

        // Rating aggregates belong to the review subsystem and are left untouched.
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET name = $2, description = $3, category = $4, brand = $5,
                image = $6, price = $7, updated_at = $8
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.image)
        .bind(price)
        .bind(product.updated_at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("replace_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(&format!(
            "DELETE FROM products WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_product", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback_transaction", e))?;
            return Ok(None);
        };
        let removed = product_from_row(&row)?;

        let reviews = sqlx::query("DELETE FROM reviews WHERE product_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_reviews", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::debug!(reviews_removed = reviews.rows_affected(), "product deleted");
        Ok(Some(removed))
    }

    #[instrument(skip(self), err)]
    async fn all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY seq ASC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("all_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), fields(product_id = %product), err)]
    async fn reviews_for(&self, product: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, user_id, rating, title, comment, created_at, updated_at
            FROM reviews
            WHERE product_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(product.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("reviews_for", e))?;

        rows.iter()
            .map(|row| {
                ReviewRow::from_row(row)
                    .map_err(|e| RepositoryError::Corrupt(format!("failed to read review row: {e}")))
                    .and_then(Review::try_from)
            })
            .collect()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn accounts(&self, ids: &[UserId]) -> Result<Vec<VendorAccount>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        let rows = sqlx::query(
            r#"
            SELECT id, first_name, last_name, email, role, password, confirm_password,
                   created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("accounts", e))?;

        rows.iter()
            .map(|row| {
                AccountRow::from_row(row)
                    .map(VendorAccount::from)
                    .map_err(|e| RepositoryError::Corrupt(format!("failed to read account row: {e}")))
            })
            .collect()
    }
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_string();
            match db_err.code().as_deref() {
                Some("23505") | Some("23514") => {
                    RepositoryError::Constraint(format!("{operation}: {message}"))
                }
                _ => RepositoryError::Database { operation, message },
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            RepositoryError::Unavailable(format!("{operation}: {err}"))
        }
        other => RepositoryError::Database {
            operation,
            message: other.to_string(),
        },
    }
}

fn product_from_row(row: &PgRow) -> Result<Product, RepositoryError> {
    ProductRow::from_row(row)
        .map_err(|e| RepositoryError::Corrupt(format!("failed to read product row: {e}")))
        .and_then(Product::try_from)
}

struct ProductRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    category: String,
    brand: String,
    image: Option<String>,
    vendor: Uuid,
    price: i64,
    average_rating: f64,
    number_of_reviews: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            brand: row.try_get("brand")?,
            image: row.try_get("image")?,
            vendor: row.try_get("vendor")?,
            price: row.try_get("price")?,
            average_rating: row.try_get("average_rating")?,
            number_of_reviews: row.try_get("number_of_reviews")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = u64::try_from(row.price)
            .map_err(|_| RepositoryError::Corrupt(format!("product {} has price {}", row.id, row.price)))?;
        let number_of_reviews = u32::try_from(row.number_of_reviews).map_err(|_| {
            RepositoryError::Corrupt(format!(
                "product {} has number_of_reviews {}",
                row.id, row.number_of_reviews
            ))
        })?;

        Ok(Product {
            id: ProductId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            category: row.category,
            brand: row.brand,
            image: row.image,
            vendor: UserId::from_uuid(row.vendor),
            price,
            average_rating: row.average_rating,
            number_of_reviews,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

struct ReviewRow {
    id: Uuid,
    product_id: Uuid,
    user_id: Uuid,
    rating: i16,
    title: String,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ReviewRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ReviewRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            user_id: row.try_get("user_id")?,
            rating: row.try_get("rating")?,
            title: row.try_get("title")?,
            comment: row.try_get("comment")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .map_err(|_| RepositoryError::Corrupt(format!("review {} has rating {}", row.id, row.rating)))?;

        Ok(Review {
            id: ReviewId::from_uuid(row.id),
            product: ProductId::from_uuid(row.product_id),
            user: UserId::from_uuid(row.user_id),
            rating,
            title: row.title,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

struct AccountRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    role: String,
    password: String,
    confirm_password: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for AccountRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AccountRow {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
            password: row.try_get("password")?,
            confirm_password: row.try_get("confirm_password")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<AccountRow> for VendorAccount {
    fn from(row: AccountRow) -> Self {
        VendorAccount {
            id: UserId::from_uuid(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            role: row.role,
            password: row.password,
            confirm_password: row.confirm_password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
