//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: read, subtract in Rust, write back                       │
//! │     SELECT stock ...;  UPDATE products SET stock = 4 WHERE id = ?   │
//! │     Two tills both read 10, both write 4: 12 sold, 6 recorded.      │
//! │                                                                     │
//! │  ✅ CORRECT: conditional delta                                      │
//! │     UPDATE products SET stock = stock - 6                           │
//! │     WHERE id = ? AND is_active = 1 AND stock >= 6                   │
//! │     RETURNING stock                                                 │
//! │                                                                     │
//! │  No row back means the guard failed; the caller re-reads the row   │
//! │  to say why and rolls the batch back.                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::{like_pattern, page};
use crate::error::{DbError, DbResult};
use canteen_core::{Product, ProductFilter, ProductUpdate, Retirement};

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, unit_price_cents, stock, reorder_threshold, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut *conn, id).await
    }

    /// Lists products matching the filter, ordered by name.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        debug!(?filter, "Listing products");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(PRODUCT_COLUMNS).push(" FROM products WHERE 1 = 1");

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND name LIKE ")
                .push_bind(like_pattern(search))
                .push(" ESCAPE '\\'");
        }
        if filter.active_only {
            qb.push(" AND is_active = 1");
        }
        if filter.low_stock_only {
            qb.push(" AND stock <= reorder_threshold");
        }

        let (offset, limit) = page(filter.offset, filter.limit);
        qb.push(" ORDER BY name LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let products = qb
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Case-insensitive name collision check, optionally ignoring one product.
    pub async fn name_exists(&self, name: &str, exclude_id: Option<&str>) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM products
                WHERE name = ?1 COLLATE NOCASE
                AND (?2 IS NULL OR id <> ?2)
            )
            "#,
        )
        .bind(name.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the name is already taken
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, unit_price_cents, stock, reorder_threshold,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.unit_price_cents)
        .bind(product.stock)
        .bind(product.reorder_threshold)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Applies a partial update. Stock is never touched here.
    pub async fn update(&self, id: &str, update: &ProductUpdate) -> DbResult<Product> {
        debug!(id = %id, ?update, "Updating product");

        let sql = format!(
            r#"
            UPDATE products SET
                name = COALESCE(?2, name),
                unit_price_cents = COALESCE(?3, unit_price_cents),
                reorder_threshold = COALESCE(?4, reorder_threshold),
                is_active = COALESCE(?5, is_active),
                updated_at = ?6
            WHERE id = ?1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(update.name.as_deref().map(str::trim))
            .bind(update.unit_price_cents)
            .bind(update.reorder_threshold)
            .bind(update.is_active)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes the product if nothing references it, otherwise deactivates it.
    pub async fn retire(&self, id: &str) -> DbResult<Retirement> {
        debug!(id = %id, "Retiring product");

        let deleted = sqlx::query(
            r#"
            DELETE FROM products
            WHERE id = ?1
            AND NOT EXISTS (SELECT 1 FROM sale_lines WHERE product_id = ?1)
            AND NOT EXISTS (SELECT 1 FROM restocks WHERE product_id = ?1)
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if deleted.rows_affected() > 0 {
            return Ok(Retirement::Deleted);
        }

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(Retirement::Deactivated)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // In-transaction helpers
    // =========================================================================

    /// Reads a product through the given connection (usually `&mut *tx`).
    pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(product)
    }

    /// Takes `qty` units if the product is active and has them.
    ///
    /// Returns the new stock, or `None` when the guard failed (missing,
    /// inactive, or short).
    pub async fn deduct_stock(
        conn: &mut SqliteConnection,
        id: &str,
        qty: i64,
    ) -> DbResult<Option<i64>> {
        debug!(id = %id, qty, "Deducting stock");

        let stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND is_active = 1 AND stock >= ?2
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(qty)
        .bind(Utc::now())
        .fetch_optional(conn)
        .await?;

        Ok(stock)
    }

    /// Adds `qty` units regardless of the active flag.
    ///
    /// Used by restocks and sale cancellations. Returns the new stock, or
    /// `None` if the product does not exist.
    pub async fn add_stock(
        conn: &mut SqliteConnection,
        id: &str,
        qty: i64,
    ) -> DbResult<Option<i64>> {
        debug!(id = %id, qty, "Adding stock");

        let stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(qty)
        .bind(Utc::now())
        .fetch_optional(conn)
        .await?;

        Ok(stock)
    }
}
