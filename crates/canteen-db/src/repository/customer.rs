//! # Customer Repository
//!
//! Database operations for customer accounts.
//!
//! Balance changes go through [`CustomerRepository::charge`] and
//! [`CustomerRepository::credit`], both conditional single-statement
//! updates run inside the caller's transaction. The
//! `standard_balance_floor` CHECK in the schema backs them up.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::{like_pattern, page};
use crate::error::{DbError, DbResult};
use canteen_core::{Customer, CustomerFilter, CustomerUpdate, Retirement};

pub(crate) const CUSTOMER_COLUMNS: &str = "id, name, handle, room, category, balance_cents, \
     initial_balance_cents, is_active, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut *conn, id).await
    }

    /// Looks a customer up by handle, ignoring case.
    pub async fn get_by_handle(&self, handle: &str) -> DbResult<Option<Customer>> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE handle = ?1 COLLATE NOCASE"
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(handle.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    /// Lists customers matching the filter, ordered by name.
    pub async fn list(&self, filter: &CustomerFilter) -> DbResult<Vec<Customer>> {
        debug!(?filter, "Listing customers");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(CUSTOMER_COLUMNS).push(" FROM customers WHERE 1 = 1");

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = like_pattern(search);
            qb.push(" AND (name LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR handle LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        if let Some(category) = filter.category {
            qb.push(" AND category = ").push_bind(category);
        }
        if filter.active_only {
            qb.push(" AND is_active = 1");
        }

        let (offset, limit) = page(filter.offset, filter.limit);
        qb.push(" ORDER BY name, handle LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let customers = qb
            .build_query_as::<Customer>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = customers.len(), "Listed customers");
        Ok(customers)
    }

    /// Case-insensitive handle collision check, optionally ignoring one customer.
    pub async fn handle_exists(&self, handle: &str, exclude_id: Option<&str>) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM customers
                WHERE handle = ?1 COLLATE NOCASE
                AND (?2 IS NULL OR id <> ?2)
            )
            "#,
        )
        .bind(handle.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Inserts a new customer. The opening balance is stored twice: as the
    /// live balance and as the reconciliation base.
    pub async fn insert(&self, customer: &Customer) -> DbResult<Customer> {
        debug!(id = %customer.id, handle = %customer.handle, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, handle, room, category, balance_cents,
                initial_balance_cents, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.handle)
        .bind(&customer.room)
        .bind(customer.category)
        .bind(customer.balance_cents)
        .bind(customer.initial_balance_cents)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer.clone())
    }

    /// Applies a partial update. Balance is never touched here.
    pub async fn update(&self, id: &str, update: &CustomerUpdate) -> DbResult<Customer> {
        debug!(id = %id, ?update, "Updating customer");

        let sql = format!(
            r#"
            UPDATE customers SET
                name = COALESCE(?2, name),
                handle = COALESCE(?3, handle),
                room = CASE WHEN ?4 THEN ?5 ELSE room END,
                category = COALESCE(?6, category),
                is_active = COALESCE(?7, is_active),
                updated_at = ?8
            WHERE id = ?1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(update.name.as_deref().map(str::trim))
            .bind(update.handle.as_deref().map(str::trim))
            .bind(update.room.is_some())
            .bind(update.room.clone().flatten())
            .bind(update.category)
            .bind(update.is_active)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Deletes the customer if they have no sales and no ledger history,
    /// otherwise deactivates them.
    pub async fn retire(&self, id: &str) -> DbResult<Retirement> {
        debug!(id = %id, "Retiring customer");

        let deleted = sqlx::query(
            r#"
            DELETE FROM customers
            WHERE id = ?1
            AND NOT EXISTS (SELECT 1 FROM sales WHERE customer_id = ?1)
            AND NOT EXISTS (SELECT 1 FROM ledger_entries WHERE customer_id = ?1)
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if deleted.rows_affected() > 0 {
            return Ok(Retirement::Deleted);
        }

        let result =
            sqlx::query("UPDATE customers SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(Retirement::Deactivated)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // In-transaction helpers
    // =========================================================================

    pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(customer)
    }

    /// Debits `amount_cents` if the customer is active and is Staff or can
    /// cover it.
    ///
    /// Returns the new balance, or `None` when the guard failed.
    pub async fn charge(
        conn: &mut SqliteConnection,
        id: &str,
        amount_cents: i64,
    ) -> DbResult<Option<i64>> {
        debug!(id = %id, amount_cents, "Charging customer");

        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE customers
            SET balance_cents = balance_cents - ?2, updated_at = ?3
            WHERE id = ?1
            AND is_active = 1
            AND (category = 'staff' OR balance_cents >= ?2)
            RETURNING balance_cents
            "#,
        )
        .bind(id)
        .bind(amount_cents)
        .bind(Utc::now())
        .fetch_optional(conn)
        .await?;

        Ok(balance)
    }

    /// Credits `amount_cents`, active or not. Refunds and debt repayments
    /// must reach deactivated customers too.
    ///
    /// Returns the new balance, or `None` for an unknown customer.
    pub async fn credit(
        conn: &mut SqliteConnection,
        id: &str,
        amount_cents: i64,
    ) -> DbResult<Option<i64>> {
        debug!(id = %id, amount_cents, "Crediting customer");

        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE customers
            SET balance_cents = balance_cents + ?2, updated_at = ?3
            WHERE id = ?1
            RETURNING balance_cents
            "#,
        )
        .bind(id)
        .bind(amount_cents)
        .bind(Utc::now())
        .fetch_optional(conn)
        .await?;

        Ok(balance)
    }
}
