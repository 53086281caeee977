//! # Sale Repository
//!
//! Database operations for sales and their lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   (nothing) ──insert──► ACTIVE ──mark_cancelled──► CANCELLED            │
//! │                                                                         │
//! │   insert writes the sale and every line in the caller's transaction;   │
//! │   mark_cancelled only matches rows still ACTIVE, so a second           │
//! │   cancellation finds nothing to update.                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::page;
use crate::error::DbResult;
use canteen_core::{Sale, SaleFilter, SaleLine};

const SALE_COLUMNS: &str =
    "id, customer_id, actor_id, total_cents, status, created_at, cancelled_at, cancelled_by";

const LINE_COLUMNS: &str =
    "id, sale_id, line_no, product_id, product_name, quantity, unit_price_cents, total_cents";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;

        let Some(mut sale) = Self::fetch(&mut *conn, id).await? else {
            return Ok(None);
        };
        sale.lines = Self::lines(&mut *conn, id).await?;

        Ok(Some(sale))
    }

    /// Lists sales matching the filter, newest first, lines included.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        debug!(?filter, "Listing sales");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(SALE_COLUMNS).push(" FROM sales WHERE 1 = 1");

        if let Some(customer_id) = &filter.customer_id {
            qb.push(" AND customer_id = ").push_bind(customer_id.clone());
        }
        if let Some(actor_id) = &filter.actor_id {
            qb.push(" AND actor_id = ").push_bind(actor_id.clone());
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(from) = filter.date_from {
            qb.push(" AND date(created_at) >= ").push_bind(from);
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND date(created_at) <= ").push_bind(to);
        }

        let (offset, limit) = page(filter.offset, filter.limit);
        qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let mut sales = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;
        if sales.is_empty() {
            return Ok(sales);
        }

        let mut lines_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        lines_qb
            .push(LINE_COLUMNS)
            .push(" FROM sale_lines WHERE sale_id IN (");
        let mut ids = lines_qb.separated(", ");
        for sale in &sales {
            ids.push_bind(sale.id.clone());
        }
        lines_qb.push(") ORDER BY sale_id, line_no");

        let lines = lines_qb
            .build_query_as::<SaleLine>()
            .fetch_all(&self.pool)
            .await?;

        for line in lines {
            if let Some(sale) = sales.iter_mut().find(|s| s.id == line.sale_id) {
                sale.lines.push(line);
            }
        }

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    // =========================================================================
    // In-transaction helpers
    // =========================================================================

    /// Reads the sale row only; `lines` is left empty.
    pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(sale)
    }

    /// Lines of a sale in their original order.
    pub async fn lines(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let sql = format!("SELECT {LINE_COLUMNS} FROM sale_lines WHERE sale_id = ?1 ORDER BY line_no");
        let lines = sqlx::query_as::<_, SaleLine>(&sql)
            .bind(sale_id)
            .fetch_all(conn)
            .await?;
        Ok(lines)
    }

    /// Writes the sale and all its lines.
    pub async fn insert(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, lines = sale.lines.len(), total_cents = sale.total_cents, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_id, actor_id, total_cents, status,
                created_at, cancelled_at, cancelled_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(&sale.actor_id)
        .bind(sale.total_cents)
        .bind(sale.status)
        .bind(sale.created_at)
        .bind(sale.cancelled_at)
        .bind(&sale.cancelled_by)
        .execute(&mut *conn)
        .await?;

        for line in &sale.lines {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    id, sale_id, line_no, product_id, product_name,
                    quantity, unit_price_cents, total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&line.id)
            .bind(&line.sale_id)
            .bind(line.line_no)
            .bind(&line.product_id)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.total_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Flips an active sale to cancelled.
    ///
    /// Returns the updated row (without lines), or `None` if the sale is
    /// missing or already cancelled.
    pub async fn mark_cancelled(
        conn: &mut SqliteConnection,
        id: &str,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<Option<Sale>> {
        debug!(id = %id, actor_id = %actor_id, "Cancelling sale");

        let sql = format!(
            r#"
            UPDATE sales
            SET status = 'cancelled', cancelled_at = ?2, cancelled_by = ?3
            WHERE id = ?1 AND status = 'active'
            RETURNING {SALE_COLUMNS}
            "#
        );

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .bind(at)
            .bind(actor_id)
            .fetch_optional(conn)
            .await?;

        Ok(sale)
    }
}
