//! # Ledger Repository
//!
//! Append-only log of balance changes, keyed by customer.
//!
//! There is no update or delete here, and the schema's triggers reject
//! both. Corrections are new entries.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use canteen_core::{LedgerDirection, LedgerEntry};

const LEDGER_COLUMNS: &str = "id, customer_id, amount_cents, direction, reason, actor_id, \
     sale_id, balance_after_cents, created_at";

/// Σ credits and Σ debits for one customer, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::FromRow)]
pub struct LedgerTotals {
    pub credits_cents: i64,
    pub debits_cents: i64,
    pub entry_count: i64,
}

#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Entries for a customer, newest first.
    pub async fn history_for(&self, customer_id: &str) -> DbResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT {LEDGER_COLUMNS} FROM ledger_entries \
             WHERE customer_id = ?1 ORDER BY created_at DESC, rowid DESC"
        );
        let entries = sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(customer_id = %customer_id, count = entries.len(), "Loaded ledger history");
        Ok(entries)
    }

    /// Entries tagged with a sale: its debit, and its credit once cancelled.
    pub async fn entries_for_sale(&self, sale_id: &str) -> DbResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT {LEDGER_COLUMNS} FROM ledger_entries \
             WHERE sale_id = ?1 ORDER BY created_at, rowid"
        );
        let entries = sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    pub async fn totals_for(&self, customer_id: &str) -> DbResult<LedgerTotals> {
        let mut conn = self.pool.acquire().await?;
        Self::totals(&mut *conn, customer_id).await
    }

    // =========================================================================
    // In-transaction helpers
    // =========================================================================

    /// Appends an entry. Must run in the same transaction as the balance
    /// change it records.
    pub async fn append(conn: &mut SqliteConnection, entry: &LedgerEntry) -> DbResult<()> {
        debug!(
            id = %entry.id,
            customer_id = %entry.customer_id,
            direction = entry.direction.as_str(),
            amount_cents = entry.amount_cents,
            "Appending ledger entry"
        );

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                id, customer_id, amount_cents, direction, reason,
                actor_id, sale_id, balance_after_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.customer_id)
        .bind(entry.amount_cents)
        .bind(entry.direction)
        .bind(&entry.reason)
        .bind(&entry.actor_id)
        .bind(&entry.sale_id)
        .bind(entry.balance_after_cents)
        .bind(entry.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Sums for a customer, read through `conn` so they can share a
    /// snapshot with the customer row.
    pub async fn totals(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<LedgerTotals> {
        let totals = sqlx::query_as::<_, LedgerTotals>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN direction = 'credit' THEN amount_cents END), 0) AS credits_cents,
                COALESCE(SUM(CASE WHEN direction = 'debit' THEN amount_cents END), 0) AS debits_cents,
                COUNT(*) AS entry_count
            FROM ledger_entries
            WHERE customer_id = ?1
            "#,
        )
        .bind(customer_id)
        .fetch_one(conn)
        .await?;
        Ok(totals)
    }

    /// Debit entry for a sale, looked up inside the cancelling transaction.
    pub async fn sale_debit(
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Option<LedgerEntry>> {
        let sql = format!(
            "SELECT {LEDGER_COLUMNS} FROM ledger_entries WHERE sale_id = ?1 AND direction = ?2"
        );
        let entry = sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(sale_id)
            .bind(LedgerDirection::Debit)
            .fetch_optional(conn)
            .await?;
        Ok(entry)
    }
}
