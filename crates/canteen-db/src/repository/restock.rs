//! # Restock Repository
//!
//! Audit trail of stock added to products. Not a balance ledger.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use canteen_core::Restock;

const RESTOCK_COLUMNS: &str = "id, product_id, actor_id, quantity, stock_after, created_at";

#[derive(Debug, Clone)]
pub struct RestockRepository {
    pool: SqlitePool,
}

impl RestockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RestockRepository { pool }
    }

    /// Restocks of a product, newest first.
    pub async fn history_for(&self, product_id: &str) -> DbResult<Vec<Restock>> {
        let sql = format!(
            "SELECT {RESTOCK_COLUMNS} FROM restocks \
             WHERE product_id = ?1 ORDER BY created_at DESC, rowid DESC"
        );
        let restocks = sqlx::query_as::<_, Restock>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(restocks)
    }

    pub async fn insert(conn: &mut SqliteConnection, restock: &Restock) -> DbResult<()> {
        debug!(
            product_id = %restock.product_id,
            quantity = restock.quantity,
            stock_after = restock.stock_after,
            "Recording restock"
        );

        sqlx::query(
            r#"
            INSERT INTO restocks (id, product_id, actor_id, quantity, stock_after, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&restock.id)
        .bind(&restock.product_id)
        .bind(&restock.actor_id)
        .bind(restock.quantity)
        .bind(restock.stock_after)
        .bind(restock.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }
}
