//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary
//! and applied when a [`Database`](crate::Database) opens, unless
//! `DbConfig::run_migrations(false)` says otherwise.
//!
//! ```text
//! 001_initial_schema.sql
//!   products, customers          stock / balance floors as named CHECKs
//!   sales, sale_lines            header + per-line price snapshot
//!   ledger_entries               append-only (UPDATE/DELETE triggers abort)
//!   restocks                     who added how much, when
//! ```
//!
//! Applied files are checksummed in `_sqlx_migrations`; edit history by
//! adding `NNN_description.sql`, never by changing a shipped file.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Tables the engine cannot work without.
const REQUIRED_TABLES: [&str; 6] = [
    "products",
    "customers",
    "sales",
    "sale_lines",
    "ledger_entries",
    "restocks",
];

/// How far the open database is behind the embedded migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let before = migration_status(pool).await?;
    if before.is_current() {
        debug!(applied = before.applied, "Schema up to date");
        return Ok(());
    }

    MIGRATOR.run(pool).await?;

    info!(
        from = before.applied,
        to = before.embedded,
        "Applied canteen schema migrations"
    );
    Ok(())
}

pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    let applied: i64 = if tracked == 0 {
        0
    } else {
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?
    };

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: usize::try_from(applied).unwrap_or(0),
    })
}

/// Names of required tables missing from the database, empty when the
/// schema is complete.
pub async fn missing_tables(pool: &SqlitePool) -> DbResult<Vec<&'static str>> {
    let present: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await?;

    Ok(REQUIRED_TABLES
        .into_iter()
        .filter(|t| !present.iter().any(|p| p == t))
        .collect())
}
