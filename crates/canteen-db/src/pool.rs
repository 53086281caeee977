//! # Store Handle
//!
//! [`DbConfig`] says where the canteen database lives and how patient a
//! writer is; [`Database`] owns the pool and hands out repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new("canteen.db") │ DbConfig::in_memory() │ from_env()      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new ── open pool ── apply migrations (or verify tables)     │
//! │       │                                                                 │
//! │       ├── db.products() / customers() / sales() / ledger() / ...       │
//! │       │      reads on the pool, any number at once (WAL)               │
//! │       │                                                                 │
//! │       └── db.begin() ──► Transaction                                   │
//! │              guarded UPDATE first: takes the single writer lock,       │
//! │              other writers queue for up to busy_timeout, then Busy     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! In-memory stores live on one connection. While a transaction holds it,
//! nothing else can use the pool, so code under test must finish or drop
//! its transaction before the next pool read.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::customer::CustomerRepository;
use crate::repository::ledger::LedgerRepository;
use crate::repository::product::ProductRepository;
use crate::repository::report::ReportRepository;
use crate::repository::restock::RestockRepository;
use crate::repository::sale::SaleRepository;

const IN_MEMORY: &str = ":memory:";
const DEFAULT_PATH: &str = "./canteen.db";

// =============================================================================
// Configuration
// =============================================================================

/// Where the store lives and how the pool behaves.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/canteen/canteen.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, or `:memory:`.
    pub path: PathBuf,

    /// Default 5. Only one of them writes at a time.
    pub max_connections: u32,

    /// Default 1.
    pub min_connections: u32,

    /// Wait for a free pooled connection. Default 30s.
    pub acquire_timeout: Duration,

    /// Default 10 minutes. Ignored for in-memory stores.
    pub idle_timeout: Duration,

    /// Wait for the write lock before failing with `DbError::Busy`.
    /// Default 5s.
    pub busy_timeout: Duration,

    /// Default true. When false the schema must already be complete.
    pub run_migrations: bool,
}

impl DbConfig {
    /// A file-backed store, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(10 * 60),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// A throwaway store on a single connection that never expires.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..DbConfig::new(IN_MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// | Variable                      | Default        |
    /// |-------------------------------|----------------|
    /// | `CANTEEN_DB_PATH`             | `./canteen.db` |
    /// | `CANTEEN_DB_MAX_CONNECTIONS`  | `5`            |
    /// | `CANTEEN_DB_BUSY_TIMEOUT_MS`  | `5000`         |
    ///
    /// Unparsable numbers keep the default and log a warning.
    pub fn from_env() -> Self {
        let path = std::env::var("CANTEEN_DB_PATH").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = if path == IN_MEMORY {
            DbConfig::in_memory()
        } else {
            DbConfig::new(path)
        };

        if let Some(max) = env_number::<u32>("CANTEEN_DB_MAX_CONNECTIONS") {
            if !config.is_in_memory() {
                config.max_connections = max.max(1);
            }
        }
        if let Some(ms) = env_number::<u64>("CANTEEN_DB_BUSY_TIMEOUT_MS") {
            config.busy_timeout = Duration::from_millis(ms);
        }

        config
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::Connection(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                // a power cut may lose the last commit, never corrupt
                .synchronous(SqliteSynchronous::Normal)
        };

        Ok(options.foreign_keys(true).busy_timeout(self.busy_timeout))
    }
}

fn env_number<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable setting");
            None
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared store handle. Clones share one pool.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::in_memory()).await?;
/// let soda = db.products().get_by_id(&id).await?;
///
/// let mut tx = db.begin().await?;
/// ProductRepository::deduct_stock(&mut *tx, &id, 2).await?;
/// tx.commit().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        debug!(path = %config.path.display(), "Opening canteen store");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout);

        pool_options = if config.is_in_memory() {
            // the data goes away with the last connection
            pool_options.idle_timeout(None).max_lifetime(None)
        } else {
            pool_options.idle_timeout(Some(config.idle_timeout))
        };

        let pool = pool_options
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        } else {
            let missing = migrations::missing_tables(&db.pool).await?;
            if !missing.is_empty() {
                return Err(DbError::Migration(format!(
                    "migrations disabled and schema incomplete, missing {}",
                    missing.join(", ")
                )));
            }
        }

        info!(
            path = %config.path.display(),
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Canteen store ready"
        );
        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Starts an atomic batch.
    ///
    /// Dropping the transaction without `commit` rolls everything back.
    /// The first statement run inside should be a write so the write lock
    /// is taken before anything is read.
    ///
    /// SQLite locks the whole database for writing, not single rows. Two
    /// sales of unrelated products to unrelated customers still run one
    /// after the other; the second waits up to `busy_timeout` and then
    /// fails with [`DbError::Busy`]. Keep the work between `begin` and
    /// `commit` short. Reads on other connections carry on meanwhile (WAL).
    pub async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::Internal(msg) => DbError::Transaction(msg),
                other => other,
            })
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    pub fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new(self.pool.clone())
    }

    pub fn restocks(&self) -> RestockRepository {
        RestockRepository::new(self.pool.clone())
    }

    /// Read-only dashboard aggregates.
    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections, then closes the pool.
    pub async fn close(&self) {
        debug!("Closing canteen store");
        self.pool.close().await;
    }

    /// True if a trivial statement runs.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
