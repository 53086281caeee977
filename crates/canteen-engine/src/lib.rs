//! # canteen-engine: Sale Transaction Engine
//!
//! Turns "customer X buys these lines" into one atomic change of stock,
//! balance and ledger, and undoes it exactly on cancellation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Canteen POS Layers                               │
//! │                                                                         │
//! │  Caller (HTTP handler, CLI, tests) with an authenticated actor id      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                canteen-engine (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   SaleEngine          Catalog              Ledger               │   │
//! │  │   create_sale         products             history_for          │   │
//! │  │   cancel_sale         customers            entries_for_sale     │   │
//! │  │   restock_product     sales                reconcile            │   │
//! │  │   adjust_balance                                                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                               │                                 │
//! │       ▼                               ▼                                 │
//! │  canteen-core (rules, Money)     canteen-db (SQLite, reports)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use canteen_engine::{Canteen, EngineConfig};
//! use canteen_db::DbConfig;
//!
//! let pos = Canteen::open(DbConfig::from_env(), EngineConfig::from_env()?).await?;
//!
//! let sale = pos
//!     .sales()
//!     .create_sale(&alice.id, "till-1", &[SaleLineRequest::new(&soda.id, 2)])
//!     .await?;
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;

pub use catalog::Catalog;
pub use config::{ConfigError, EngineConfig};
pub use engine::SaleEngine;
pub use error::{EngineError, EngineResult};
pub use ledger::{Ledger, Reconciliation};

use canteen_db::{Database, DbConfig, ReportRepository};

/// Everything a caller needs, sharing one pool.
#[derive(Debug, Clone)]
pub struct Canteen {
    db: Database,
    engine: SaleEngine,
    catalog: Catalog,
    ledger: Ledger,
}

impl Canteen {
    pub async fn open(db_config: DbConfig, config: EngineConfig) -> EngineResult<Self> {
        let db = Database::new(db_config).await?;
        Ok(Self::with_database(db, config))
    }

    pub fn with_database(db: Database, config: EngineConfig) -> Self {
        Canteen {
            engine: SaleEngine::new(db.clone(), config.clone()),
            catalog: Catalog::new(db.clone(), config),
            ledger: Ledger::new(db.clone()),
            db,
        }
    }

    pub fn sales(&self) -> &SaleEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Read-only dashboard queries.
    pub fn reports(&self) -> ReportRepository {
        self.db.reports()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
