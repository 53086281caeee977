//! # canteen-db: Storage Layer for the Canteen POS
//!
//! SQLite persistence for products, customers, sales, the balance ledger
//! and the restock audit trail, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Canteen POS Data Flow                            │
//! │                                                                         │
//! │  SaleEngine / Catalog / Ledger (canteen-engine)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   canteen-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CustomerRepo  │    │ 001_initial  │  │   │
//! │  │   │ WAL, busy     │    │ SaleRepo      │    │   _schema    │  │   │
//! │  │   │ timeout, FKs  │    │ LedgerRepo    │    │              │  │   │
//! │  │   │               │    │ RestockRepo   │    │              │  │   │
//! │  │   │               │    │ ReportRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   $CANTEEN_DB_PATH (default ./canteen.db)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`]: `DbConfig`, `Database`, transactions
//! - [`migrations`]: embedded schema, status and table check
//! - [`error`]: `DbError` and SQLite message classification
//! - [`repository`]: one repository per table, plus reports
//!
//! ## Usage
//!
//! ```rust,ignore
//! use canteen_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("canteen.db")).await?;
//!
//! let soda = db.products().get_by_id(&id).await?;
//! let today = db.reports().daily_summary(Utc::now().date_naive()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

pub use repository::customer::CustomerRepository;
pub use repository::generate_id;
pub use repository::ledger::{LedgerRepository, LedgerTotals};
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::restock::RestockRepository;
pub use repository::sale::SaleRepository;
