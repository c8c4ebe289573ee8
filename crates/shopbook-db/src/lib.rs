//! # shopbook-db: Database Layer for Shopbook
//!
//! SQLite persistence for accounts, sessions, products, sales and credits,
//! using sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopbook Data Flow                               │
//! │                                                                         │
//! │  web-api service (record_sale)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   shopbook-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ AccountRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SessionRepo   │    │ 001_init.sql │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │               │    │ SaleRepo      │    │              │  │   │
//! │  │   │               │    │ CreditRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   Business decisions come from shopbook-core; repositories     │   │
//! │  │   only scope, persist and keep each mutation in one transaction│   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopbook_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("shopbook.db")).await?;
//! let products = db.products().list_for_owner(&admin.id).await?;
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
pub use pool::{Database, DbConfig};

pub use repository::account::{AccountRepository, AccountUpdate, OwnedData};
pub use repository::credit::CreditRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleRepository, SaleScope};
pub use repository::session::{Session, SessionRepository};
