//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  web-api startup                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ one connection (or transaction) per request                    │
//! │       ▼                                                                 │
//! │  POST /api/sales    ──► begin … commit on Conn1                        │
//! │  GET  /api/products ──► Conn2                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode lets readers proceed while a sale
//! or payment transaction is writing.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::account::AccountRepository;
use crate::repository::credit::CreditRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::session::SessionRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/shopbook/shopbook.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// How long a request waits for a free connection.
    /// Default: 30 seconds
    pub acquire_timeout: Duration,

    /// How long SQLite retries a locked database before failing a write.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps connections open.
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the lock wait used by writers.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Every `Database` built from it is an isolated, freshly migrated store.
    /// The single connection is never reaped, since closing it would drop
    /// the data.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    /// True for the `:memory:` configuration.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                // Readers don't block the sale / payment writer
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        // SQLite ships with foreign keys off
        Ok(options
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone: repositories share the pool.
///
/// ## Usage in Handlers
/// ```rust,ignore
/// async fn list_products(
///     State(state): State<Arc<AppState>>,
///     ctx: RequestContext,
/// ) -> Result<Json<Vec<Product>>, ApiError> {
///     let owner = ctx.owner_id()?;
///     Ok(Json(state.db.products().list_for_owner(owner).await?))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Enables WAL, NORMAL synchronous, foreign keys and a busy timeout
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    ///
    /// ## Arguments
    /// * `config` - Database configuration
    ///
    /// ## Returns
    /// * `Ok(Database)` - Ready-to-use database handle
    /// * `Err(DbError)` - Connection or migration failed
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = DbConfig::new("./shopbook.db");
    /// let db = Database::new(config).await?;
    /// ```
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_options = config.connect_options()?;
        debug!(in_memory = config.is_in_memory(), "Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations.
    ///
    /// ## What This Does
    /// - Applies all pending migrations in order
    /// - Tracks applied migrations in `_sqlx_migrations` table
    /// - Idempotent: safe to run multiple times
    ///
    /// ## When To Call
    /// - Automatically called by `new()` if `run_migrations` is true
    /// - Manually call when migrations are disabled in config
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// ## Usage
    /// For advanced queries not covered by repositories.
    /// Prefer using repository methods when available.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the account repository.
    pub fn accounts(&self) -> AccountRepository {
        AccountRepository::new(self.pool.clone())
    }

    /// Returns the session repository.
    pub fn sessions(&self) -> SessionRepository {
        SessionRepository::new(self.pool.clone())
    }

    /// Returns the product repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let products = db.products().list_for_owner(&admin.id).await?;
    /// ```
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the sale repository.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Returns the credit repository.
    pub fn credits(&self) -> CreditRepository {
        CreditRepository::new(self.pool.clone())
    }

    /// Returns `(total, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    /// Closes the database connection pool.
    ///
    /// ## When To Call
    /// - On application shutdown
    /// - When switching databases (rare)
    ///
    /// ## Note
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    ///
    /// ## Returns
    /// * `true` - Database is responsive
    /// * `false` - Database is unavailable
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
