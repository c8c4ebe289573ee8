//! # Database Migrations
//!
//! Embedded SQL migrations for Shopbook.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Server startup                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs _sqlx_migrations                       │
//! │       │                                                                 │
//! │       ├── 001_initial_schema.sql ✓ (already applied)                  │
//! │       └── 002_...                ⬜ (pending, runs now)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Bootstrap super-admin, start serving                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. **NEVER** modify an applied migration, its checksum is recorded

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations embedded from `migrations/sqlite` at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations, each in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(
        embedded = MIGRATOR.migrations.len(),
        "Checking for pending migrations"
    );

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)` for the health endpoint.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // The bookkeeping table is absent until the first run
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    Ok((total, applied as usize))
}
