//! # Database Migrations
//!
//! Embedded SQL migrations for both backends.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Startup                                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table (create if missing)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs applied                                 │
//! │       │                                                                 │
//! │       └── 001_initial_schema.sql ✓ / ⬜                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record checksums                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Add the next `NNN_description.sql` to BOTH `migrations/sqlite/` and
//!    `migrations/postgres/`
//! 2. **NEVER** modify existing migrations - always add new ones

use sqlx::{PgPool, SqlitePool};
use tracing::info;

use crate::error::DbResult;

/// Migrations from `migrations/sqlite`, embedded at compile time.
static SQLITE_MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Migrations from `migrations/postgres`, embedded at compile time.
static POSTGRES_MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/postgres");

/// Runs all pending migrations against the embedded store.
///
/// Idempotent; each migration runs in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(backend = "sqlite", "Checking for pending migrations");
    SQLITE_MIGRATOR.run(pool).await?;
    info!(backend = "sqlite", "All migrations applied successfully");
    Ok(())
}

/// Runs all pending migrations against the hosted store.
pub async fn run_postgres_migrations(pool: &PgPool) -> DbResult<()> {
    info!(backend = "postgres", "Checking for pending migrations");
    POSTGRES_MIGRATOR.run(pool).await?;
    info!(backend = "postgres", "All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)` for the embedded store.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = SQLITE_MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_all_migrations_applied_on_connect() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert!(total >= 1);
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        run_migrations(db.pool()).await.unwrap();
        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }
}
