//! # Database Migrations
//!
//! Embedded SQL migrations for the order store.
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence
//!    number, named `NNN_description.sql`
//! 2. Write idempotent SQL (use `IF NOT EXISTS` where possible)
//! 3. NEVER modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/sqlite` directory.
///
/// The `sqlx::migrate!()` macro embeds all SQL files from the directory
/// into the binary at compile time. No runtime file access needed.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// - Creates the `_sqlx_migrations` bookkeeping table if needed
/// - Applies pending migrations in filename order, each in a transaction
/// - Idempotent: safe to run multiple times
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Applying pending order-store migrations");

    MIGRATOR.run(pool).await?;

    info!("Order store schema is current");
    Ok(())
}

/// Returns (total_migrations, applied_migrations), for diagnostics and
/// health checks.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
