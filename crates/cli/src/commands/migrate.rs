//! Database migration command.
//!
//! ```bash
//! lb-cli migrate
//! ```
//!
//! Applies `crates/server/migrations/` to the database named by
//! `LEADBOOK_DATABASE_URL` (or `DATABASE_URL`).

use leadbook_server::config::database_url;
use leadbook_server::db::create_pool;

use super::CommandError;

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
