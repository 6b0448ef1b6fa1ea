//! CSV import command.
//!
//! ```bash
//! lb-cli import leads.csv --owner agent-7
//! ```
//!
//! Uses the same validation and all-or-nothing transaction as `POST /api/buyers/import`.

use std::path::Path;

use leadbook_core::import::ImportError;
use leadbook_server::config::database_url;
use leadbook_server::db::{PgBuyerStore, create_pool};
use leadbook_server::error::AppError;
use leadbook_server::services::BuyerService;

use super::CommandError;

/// Import a CSV file, attributing the buyers to `owner_id`.
///
/// Returns the number of buyers created.
pub async fn run(path: &Path, owner_id: &str) -> Result<usize, CommandError> {
    let text = std::fs::read_to_string(path).map_err(|source| CommandError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let pool = create_pool(&database_url()?).await?;
    let store = PgBuyerStore::new(pool);

    match BuyerService::new(&store).import_csv(&text, owner_id).await {
        Ok(created) => {
            tracing::info!(created, file = %path.display(), "Import complete");
            Ok(created)
        }
        Err(AppError::Import(ImportError::InvalidRows(rows))) => {
            for row in &rows {
                for issue in &row.issues {
                    tracing::error!(row = row.row, field = %issue.field, "{}", issue.message);
                }
            }
            Err(AppError::Import(ImportError::InvalidRows(rows)).into())
        }
        Err(e) => Err(e.into()),
    }
}
