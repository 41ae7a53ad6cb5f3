//! Audit log - Append-only `system_logs` entries for every business mutation.
//!
//! Business operations write their entry on the same transaction as the change
//! they describe, through [`record_quietly`]: the insert runs inside a savepoint
//! and a failure is logged and swallowed, so a broken audit trail never blocks a
//! loan, return or import.

use crate::{
    entities::{SystemLog, system_log},
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde_json::Value as JsonValue;
use tracing::warn;

/// Module name for product catalog entries
pub const MODULE_PRODUCTS: &str = "products";
/// Module name for employee entries
pub const MODULE_EMPLOYEES: &str = "employees";
/// Module name for loan entries
pub const MODULE_LOANS: &str = "loans";
/// Module name for incident entries
pub const MODULE_INCIDENTS: &str = "incidents";
/// Module name for import entries
pub const MODULE_IMPORTS: &str = "imports";
/// Module name for system maintenance entries
pub const MODULE_SYSTEM: &str = "system";

/// A log entry waiting to be written.
#[derive(Debug, Clone)]
pub struct LogEntry {
    action: String,
    module: String,
    description: String,
    details: Option<JsonValue>,
}

impl LogEntry {
    /// Creates an entry without details.
    pub fn new(action: &str, module: &str, description: impl Into<String>) -> Self {
        Self {
            action: action.to_string(),
            module: module.to_string(),
            description: description.into(),
            details: None,
        }
    }

    /// Attaches a JSON payload describing the operation's inputs.
    #[must_use]
    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }
}

/// Inserts a log entry on the given connection or transaction.
pub async fn record<C>(db: &C, entry: LogEntry) -> Result<system_log::Model>
where
    C: ConnectionTrait,
{
    system_log::ActiveModel {
        action: Set(entry.action),
        module: Set(entry.module),
        description: Set(entry.description),
        details: Set(entry.details.map(|d| d.to_string())),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts a log entry inside a savepoint, logging and discarding any failure.
pub async fn record_quietly<C>(db: &C, entry: LogEntry)
where
    C: ConnectionTrait + TransactionTrait,
{
    let action = entry.action.clone();
    let result = async {
        let savepoint = db.begin().await?;
        record(&savepoint, entry).await?;
        savepoint.commit().await?;
        Ok::<(), crate::errors::Error>(())
    }
    .await;

    if let Err(e) = result {
        warn!("Failed to write audit entry for '{action}': {e}");
    }
}

/// Returns the newest entries first, at most `limit` of them.
pub async fn get_recent_entries(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<system_log::Model>> {
    SystemLog::find()
        .order_by_desc(system_log::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns every entry written by one module, newest first.
pub async fn get_entries_for_module(
    db: &DatabaseConnection,
    module: &str,
) -> Result<Vec<system_log::Model>> {
    SystemLog::find()
        .filter(system_log::Column::Module.eq(module))
        .order_by_desc(system_log::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;
    use serde_json::json;

    #[tokio::test]
    async fn test_record_and_read_back() -> Result<()> {
        let db = setup_test_db().await?;

        let entry = record(
            &db,
            LogEntry::new("create_product", MODULE_PRODUCTS, "Created HER-001")
                .with_details(json!({ "code": "HER-001" })),
        )
        .await?;

        assert_eq!(entry.action, "create_product");
        assert_eq!(entry.module, MODULE_PRODUCTS);
        let details: JsonValue = serde_json::from_str(entry.details.as_deref().unwrap()).unwrap();
        assert_eq!(details["code"], "HER-001");

        let recent = get_recent_entries(&db, 10).await?;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0], entry);

        Ok(())
    }

    #[tokio::test]
    async fn test_recent_entries_newest_first_and_limited() -> Result<()> {
        let db = setup_test_db().await?;

        for n in 0..5 {
            record(&db, LogEntry::new("noop", MODULE_SYSTEM, format!("entry {n}"))).await?;
        }

        let recent = get_recent_entries(&db, 3).await?;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].description, "entry 4");
        assert_eq!(recent[2].description, "entry 2");

        Ok(())
    }

    #[tokio::test]
    async fn test_record_quietly_inside_transaction() -> Result<()> {
        let db = setup_test_db().await?;

        let txn = db.begin().await?;
        record_quietly(&txn, LogEntry::new("noop", MODULE_LOANS, "inside")).await;
        txn.commit().await?;

        let entries = get_entries_for_module(&db, MODULE_LOANS).await?;
        assert_eq!(entries.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_quietly_swallows_failures() {
        // Mock connection with no prepared results: every statement fails.
        let db = sea_orm::MockDatabase::new(sea_orm::DatabaseBackend::Sqlite).into_connection();
        record_quietly(&db, LogEntry::new("noop", MODULE_SYSTEM, "lost")).await;
    }
}
