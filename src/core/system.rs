//! System maintenance - Full reset of the inventory database.

use crate::{
    core::audit::{self, LogEntry, MODULE_SYSTEM},
    entities::{Employee, Incident, Loan, Product, SupplierCode, SystemLog},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use serde::Serialize;
use tracing::warn;

/// Word the operator must type to confirm a wipe.
pub const WIPE_CONFIRMATION: &str = "BORRAR";

/// Rows removed by a wipe, per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WipeReport {
    /// Incident rows removed
    pub incidents: u64,
    /// Loan rows removed
    pub loans: u64,
    /// Supplier alias rows removed
    pub supplier_codes: u64,
    /// Product rows removed
    pub products: u64,
    /// Employee rows removed
    pub employees: u64,
    /// Audit rows removed
    pub system_logs: u64,
}

/// Deletes every row of every table, children first, in one transaction.
///
/// The audit log is cleared too; a single `wipe` entry describing the reset is
/// written afterwards so the log never starts out empty.
///
/// # Errors
/// Returns [`Error::Validation`] unless `confirmation` is exactly [`WIPE_CONFIRMATION`].
pub async fn wipe_all(db: &DatabaseConnection, confirmation: &str) -> Result<WipeReport> {
    if confirmation.trim() != WIPE_CONFIRMATION {
        return Err(Error::validation(format!(
            "Type {WIPE_CONFIRMATION} to confirm the wipe"
        )));
    }

    let txn = db.begin().await?;

    let report = WipeReport {
        incidents: Incident::delete_many().exec(&txn).await?.rows_affected,
        loans: Loan::delete_many().exec(&txn).await?.rows_affected,
        supplier_codes: SupplierCode::delete_many().exec(&txn).await?.rows_affected,
        products: Product::delete_many().exec(&txn).await?.rows_affected,
        employees: Employee::delete_many().exec(&txn).await?.rows_affected,
        system_logs: SystemLog::delete_many().exec(&txn).await?.rows_affected,
    };

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "wipe",
            MODULE_SYSTEM,
            format!(
                "Wiped {} product(s), {} employee(s), {} loan(s)",
                report.products, report.employees, report.loans
            ),
        ),
    )
    .await;

    txn.commit().await?;
    warn!("System wipe completed: {report:?}");
    Ok(report)
}
