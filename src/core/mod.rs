/// Append-only audit log
pub mod audit;
/// Employee registration and removal
pub mod employee;
/// Import reconciliation for invoices and spreadsheets
pub mod import;
/// Damage and loss reports
pub mod incident;
/// Loan state machine
pub mod loan;
/// Product catalog maintenance
pub mod product;
/// Dashboard counters
pub mod report;
/// Stock ledger
pub mod stock;
/// Full database reset
pub mod system;
