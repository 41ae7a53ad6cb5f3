//! Shared test utilities for `ToolCrib`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults. Every helper goes through
//! the core operations, so stock and audit rows are written the normal way.

use crate::{
    core::{
        employee,
        loan::{self, NewLoan},
        product::{self, NewProduct},
    },
    entities::{self, Category},
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test product with sensible defaults.
///
/// # Defaults
/// * `description`: `"Test product {code}"`
/// * `short_code`: empty
/// * `min_stock`: 2
pub async fn create_test_product(
    db: &DatabaseConnection,
    code: &str,
    category: Category,
    stock: i32,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        NewProduct {
            code: Some(code.to_string()),
            short_code: String::new(),
            description: format!("Test product {code}"),
            category,
            stock,
            min_stock: 2,
        },
    )
    .await
}

/// Creates a test employee with a generated employee number.
pub async fn create_test_employee(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::employee::Model> {
    employee::create_employee(db, name.to_string(), None).await
}

/// Creates a loan through the state machine.
pub async fn create_test_loan(
    db: &DatabaseConnection,
    product_id: i64,
    employee_id: i64,
    quantity: i32,
) -> Result<entities::loan::Model> {
    loan::create_loan(
        db,
        NewLoan {
            product_id,
            employee_id,
            quantity,
        },
    )
    .await
}

/// Sets up a complete test environment with a tool and a borrower.
/// Returns (db, `HER-001` product, employee) for loan-related tests.
pub async fn setup_with_product_and_employee(
    stock: i32,
) -> Result<(
    DatabaseConnection,
    entities::product::Model,
    entities::employee::Model,
)> {
    let db = setup_test_db().await?;
    let product = create_test_product(&db, "HER-001", Category::Herramienta, stock).await?;
    let employee = create_test_employee(&db, "Juan Pérez").await?;
    Ok((db, product, employee))
}
