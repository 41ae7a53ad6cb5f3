//! Inventory summary business logic.
//!
//! This module computes the dashboard counters and stock levels shown by the
//! admin panel. All functions are framework-agnostic and return structured data
//! that the web layer serializes as-is.

use crate::{
    core::product::get_all_active_products,
    entities::{Employee, Incident, Loan, LoanStatus, loan, product},
    errors::Result,
};
use sea_orm::{DatabaseConnection, PaginatorTrait, prelude::*};
use serde::Serialize;

/// Stock level of a single product relative to its reorder threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    /// Above the threshold
    Ok,
    /// At or below the threshold but not empty
    Low,
    /// No units on hand
    Out,
}

/// Dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventorySummary {
    /// Active (non-archived) products
    pub total_products: u64,
    /// Units on hand across active products
    pub units_in_stock: i64,
    /// Active products at or below their threshold
    pub low_stock_products: u64,
    /// Active products with no units
    pub out_of_stock_products: u64,
    /// Loans still `prestado`
    pub active_loans: u64,
    /// Registered employees
    pub employees: u64,
    /// Damage and loss reports filed
    pub incidents: u64,
}

/// Classifies a product's stock.
#[must_use]
pub const fn stock_level(product: &product::Model) -> StockLevel {
    if product.stock <= 0 {
        StockLevel::Out
    } else if product.is_low_stock() {
        StockLevel::Low
    } else {
        StockLevel::Ok
    }
}

/// Generates the dashboard summary.
pub async fn generate_inventory_summary(db: &DatabaseConnection) -> Result<InventorySummary> {
    let products = get_all_active_products(db).await?;

    let mut summary = InventorySummary {
        total_products: products.len() as u64,
        ..Default::default()
    };
    for product in &products {
        summary.units_in_stock += i64::from(product.stock);
        match stock_level(product) {
            StockLevel::Out => {
                summary.out_of_stock_products += 1;
                summary.low_stock_products += 1;
            }
            StockLevel::Low => summary.low_stock_products += 1,
            StockLevel::Ok => {}
        }
    }

    summary.active_loans = Loan::find()
        .filter(loan::Column::Status.eq(LoanStatus::Prestado))
        .count(db)
        .await?;
    summary.employees = Employee::find().count(db).await?;
    summary.incidents = Incident::find().count(db).await?;

    Ok(summary)
}
