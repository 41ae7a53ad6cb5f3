//! Loan entity - A product leaving inventory to an employee.
//!
//! Loans start `prestado` (tools, EPP) or `consumido` (consumables). Only a
//! `prestado` loan can move again: to `devuelto` on return, or to
//! `devuelto_dañado` when it comes back broken. The `backup_*` columns are
//! snapshots taken at creation so a loan stays readable after the employee is
//! deleted or the product is archived.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Loan lifecycle status
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum LoanStatus {
    /// Tool is out with the employee
    #[sea_orm(string_value = "prestado")]
    #[serde(rename = "prestado")]
    Prestado,
    /// Returned in good condition, stock restored
    #[sea_orm(string_value = "devuelto")]
    #[serde(rename = "devuelto")]
    Devuelto,
    /// Consumable handed out, never comes back
    #[sea_orm(string_value = "consumido")]
    #[serde(rename = "consumido")]
    Consumido,
    /// Returned broken, stock not restored
    #[sea_orm(string_value = "devuelto_dañado")]
    #[serde(rename = "devuelto_dañado")]
    DevueltoDanado,
}

impl LoanStatus {
    /// Stored value of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prestado => "prestado",
            Self::Devuelto => "devuelto",
            Self::Consumido => "consumido",
            Self::DevueltoDanado => "devuelto_dañado",
        }
    }

    /// Parses a stored or submitted status value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "prestado" => Some(Self::Prestado),
            "devuelto" => Some(Self::Devuelto),
            "consumido" => Some(Self::Consumido),
            "devuelto_dañado" | "devuelto_danado" => Some(Self::DevueltoDanado),
            _ => None,
        }
    }

    /// Terminal statuses never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Prestado)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loan database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product that left inventory
    pub product_id: i64,
    /// Borrower; cleared when the employee is deleted
    pub employee_id: Option<i64>,
    /// Units handed out
    pub quantity: i32,
    /// Lifecycle status
    pub status: LoanStatus,
    /// When the loan was created
    pub date_out: DateTimeUtc,
    /// When the loan was closed by a return or damage report
    pub date_return: Option<DateTimeUtc>,
    /// `"{code} - {description}"` at creation time
    pub backup_product: String,
    /// `"{employee_number} - {name}"` at creation time
    pub backup_employee: String,
}

/// Defines relationships between Loan and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each loan references one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Each loan references at most one employee
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id",
        on_delete = "SetNull"
    )]
    Employee,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
