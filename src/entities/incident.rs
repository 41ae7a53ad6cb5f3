//! Incident entity - Damage and loss reports.
//!
//! An incident either happens in storage (`directo`, one unit written off) or
//! closes a loan that came back broken (`prestamo`). Incidents never restore stock.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the damaged unit was when the incident happened
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum IncidentOrigin {
    /// Damaged in storage, never loaned
    #[sea_orm(string_value = "directo")]
    #[serde(rename = "directo")]
    Directo,
    /// Returned broken by the borrower
    #[sea_orm(string_value = "prestamo")]
    #[serde(rename = "prestamo")]
    Prestamo,
}

impl IncidentOrigin {
    /// Stored value of the origin.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directo => "directo",
            Self::Prestamo => "prestamo",
        }
    }

    /// Parses a submitted origin value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "directo" => Some(Self::Directo),
            "prestamo" | "préstamo" => Some(Self::Prestamo),
            _ => None,
        }
    }
}

/// What happened to the unit
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum IncidentStatus {
    /// Broken
    #[default]
    #[sea_orm(string_value = "dañado")]
    #[serde(rename = "dañado")]
    Danado,
    /// Lost
    #[sea_orm(string_value = "perdido")]
    #[serde(rename = "perdido")]
    Perdido,
}

impl fmt::Display for IncidentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IncidentStatus {
    /// Stored value of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Danado => "dañado",
            Self::Perdido => "perdido",
        }
    }

    /// Parses a submitted status value; blank means damaged.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "dañado" | "danado" => Some(Self::Danado),
            "perdido" => Some(Self::Perdido),
            _ => None,
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incident database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incidents")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Damaged product
    pub product_id: i64,
    /// Responsible employee, if any
    pub employee_id: Option<i64>,
    /// Loan closed by this report (`prestamo` only)
    pub loan_id: Option<i64>,
    /// Where the damage happened
    pub origin: IncidentOrigin,
    /// Damaged or lost
    pub status: IncidentStatus,
    /// Units affected
    pub quantity: i32,
    /// Operator's notes
    pub description: String,
    /// When the report was filed
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Incident and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each incident references one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Each incident references at most one employee
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id",
        on_delete = "SetNull"
    )]
    Employee,
    /// A `prestamo` incident references the loan it closed
    #[sea_orm(
        belongs_to = "super::loan::Entity",
        from = "Column::LoanId",
        to = "super::loan::Column::Id"
    )]
    Loan,
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

impl Related<super::loan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
