//! Product entity - Represents an inventory item identified by a canonical QR code.
//!
//! Products carry the authoritative `stock` count. Stock is only ever written by
//! the stock ledger, next to the movement record that explains the change.
//! Products are archived instead of deleted so loan history keeps its references.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Product category. Consumables are never returned once loaned.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Category {
    /// Returnable tools
    #[default]
    #[sea_orm(string_value = "Herramienta")]
    Herramienta,
    /// Consumables; loans are born `consumido`
    #[sea_orm(string_value = "Consumible")]
    Consumible,
    /// Personal protective equipment
    #[sea_orm(string_value = "EPP")]
    #[serde(rename = "EPP")]
    Epp,
}

impl Category {
    /// Parses a free-text label (form field, spreadsheet cell) case-insensitively.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "herramienta" | "herramientas" => Some(Self::Herramienta),
            "consumible" | "consumibles" => Some(Self::Consumible),
            "epp" => Some(Self::Epp),
            _ => None,
        }
    }

    /// Prefix used when a code has to be generated for a product of this category.
    #[must_use]
    pub const fn code_prefix(self) -> &'static str {
        match self {
            Self::Herramienta => "HER",
            Self::Consumible => "CON",
            Self::Epp => "EPP",
        }
    }

    /// Human-readable label, identical to the stored value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Herramienta => "Herramienta",
            Self::Consumible => "Consumible",
            Self::Epp => "EPP",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Canonical code printed on the QR label
    #[sea_orm(unique)]
    pub code: String,
    /// Supplier aliases for display, joined with `" / "`
    pub short_code: String,
    /// What the product is
    pub description: String,
    /// Product category
    pub category: Category,
    /// Units on hand, never negative
    pub stock: i32,
    /// Reorder threshold
    pub min_stock: i32,
    /// Soft delete flag - archived products are hidden but keep their history
    pub is_archived: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Snapshot text stored on loans so they survive later edits or archival.
    #[must_use]
    pub fn snapshot(&self) -> String {
        format!("{} - {}", self.code, self.description)
    }

    /// Whether the product is at or below its reorder threshold.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product has many supplier codes
    #[sea_orm(has_many = "super::supplier_code::Entity")]
    SupplierCodes,
    /// One product has many loans
    #[sea_orm(has_many = "super::loan::Entity")]
    Loans,
    /// One product has many incidents
    #[sea_orm(has_many = "super::incident::Entity")]
    Incidents,
}

impl Related<super::supplier_code::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierCodes.def()
    }
}

impl Related<super::loan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loans.def()
    }
}

impl Related<super::incident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incidents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
