//! Supplier code entity - Alternate vendor identifiers for a product.
//!
//! Rows are discovered while importing invoices: every provider may label the
//! same product differently, and each alias is kept with the provider name.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supplier code database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supplier_codes")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product this alias belongs to
    pub product_id: i64,
    /// The vendor's code for the product
    pub code: String,
    /// Issuer name taken from the invoice header
    pub provider: String,
    /// When the alias was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `SupplierCode` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each supplier code belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
