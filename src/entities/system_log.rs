//! System log entity - Append-only audit trail of business operations.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// System log database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_logs")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// What happened, e.g. `"create_loan"`
    pub action: String,
    /// Area of the application, e.g. `"loans"`
    pub module: String,
    /// Human-readable summary
    pub description: String,
    /// Optional JSON payload with the operation's inputs
    pub details: Option<String>,
    /// When the entry was written
    pub created_at: DateTimeUtc,
}

/// `SystemLog` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
