//! Employee entity - People who can borrow tools and consume supplies.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Employee database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name
    pub name: String,
    /// Badge number, e.g. `EMP-0007`
    #[sea_orm(unique)]
    pub employee_number: String,
    /// When the employee was registered
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Snapshot text stored on loans so they survive deletion of the employee.
    #[must_use]
    pub fn snapshot(&self) -> String {
        format!("{} - {}", self.employee_number, self.name)
    }
}

/// Defines relationships between Employee and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One employee has many loans
    #[sea_orm(has_many = "super::loan::Entity")]
    Loans,
    /// One employee has many incidents
    #[sea_orm(has_many = "super::incident::Entity")]
    Incidents,
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
