//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod employee;
pub mod incident;
pub mod loan;
pub mod product;
pub mod supplier_code;
pub mod system_log;

// Re-export specific types to avoid conflicts
pub use employee::{Column as EmployeeColumn, Entity as Employee, Model as EmployeeModel};
pub use incident::{
    Column as IncidentColumn, Entity as Incident, IncidentOrigin, IncidentStatus,
    Model as IncidentModel,
};
pub use loan::{Column as LoanColumn, Entity as Loan, LoanStatus, Model as LoanModel};
pub use product::{Category, Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use supplier_code::{
    Column as SupplierCodeColumn, Entity as SupplierCode, Model as SupplierCodeModel,
};
pub use system_log::{Column as SystemLogColumn, Entity as SystemLog, Model as SystemLogModel};
