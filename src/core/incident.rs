//! Incident business logic - Damage and loss reports.
//!
//! A `directo` report writes one unit off through the stock ledger. A
//! `prestamo` report closes the borrower's active loan as `devuelto_dañado` and
//! leaves stock alone, since the units already left inventory when the loan was
//! created. Either way the incident row, the stock or loan change and the audit
//! entry commit together.

use crate::{
    core::{
        audit::{self, LogEntry, MODULE_INCIDENTS},
        loan::{close_active_loan, find_active_loan},
        stock,
    },
    entities::{
        Employee, Incident, IncidentOrigin, IncidentStatus, LoanStatus, Product, incident,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// Units written off by a `directo` report.
const DIRECT_WRITE_OFF: i32 = 1;

/// Input for a damage or loss report.
#[derive(Debug, Clone, Deserialize)]
pub struct NewIncident {
    /// Affected product
    pub product_id: i64,
    /// Responsible employee; required for `prestamo`
    pub employee_id: Option<i64>,
    /// Where the damage happened
    pub origin: IncidentOrigin,
    /// Damaged or lost
    #[serde(default)]
    pub status: IncidentStatus,
    /// Operator's notes
    pub description: String,
}

/// Files a damage or loss report and applies its inventory effect.
///
/// # Errors
/// - [`Error::Validation`] for a `prestamo` report without employee, or when the
///   employee holds no active loan of the product
/// - [`Error::ProductNotFound`] / [`Error::EmployeeNotFound`]
/// - [`Error::InsufficientStock`] for a `directo` report on a product with no units
/// - [`Error::InvalidTransition`] if the loan was closed by a concurrent request
pub async fn report_incident(
    db: &DatabaseConnection,
    new: NewIncident,
) -> Result<incident::Model> {
    let description = new.description.trim().to_string();
    if new.origin == IncidentOrigin::Prestamo && new.employee_id.is_none() {
        return Err(Error::validation(
            "A damaged loan return needs the employee who had the loan",
        ));
    }

    let txn = db.begin().await?;

    if let Some(employee_id) = new.employee_id {
        Employee::find_by_id(employee_id)
            .one(&txn)
            .await?
            .ok_or(Error::EmployeeNotFound { id: employee_id })?;
    }

    let (quantity, loan_id) = match (new.origin, new.employee_id) {
        (IncidentOrigin::Prestamo, Some(employee_id)) => {
            close_damaged_loan(&txn, employee_id, new.product_id).await?
        }
        _ => {
            stock::decrement(&txn, new.product_id, DIRECT_WRITE_OFF).await?;
            (DIRECT_WRITE_OFF, None)
        }
    };

    let created = incident::ActiveModel {
        product_id: Set(new.product_id),
        employee_id: Set(new.employee_id),
        loan_id: Set(loan_id),
        origin: Set(new.origin),
        status: Set(new.status),
        quantity: Set(quantity),
        description: Set(description),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "report_incident",
            MODULE_INCIDENTS,
            format!(
                "Product {} x{} reported {} ({})",
                created.product_id, created.quantity, created.status, created.origin
            ),
        )
        .with_details(json!({
            "incident_id": created.id,
            "product_id": created.product_id,
            "employee_id": created.employee_id,
            "loan_id": created.loan_id,
            "origin": created.origin,
            "status": created.status,
        })),
    )
    .await;

    txn.commit().await?;
    info!(
        "Incident {} filed for product {} ({:?})",
        created.id, created.product_id, created.origin
    );
    Ok(created)
}

async fn close_damaged_loan(
    txn: &DatabaseTransaction,
    employee_id: i64,
    product_id: i64,
) -> Result<(i32, Option<i64>)> {
    Product::find_by_id(product_id)
        .one(txn)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            id: product_id.to_string(),
        })?;

    let active = find_active_loan(txn, employee_id, product_id)
        .await?
        .ok_or_else(|| {
            Error::validation(format!(
                "Employee {employee_id} has no active loan of product {product_id}"
            ))
        })?;

    let closed = close_active_loan(txn, &active, LoanStatus::DevueltoDanado).await?;
    Ok((closed.quantity, Some(closed.id)))
}

/// Retrieves all incidents, newest first.
pub async fn get_incidents(db: &DatabaseConnection) -> Result<Vec<incident::Model>> {
    Incident::find()
        .order_by_desc(incident::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the incidents filed against one product, newest first.
pub async fn get_incidents_for_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Vec<incident::Model>> {
    Incident::find()
        .filter(incident::Column::ProductId.eq(product_id))
        .order_by_desc(incident::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::loan::{get_loan_by_id, get_loans};
    use crate::entities::Category;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn report(product_id: i64, employee_id: Option<i64>, origin: IncidentOrigin) -> NewIncident {
        NewIncident {
            product_id,
            employee_id,
            origin,
            status: IncidentStatus::Danado,
            description: "Se rompió la broca".to_string(),
        }
    }

    async fn stock_of(db: &DatabaseConnection, product_id: i64) -> i32 {
        Product::find_by_id(product_id)
            .one(db)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    #[tokio::test]
    async fn test_prestamo_requires_employee() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = report_incident(&db, report(1, None, IncidentOrigin::Prestamo)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_directo_writes_off_one_unit() -> Result<()> {
        let (db, product, employee) = setup_with_product_and_employee(5).await?;
        let loan = create_test_loan(&db, product.id, employee.id, 2).await?;

        let incident = report_incident(&db, report(product.id, None, IncidentOrigin::Directo)).await?;
        assert_eq!(incident.quantity, 1);
        assert_eq!(incident.loan_id, None);
        assert_eq!(incident.status, IncidentStatus::Danado);
        assert_eq!(stock_of(&db, product.id).await, 2);

        let untouched = get_loan_by_id(&db, loan.id).await?.unwrap();
        assert_eq!(untouched.status, LoanStatus::Prestado);

        let logged = crate::core::audit::get_entries_for_module(&db, MODULE_INCIDENTS).await?;
        assert_eq!(
            logged[0].description,
            format!("Product {} x1 reported dañado (directo)", product.id)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_directo_on_empty_stock_fails() -> Result<()> {
        let (db, product, _) = setup_with_product_and_employee(0).await?;

        let result = report_incident(&db, report(product.id, None, IncidentOrigin::Directo)).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientStock { available: 0, .. })
        ));
        assert!(get_incidents(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_prestamo_closes_loan_without_restoring_stock() -> Result<()> {
        let (db, product, employee) = setup_with_product_and_employee(10).await?;
        let loan = create_test_loan(&db, product.id, employee.id, 3).await?;
        assert_eq!(stock_of(&db, product.id).await, 7);

        let incident = report_incident(
            &db,
            report(product.id, Some(employee.id), IncidentOrigin::Prestamo),
        )
        .await?;
        assert_eq!(incident.loan_id, Some(loan.id));
        assert_eq!(incident.quantity, 3);
        assert_eq!(stock_of(&db, product.id).await, 7);

        let closed = get_loan_by_id(&db, loan.id).await?.unwrap();
        assert_eq!(closed.status, LoanStatus::DevueltoDanado);
        assert!(closed.date_return.is_some());

        let result = crate::core::loan::return_loan(&db, loan.id).await;
        assert!(matches!(
            result,
            Err(Error::InvalidTransition {
                status: LoanStatus::DevueltoDanado,
                ..
            })
        ));
        assert_eq!(stock_of(&db, product.id).await, 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_prestamo_without_active_loan() -> Result<()> {
        let (db, product, employee) = setup_with_product_and_employee(10).await?;

        let result = report_incident(
            &db,
            report(product.id, Some(employee.id), IncidentOrigin::Prestamo),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(get_incidents(&db).await?.is_empty());
        assert_eq!(stock_of(&db, product.id).await, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_prestamo_ignores_consumed_loans() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "CON-001", Category::Consumible, 5).await?;
        let employee = create_test_employee(&db, "Ana López").await?;
        create_test_loan(&db, product.id, employee.id, 1).await?;

        let result = report_incident(
            &db,
            report(product.id, Some(employee.id), IncidentOrigin::Prestamo),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let loans = get_loans(&db, Some(LoanStatus::Consumido)).await?;
        assert_eq!(loans.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_employee_rejected() -> Result<()> {
        let (db, product, _) = setup_with_product_and_employee(3).await?;
        let result =
            report_incident(&db, report(product.id, Some(404), IncidentOrigin::Directo)).await;
        assert!(matches!(result, Err(Error::EmployeeNotFound { id: 404 })));
        assert_eq!(stock_of(&db, product.id).await, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_loss_report_and_queries() -> Result<()> {
        let (db, product, _) = setup_with_product_and_employee(3).await?;
        let other = create_test_product(&db, "HER-002", Category::Herramienta, 3).await?;

        let mut lost = report(product.id, None, IncidentOrigin::Directo);
        lost.status = IncidentStatus::Perdido;
        report_incident(&db, lost).await?;
        report_incident(&db, report(other.id, None, IncidentOrigin::Directo)).await?;

        assert_eq!(get_incidents(&db).await?.len(), 2);
        let for_product = get_incidents_for_product(&db, product.id).await?;
        assert_eq!(for_product.len(), 1);
        assert_eq!(for_product[0].status, IncidentStatus::Perdido);
        Ok(())
    }
}
