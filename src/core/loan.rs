//! Loan business logic - The loan state machine.
//!
//! ```text
//!            create (Consumible)
//!   ─────────────────────────────────▶ consumido
//!            create (other)
//!   ─────────────────────────────────▶ prestado ──return──▶ devuelto
//!                                         │
//!                                         └──damage report──▶ devuelto_dañado
//! ```
//!
//! Creation decrements stock exactly once. Only a return puts units back.
//! Every transition out of `prestado` is a compare-and-set update on the status
//! column, so a return racing another return or a damage report can only
//! succeed once; the loser sees [`Error::InvalidTransition`].

use crate::{
    core::{
        audit::{self, LogEntry, MODULE_LOANS},
        product::find_active,
        stock,
    },
    entities::{Category, Employee, Loan, LoanStatus, loan},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// Input for a new loan.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewLoan {
    /// Product leaving inventory
    pub product_id: i64,
    /// Borrower
    pub employee_id: i64,
    /// Units handed out
    pub quantity: i32,
}

/// Status a new loan starts in for a product of the given category.
#[must_use]
pub const fn initial_status(category: Category) -> LoanStatus {
    match category {
        Category::Consumible => LoanStatus::Consumido,
        Category::Herramienta | Category::Epp => LoanStatus::Prestado,
    }
}

/// Hands units of a product to an employee.
///
/// Stock is decremented on the same transaction as the loan insert. Consumables
/// are born `consumido` and can never transition again.
///
/// # Errors
/// - [`Error::Validation`] if `quantity` is below 1
/// - [`Error::EmployeeNotFound`] / [`Error::ProductNotFound`]
/// - [`Error::InsufficientStock`] carrying the available units
pub async fn create_loan(db: &DatabaseConnection, new: NewLoan) -> Result<loan::Model> {
    stock::validate_quantity(new.quantity)?;

    let txn = db.begin().await?;

    let employee = Employee::find_by_id(new.employee_id)
        .one(&txn)
        .await?
        .ok_or(Error::EmployeeNotFound {
            id: new.employee_id,
        })?;
    let product = find_active(&txn, new.product_id).await?;

    let after = stock::decrement(&txn, product.id, new.quantity).await?;
    let status = initial_status(product.category);

    let created = loan::ActiveModel {
        product_id: Set(product.id),
        employee_id: Set(Some(employee.id)),
        quantity: Set(new.quantity),
        status: Set(status),
        date_out: Set(Utc::now()),
        date_return: Set(None),
        backup_product: Set(product.snapshot()),
        backup_employee: Set(employee.snapshot()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "create_loan",
            MODULE_LOANS,
            format!(
                "{} x{} to {} ({status})",
                created.backup_product, created.quantity, created.backup_employee
            ),
        )
        .with_details(json!({
            "loan_id": created.id,
            "product_id": product.id,
            "employee_id": employee.id,
            "quantity": new.quantity,
            "status": status,
            "stock_after": after.stock,
        })),
    )
    .await;

    txn.commit().await?;
    info!(
        "Loan {} created: product {} x{} to employee {} ({status})",
        created.id, product.id, new.quantity, employee.id
    );
    Ok(created)
}

/// Returns a `prestado` loan in good condition and restores its stock.
///
/// # Errors
/// - [`Error::LoanNotFound`] if the loan does not exist
/// - [`Error::InvalidTransition`] unless the loan is `prestado`; stock is left untouched
pub async fn return_loan(db: &DatabaseConnection, loan_id: i64) -> Result<loan::Model> {
    let txn = db.begin().await?;

    let current = Loan::find_by_id(loan_id)
        .one(&txn)
        .await?
        .ok_or(Error::LoanNotFound { id: loan_id })?;

    let returned = close_active_loan(&txn, &current, LoanStatus::Devuelto).await?;
    let after = stock::increment(&txn, current.product_id, current.quantity).await?;

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "return_loan",
            MODULE_LOANS,
            format!(
                "{} x{} returned by {}",
                returned.backup_product, returned.quantity, returned.backup_employee
            ),
        )
        .with_details(json!({
            "loan_id": loan_id,
            "product_id": current.product_id,
            "quantity": current.quantity,
            "stock_after": after.stock,
        })),
    )
    .await;

    txn.commit().await?;
    info!("Loan {loan_id} returned, product {} back to {}", current.product_id, after.stock);
    Ok(returned)
}

/// Moves a `prestado` loan to a terminal status with `date_return = now`.
///
/// The update only matches while the stored status is still `prestado`; if it
/// matched nothing the loan was closed in the meantime (or never was open) and
/// the current stored status is reported.
pub(crate) async fn close_active_loan<C>(
    db: &C,
    current: &loan::Model,
    to: LoanStatus,
) -> Result<loan::Model>
where
    C: ConnectionTrait,
{
    let action = match to {
        LoanStatus::Devuelto => "returned",
        LoanStatus::DevueltoDanado => "closed as damaged",
        LoanStatus::Consumido => "consumed",
        LoanStatus::Prestado => "reopened",
    };

    if current.status != LoanStatus::Prestado || !to.is_terminal() {
        return Err(Error::InvalidTransition {
            loan_id: current.id,
            status: current.status,
            action,
        });
    }

    let result = Loan::update_many()
        .set(loan::ActiveModel {
            status: Set(to),
            date_return: Set(Some(Utc::now())),
            ..Default::default()
        })
        .filter(loan::Column::Id.eq(current.id))
        .filter(loan::Column::Status.eq(LoanStatus::Prestado))
        .exec(db)
        .await?;

    let stored = Loan::find_by_id(current.id)
        .one(db)
        .await?
        .ok_or(Error::LoanNotFound { id: current.id })?;

    if result.rows_affected == 0 {
        return Err(Error::InvalidTransition {
            loan_id: current.id,
            status: stored.status,
            action,
        });
    }

    Ok(stored)
}

/// Retrieves a loan by ID.
pub async fn get_loan_by_id(db: &DatabaseConnection, loan_id: i64) -> Result<Option<loan::Model>> {
    Loan::find_by_id(loan_id).one(db).await.map_err(Into::into)
}

/// Retrieves loans newest first, optionally only those in one status.
pub async fn get_loans(
    db: &DatabaseConnection,
    status: Option<LoanStatus>,
) -> Result<Vec<loan::Model>> {
    let mut query = Loan::find();
    if let Some(status) = status {
        query = query.filter(loan::Column::Status.eq(status));
    }
    query
        .order_by_desc(loan::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loans an employee still has to return.
pub async fn get_active_loans_for_employee(
    db: &DatabaseConnection,
    employee_id: i64,
) -> Result<Vec<loan::Model>> {
    Loan::find()
        .filter(loan::Column::EmployeeId.eq(employee_id))
        .filter(loan::Column::Status.eq(LoanStatus::Prestado))
        .order_by_asc(loan::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Oldest `prestado` loan of a product held by an employee.
pub(crate) async fn find_active_loan<C>(
    db: &C,
    employee_id: i64,
    product_id: i64,
) -> Result<Option<loan::Model>>
where
    C: ConnectionTrait,
{
    Loan::find()
        .filter(loan::Column::EmployeeId.eq(employee_id))
        .filter(loan::Column::ProductId.eq(product_id))
        .filter(loan::Column::Status.eq(LoanStatus::Prestado))
        .order_by_asc(loan::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}
