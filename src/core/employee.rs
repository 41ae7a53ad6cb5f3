//! Employee business logic - Registering, editing and removing borrowers.
//!
//! Employees are hard-deleted, unlike products. Their loans survive through the
//! `backup_employee` snapshot taken at loan creation, and deletion is refused
//! while the employee still holds a tool.

use crate::{
    core::audit::{self, LogEntry, MODULE_EMPLOYEES},
    entities::{Employee, Incident, Loan, LoanStatus, employee, incident, loan},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::info;

/// Retrieves all employees ordered by name.
pub async fn get_all_employees(db: &DatabaseConnection) -> Result<Vec<employee::Model>> {
    Employee::find()
        .order_by_asc(employee::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an employee by ID.
pub async fn get_employee_by_id(
    db: &DatabaseConnection,
    employee_id: i64,
) -> Result<Option<employee::Model>> {
    Employee::find_by_id(employee_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Registers an employee. A blank `employee_number` gets the next free
/// `EMP-0000` number.
///
/// # Errors
/// - [`Error::Validation`] for an empty name or an employee number already in use
pub async fn create_employee(
    db: &DatabaseConnection,
    name: String,
    employee_number: Option<String>,
) -> Result<employee::Model> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Employee name cannot be empty"));
    }
    let requested = employee_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let txn = db.begin().await?;

    let number = match requested {
        Some(number) => {
            ensure_number_available(&txn, &number, None).await?;
            number
        }
        None => next_employee_number(&txn).await?,
    };

    let created = employee::ActiveModel {
        name: Set(name),
        employee_number: Set(number),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "create_employee",
            MODULE_EMPLOYEES,
            format!("Registered {}", created.snapshot()),
        ),
    )
    .await;

    txn.commit().await?;
    info!("Created employee {}", created.employee_number);
    Ok(created)
}

/// Renames an employee or changes their number. Existing loans keep the
/// snapshot taken when they were created.
pub async fn update_employee(
    db: &DatabaseConnection,
    employee_id: i64,
    name: String,
    employee_number: String,
) -> Result<employee::Model> {
    let name = name.trim().to_string();
    let number = employee_number.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Employee name cannot be empty"));
    }
    if number.is_empty() {
        return Err(Error::validation("Employee number cannot be empty"));
    }

    let txn = db.begin().await?;

    let mut employee: employee::ActiveModel = Employee::find_by_id(employee_id)
        .one(&txn)
        .await?
        .ok_or(Error::EmployeeNotFound { id: employee_id })?
        .into();
    ensure_number_available(&txn, &number, Some(employee_id)).await?;

    employee.name = Set(name);
    employee.employee_number = Set(number);
    let updated = employee.update(&txn).await?;

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "update_employee",
            MODULE_EMPLOYEES,
            format!("Updated {}", updated.snapshot()),
        ),
    )
    .await;

    txn.commit().await?;
    Ok(updated)
}

/// Deletes an employee who holds no active loan.
///
/// Closed loans and incidents keep their snapshot text and lose the foreign key.
///
/// # Errors
/// - [`Error::EmployeeNotFound`] if the employee does not exist
/// - [`Error::EmployeeHasActiveLoans`] while any of their loans is `prestado`
pub async fn delete_employee(db: &DatabaseConnection, employee_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let employee = Employee::find_by_id(employee_id)
        .one(&txn)
        .await?
        .ok_or(Error::EmployeeNotFound { id: employee_id })?;

    let active_loans = Loan::find()
        .filter(loan::Column::EmployeeId.eq(employee_id))
        .filter(loan::Column::Status.eq(LoanStatus::Prestado))
        .count(&txn)
        .await?;
    if active_loans > 0 {
        return Err(Error::EmployeeHasActiveLoans {
            employee_id,
            active_loans,
        });
    }

    Loan::update_many()
        .col_expr(loan::Column::EmployeeId, Expr::value(Option::<i64>::None))
        .filter(loan::Column::EmployeeId.eq(employee_id))
        .exec(&txn)
        .await?;
    Incident::update_many()
        .col_expr(incident::Column::EmployeeId, Expr::value(Option::<i64>::None))
        .filter(incident::Column::EmployeeId.eq(employee_id))
        .exec(&txn)
        .await?;
    Employee::delete_by_id(employee_id).exec(&txn).await?;

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "delete_employee",
            MODULE_EMPLOYEES,
            format!("Deleted {}", employee.snapshot()),
        ),
    )
    .await;

    txn.commit().await?;
    info!("Deleted employee {}", employee.employee_number);
    Ok(())
}

/// Next free `EMP-0000` number, starting after the current head count.
pub(crate) async fn next_employee_number<C>(db: &C) -> Result<String>
where
    C: ConnectionTrait,
{
    let mut next = Employee::find().count(db).await? + 1;
    loop {
        let candidate = format!("EMP-{next:04}");
        let taken = Employee::find()
            .filter(employee::Column::EmployeeNumber.eq(candidate.as_str()))
            .one(db)
            .await?;
        if taken.is_none() {
            return Ok(candidate);
        }
        next += 1;
    }
}

async fn ensure_number_available<C>(db: &C, number: &str, except: Option<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    let holder = Employee::find()
        .filter(employee::Column::EmployeeNumber.eq(number))
        .one(db)
        .await?;

    match holder {
        Some(h) if Some(h.id) != except => Err(Error::validation(format!(
            "Employee number {number} is already assigned to {}",
            h.name
        ))),
        _ => Ok(()),
    }
}
