//! Loan routes - Lending, listing and returns.

use crate::{
    core::loan::{self, NewLoan},
    errors::Result,
    web::{
        AppState,
        forms::{Fields, FormInput, QueryInput, parse_id},
        response::{created, ok},
    },
};
use axum::{
    Router,
    extract::{Path, State},
    response::Response,
    routing::{get, post},
};

/// Routes under `/loans`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_loans).post(create_loan))
        .route("/:id/return", post(return_loan))
}

async fn list_loans(State(state): State<AppState>, query: QueryInput) -> Result<Response> {
    let status = Fields::from_query(query)?.loan_status("status")?;
    Ok(ok(loan::get_loans(&state.db, status).await?))
}

async fn create_loan(State(state): State<AppState>, form: FormInput) -> Result<Response> {
    let fields = Fields::from_form(form)?;
    let new = NewLoan {
        product_id: fields.required_number("product_id")?,
        employee_id: fields.required_number("employee_id")?,
        quantity: fields.required_number("quantity")?,
    };
    Ok(created(loan::create_loan(&state.db, new).await?))
}

async fn return_loan(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let id = parse_id(&id)?;
    Ok(ok(loan::return_loan(&state.db, id).await?))
}
