//! Employee routes.

use crate::{
    core::employee,
    errors::Result,
    web::{
        AppState,
        forms::{Fields, FormInput, parse_id},
        response::{created, ok},
    },
};
use axum::{
    Router,
    extract::{Path, State},
    response::Response,
    routing::{get, post},
};
use serde_json::json;

/// Routes under `/employees`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route("/:id", post(update_employee))
        .route("/:id/delete", post(delete_employee))
}

async fn list_employees(State(state): State<AppState>) -> Result<Response> {
    Ok(ok(employee::get_all_employees(&state.db).await?))
}

async fn create_employee(State(state): State<AppState>, form: FormInput) -> Result<Response> {
    let fields = Fields::from_form(form)?;
    let name = fields.required("name")?.to_string();
    let number = fields.text("employee_number").map(str::to_string);
    Ok(created(employee::create_employee(&state.db, name, number).await?))
}

async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: FormInput,
) -> Result<Response> {
    let id = parse_id(&id)?;
    let fields = Fields::from_form(form)?;
    let name = fields.required("name")?.to_string();
    let number = fields.required("employee_number")?.to_string();
    Ok(ok(employee::update_employee(&state.db, id, name, number).await?))
}

async fn delete_employee(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let id = parse_id(&id)?;
    employee::delete_employee(&state.db, id).await?;
    Ok(ok(json!({ "id": id })))
}
