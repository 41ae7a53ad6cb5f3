//! Incident routes - Damage and loss reports.

use crate::{
    core::incident::{self, NewIncident},
    errors::Result,
    web::{
        AppState,
        forms::{Fields, FormInput, QueryInput},
        response::{created, ok},
    },
};
use axum::{Router, extract::State, response::Response, routing::get};

/// Routes under `/incidents`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_incidents).post(report_incident))
}

async fn list_incidents(State(state): State<AppState>, query: QueryInput) -> Result<Response> {
    let fields = Fields::from_query(query)?;
    let incidents = match fields.number::<i64>("product_id")? {
        Some(product_id) => incident::get_incidents_for_product(&state.db, product_id).await?,
        None => incident::get_incidents(&state.db).await?,
    };
    Ok(ok(incidents))
}

async fn report_incident(State(state): State<AppState>, form: FormInput) -> Result<Response> {
    let fields = Fields::from_form(form)?;
    let new = NewIncident {
        product_id: fields.required_number("product_id")?,
        employee_id: fields.number("employee_id")?,
        origin: fields.origin("origin")?,
        status: fields.incident_status("status")?,
        description: fields.text("description").unwrap_or_default().to_string(),
    };
    Ok(created(incident::report_incident(&state.db, new).await?))
}
