//! Health check, dashboard, audit log and full wipe.

use crate::{
    core::{audit, report, system},
    errors::Result,
    web::{
        AppState,
        forms::{Fields, FormInput, QueryInput},
        response::ok,
    },
};
use axum::{extract::State, response::Response};
use serde_json::json;

const DEFAULT_LOG_LIMIT: u64 = 50;
const MAX_LOG_LIMIT: u64 = 500;

/// Liveness check.
pub(super) async fn health() -> Response {
    ok(json!({ "status": "ok" }))
}

/// Inventory summary.
pub(super) async fn dashboard(State(state): State<AppState>) -> Result<Response> {
    Ok(ok(report::generate_inventory_summary(&state.db).await?))
}

/// Recent audit entries, `?limit=` capped at 500.
pub(super) async fn logs(State(state): State<AppState>, query: QueryInput) -> Result<Response> {
    let limit = Fields::from_query(query)?
        .number("limit")?
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .min(MAX_LOG_LIMIT);
    Ok(ok(audit::get_recent_entries(&state.db, limit).await?))
}

/// Deletes everything once `confirm=BORRAR` is sent.
pub(super) async fn wipe(State(state): State<AppState>, form: FormInput) -> Result<Response> {
    let fields = Fields::from_form(form)?;
    let confirmation = fields.text("confirm").unwrap_or_default();
    Ok(ok(system::wipe_all(&state.db, confirmation).await?))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::errors::Result;
    use crate::test_utils::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() -> Result<()> {
        let db = setup_test_db().await?;
        let (status, body) = get(app(&db), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn test_logs_are_newest_first_and_limited() -> Result<()> {
        let (db, product, employee) = setup_with_product_and_employee(10).await?;
        create_test_loan(&db, product.id, employee.id, 1).await?;

        let (status, body) = get(app(&db), "/logs?limit=1").await;
        assert_eq!(status, StatusCode::OK);
        let entries = body["data"].as_array().cloned().unwrap_or_default();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["action"], "create_loan");

        let (status, _) = get(app(&db), "/logs?limit=-3").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_wipe_needs_confirmation() -> Result<()> {
        let (db, _, _) = setup_with_product_and_employee(10).await?;

        let (status, _) = post_form(app(&db), "/system/wipe", "confirm=si").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (_, body) = get(app(&db), "/dashboard").await;
        assert_eq!(body["data"]["total_products"], 1);

        let (status, body) = post_form(app(&db), "/system/wipe", "confirm=BORRAR").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["products"], 1);
        let (_, body) = get(app(&db), "/dashboard").await;
        assert_eq!(body["data"]["total_products"], 0);
        Ok(())
    }
}
