//! Import routes.
//!
//! Invoices arrive as pre-parsed JSON with one decision per concept.
//! Spreadsheets arrive either as JSON rows or as a raw `.xlsx` body.

use crate::{
    core::import,
    errors::{Error, Result},
    importer::{
        invoice::InvoiceRequest,
        sheet::{decode_xlsx, number_rows, rows_from_records},
    },
    web::{AppState, response::ok},
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    response::Response,
    routing::post,
};
use serde::Deserialize;
use std::collections::HashMap;

/// Spreadsheet rows submitted as JSON, one header-keyed map per row.
#[derive(Debug, Deserialize)]
pub struct SheetRequest {
    /// Data rows in sheet order
    pub rows: Vec<HashMap<String, String>>,
}

type JsonInput<T> = std::result::Result<Json<T>, JsonRejection>;

fn from_json<T>(input: JsonInput<T>) -> Result<T> {
    input
        .map(|Json(body)| body)
        .map_err(|e| Error::parse(format!("Unreadable import body: {e}")))
}

/// Routes under `/imports`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invoice", post(import_invoice))
        .route("/spreadsheet", post(import_spreadsheet))
        .route("/spreadsheet/xlsx", post(import_xlsx))
}

async fn import_invoice(
    State(state): State<AppState>,
    body: JsonInput<InvoiceRequest>,
) -> Result<Response> {
    let invoice = from_json(body)?.into_import()?;
    Ok(ok(import::import_invoice(&state.db, invoice).await?))
}

async fn import_spreadsheet(
    State(state): State<AppState>,
    body: JsonInput<SheetRequest>,
) -> Result<Response> {
    let records = number_rows(from_json(body)?.rows);
    let sheet = rows_from_records(&records, &state.config.inventory)?;
    Ok(ok(import::import_spreadsheet(&state.db, sheet).await?))
}

async fn import_xlsx(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let records = decode_xlsx(&body)?;
    let sheet = rows_from_records(&records, &state.config.inventory)?;
    Ok(ok(import::import_spreadsheet(&state.db, sheet).await?))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::entities::Category;
    use crate::errors::Result;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_invoice_import_over_http() -> Result<()> {
        let db = setup_test_db().await?;
        let existing = create_test_product(&db, "HER-001", Category::Herramienta, 1).await?;

        let body = json!({
            "invoice": {
                "issuer": "Ferretera del Norte",
                "concepts": [
                    {"identifier": "TRU-9981", "description": "Taladro", "quantity": "2.000000"},
                    {"identifier": "GC-10", "description": "Guantes", "quantity": "12"}
                ]
            },
            "decisions": [
                {"action": "link", "product_id": existing.id},
                {"action": "create", "category": "EPP", "min_stock": 4}
            ]
        });
        let (status, response) = post_json(app(&db), "/imports/invoice", &body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["data"]["linked"], json!([existing.id]));
        assert_eq!(response["data"]["units_added"], 14);

        let (_, product) = get(app(&db), "/products/by-code/TRU-9981").await;
        assert_eq!(product["data"]["id"], existing.id);
        assert_eq!(product["data"]["stock"], 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_invoice_is_bad_request() -> Result<()> {
        let db = setup_test_db().await?;

        let body = json!({
            "invoice": {"issuer": "Ferretera", "concepts": [{"description": "Taladro", "quantity": "1.5"}]},
            "decisions": [{"action": "create", "category": "Herramienta"}]
        });
        let (status, response) = post_json(app(&db), "/imports/invoice", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["success"], false);

        let (status, _) = post_json(app(&db), "/imports/invoice", &json!({"nope": 1})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_spreadsheet_import_over_http() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_product(&db, "HER-001", Category::Herramienta, 1).await?;

        let rows = json!({"rows": [
            {"CODIGO": "HER-020", "DESCRIPCION": "Segueta", "CATEGORIA": "Herramienta", "STOCK": "3"},
            {"DESCRIPCION": "", "CATEGORIA": "EPP"},
            {"DESCRIPCION": "Lentes", "CATEGORIA": "epp", "STOCK": "10.0", "MINIMO": ""}
        ]});
        let (status, body) = post_json(app(&db), "/imports/spreadsheet", &rows).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["created"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["data"]["skipped_rows"], json!([3]));
        assert_eq!(body["data"]["units_added"], 13);

        let clash = json!({"rows": [
            {"CODIGO": "HER-001", "DESCRIPCION": "Llave", "CATEGORIA": "Herramienta"},
            {"CODIGO": "HER-099", "DESCRIPCION": "Pinzas", "CATEGORIA": "Herramienta"}
        ]});
        let (status, body) = post_json(app(&db), "/imports/spreadsheet", &clash).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().is_some_and(|e| e.contains("HER-001 (Llave)")));

        let (_, body) = get(app(&db), "/products/by-code/HER-099").await;
        assert_eq!(body["success"], false);
        Ok(())
    }

    #[tokio::test]
    async fn test_xlsx_upload_reports_sheet_rows() -> Result<()> {
        let db = setup_test_db().await?;
        let workbook = include_bytes!("../../importer/testdata/inventario.xlsx");

        let (status, body) = post_bytes(app(&db), "/imports/spreadsheet/xlsx", workbook).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["created"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["data"]["skipped_rows"], json!([6]));
        assert_eq!(body["data"]["units_added"], 8);

        let (_, body) = get(app(&db), "/products/by-code/HER-050").await;
        assert_eq!(body["data"]["stock"], 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_xlsx_garbage_is_bad_request() -> Result<()> {
        let db = setup_test_db().await?;
        let (status, body) = post_bytes(app(&db), "/imports/spreadsheet/xlsx", b"not a workbook").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        Ok(())
    }
}
