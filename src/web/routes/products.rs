//! Product catalog routes.
//!
//! Creation, edits, archiving, manual restocking and code lookups. Stock is
//! only ever changed through the ledger operations in `core`.

use crate::{
    core::product::{self, NewProduct, ProductUpdate},
    errors::{Error, Result},
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

/// Routes under `/products`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/low-stock", get(low_stock))
        .route("/by-code/:code", get(find_by_code))
        .route("/:id", post(update_product))
        .route("/:id/archive", post(archive_product))
        .route("/:id/stock", post(add_stock))
}

async fn list_products(State(state): State<AppState>) -> Result<Response> {
    Ok(ok(product::get_all_active_products(&state.db).await?))
}

async fn create_product(State(state): State<AppState>, form: FormInput) -> Result<Response> {
    let fields = Fields::from_form(form)?;
    let new = NewProduct {
        code: fields.text("code").map(str::to_string),
        short_code: fields.text("short_code").unwrap_or_default().to_string(),
        description: fields.required("description")?.to_string(),
        category: fields.category("category")?,
        stock: fields.number("stock")?.unwrap_or(0),
        min_stock: fields
            .number("min_stock")?
            .unwrap_or(state.config.inventory.default_min_stock),
    };
    Ok(created(product::create_product(&state.db, new).await?))
}

async fn low_stock(State(state): State<AppState>) -> Result<Response> {
    Ok(ok(product::get_low_stock_products(&state.db).await?))
}

async fn find_by_code(State(state): State<AppState>, Path(code): Path<String>) -> Result<Response> {
    let found = product::find_product_by_code(&state.db, &code)
        .await?
        .ok_or(Error::ProductNotFound { id: code })?;
    Ok(ok(found))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: FormInput,
) -> Result<Response> {
    let id = parse_id(&id)?;
    let fields = Fields::from_form(form)?;
    let update = ProductUpdate {
        short_code: fields.text("short_code").unwrap_or_default().to_string(),
        description: fields.required("description")?.to_string(),
        category: fields.category("category")?,
        min_stock: fields.required_number("min_stock")?,
    };
    Ok(ok(product::update_product(&state.db, id, update).await?))
}

async fn archive_product(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let id = parse_id(&id)?;
    Ok(ok(product::archive_product(&state.db, id).await?))
}

async fn add_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: FormInput,
) -> Result<Response> {
    let id = parse_id(&id)?;
    let fields = Fields::from_form(form)?;
    let quantity = fields.required_number("quantity")?;
    let note = fields.text("note").map(str::to_string);
    Ok(ok(product::add_stock(&state.db, id, quantity, note).await?))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::errors::Result;
    use crate::test_utils::setup_test_db;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_create_and_list_products() -> Result<()> {
        let db = setup_test_db().await?;

        let (status, body) = post_form(
            app(&db),
            "/products",
            "code=HER-001&description=Taladro+percutor&category=Herramienta&stock=10&min_stock=2",
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["code"], "HER-001");
        assert_eq!(body["data"]["stock"], 10);

        let (status, body) = get(app(&db), "/products").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

        let (status, body) = post_form(
            app(&db),
            "/products",
            "code=HER-001&description=Otro&category=Herramienta",
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some_and(|e| e.contains("HER-001")));
        Ok(())
    }

    #[tokio::test]
    async fn test_form_validation_is_uniform() -> Result<()> {
        let db = setup_test_db().await?;

        for form in [
            "description=Martillo&category=Refacción",
            "category=Herramienta",
            "description=Martillo&category=Herramienta&stock=muchos",
        ] {
            let (status, body) = post_form(app(&db), "/products", form).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "form {form}");
            assert_eq!(body["success"], false);
            assert!(body["error"].is_string());
        }

        let (status, body) = post_form(app(&db), "/products/abc/archive", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        Ok(())
    }

    #[tokio::test]
    async fn test_lookup_stock_and_archive() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, body) = post_form(
            app(&db),
            "/products",
            "code=CON-001&description=Guantes&category=consumible&stock=1&min_stock=3",
        )
        .await;
        let id = body["data"]["id"].as_i64().unwrap_or_default();

        let (status, body) = get(app(&db), "/products/by-code/CON-001").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id);

        let (status, _) = get(app(&db), "/products/by-code/NOPE").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = get(app(&db), "/products/low-stock").await;
        assert_eq!(body["data"][0]["code"], "CON-001");

        let (status, body) =
            post_form(app(&db), &format!("/products/{id}/stock"), "quantity=5&note=compra").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["stock"], 6);

        let (status, body) = post_form(
            app(&db),
            &format!("/products/{id}"),
            "description=Guantes+de+carnaza&category=EPP&min_stock=1&short_code=GC-1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["category"], "EPP");
        assert_eq!(body["data"]["stock"], 6);

        let (status, _) = post_form(app(&db), &format!("/products/{id}/archive"), "").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = post_form(app(&db), &format!("/products/{id}/archive"), "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }
}
