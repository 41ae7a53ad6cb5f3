//! Route table.

use super::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Employee registration
pub mod employees;
/// Invoice and spreadsheet imports
pub mod imports;
/// Damage and loss reports
pub mod incidents;
/// Loans and returns
pub mod loans;
/// Product catalog
pub mod products;
/// Health, dashboard, audit log and wipe
pub mod system;

/// Router for every endpoint, before state is attached.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(system::health))
        .route("/dashboard", get(system::dashboard))
        .route("/logs", get(system::logs))
        .route("/system/wipe", post(system::wipe))
        .nest("/products", products::router())
        .nest("/employees", employees::router())
        .nest("/loans", loans::router())
        .nest("/incidents", incidents::router())
        .nest("/imports", imports::router())
}

#[cfg(test)]
pub(crate) mod test_support {
    #![allow(clippy::unwrap_used)]
    use crate::{config::settings::AppConfig, web::{AppState, build_router}};
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use sea_orm::DatabaseConnection;
    use serde_json::Value;
    use tower::ServiceExt;

    /// Second handle onto the same pool, so the router and the test body
    /// observe one in-memory database.
    fn share(db: &DatabaseConnection) -> DatabaseConnection {
        match db {
            DatabaseConnection::SqlxSqlitePoolConnection(pool) => {
                DatabaseConnection::SqlxSqlitePoolConnection(pool.clone())
            }
            DatabaseConnection::MockDatabaseConnection(mock) => {
                DatabaseConnection::MockDatabaseConnection(mock.clone())
            }
            _ => panic!("router tests need a sqlite or mock connection"),
        }
    }

    pub fn app(db: &DatabaseConnection) -> Router {
        build_router(AppState::new(share(db), AppConfig::default()))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(app, request).await
    }

    pub async fn post_form(app: Router, uri: &str, form: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        send(app, request).await
    }

    pub async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    pub async fn post_bytes(app: Router, uri: &str, bytes: &[u8]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(bytes.to_vec()))
            .unwrap();
        send(app, request).await
    }
}
