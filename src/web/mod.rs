//! HTTP surface - Form handlers for the admin panel.
//!
//! Every handler coerces its text fields into typed input, calls one core
//! operation and answers with the uniform body from [`response`]. Errors are
//! converted at this boundary and nowhere else.

use crate::config::settings::AppConfig;
use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Text field coercion
pub mod forms;
/// Uniform response bodies
pub mod response;
/// Route handlers grouped by area
pub mod routes;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Connection pool, shared by every clone of the state
    pub db: Arc<DatabaseConnection>,
    /// Loaded settings
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wraps a connection and settings.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
        }
    }
}

/// Builds the complete router.
pub fn build_router(state: AppState) -> Router {
    routes::router().with_state(state)
}
