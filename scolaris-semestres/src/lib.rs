//! scolaris-semestres library - Semestre records service
//!
//! CRUD over semestres plus maintenance of the `semestres` back-references
//! held by filieres, professeurs and elements.

use axum::Router;
use scolaris_common::config::RelinkScope;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod populate;

/// Service name used in logs, the config file name and `/health`
pub const MODULE_NAME: &str = "scolaris-semestres";

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Which related records an update relinks
    pub relink_scope: RelinkScope,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, relink_scope: RelinkScope) -> Self {
        Self { db, relink_scope }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let semestres = Router::new()
        .route(
            "/semestres",
            get(api::list_semestres).post(api::create_semestre),
        )
        .route(
            "/semestres/:id",
            get(api::get_semestre_by_id)
                .put(api::update_semestre)
                .delete(api::delete_semestre),
        );

    Router::new()
        .merge(semestres)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
