//! spotter-api library interface
//!
//! Exposes the router and application state so integration tests can drive
//! the service in-process.

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use spotter_common::models::BoundingBox;
use spotter_common::SpeciesRegistry;

use crate::services::{
    Classifier, IdentityProvider, LifecycleController, Reconciler, SqliteIdentityProvider,
};

/// Request body cap; photos arrive base64-encoded inside JSON
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub registry: Arc<SpeciesRegistry>,
    pub reconciler: Arc<Reconciler>,
    pub lifecycle: Arc<LifecycleController>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire the services around one pool and one registry
    ///
    /// `classifier` is `None` when no API key is configured; identification
    /// then answers 503 and everything else works.
    pub fn new(
        db: SqlitePool,
        registry: Arc<SpeciesRegistry>,
        classifier: Option<Arc<dyn Classifier>>,
        bounds: BoundingBox,
    ) -> Self {
        Self {
            reconciler: Arc::new(Reconciler::new(registry.clone(), classifier)),
            lifecycle: Arc::new(LifecycleController::new(
                db.clone(),
                registry.clone(),
                bounds,
            )),
            identity: Arc::new(SqliteIdentityProvider::new(db.clone())),
            db,
            registry,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::identify_routes())
        .merge(api::sighting_routes())
        .merge(api::species_routes())
        .merge(api::actor_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
