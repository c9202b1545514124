//! Species registry listing for manual selection

use axum::{extract::State, routing::get, Json, Router};

use spotter_common::Species;

use crate::AppState;

/// GET /api/species
///
/// Registry entries in authored order.
pub async fn list_species(State(state): State<AppState>) -> Json<Vec<Species>> {
    Json(state.registry.entries().to_vec())
}

/// Build species routes
pub fn species_routes() -> Router<AppState> {
    Router::new().route("/api/species", get(list_species))
}
