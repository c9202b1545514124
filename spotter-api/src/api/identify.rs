//! Photo identification endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::{json_body, Caller};
use crate::error::{ApiError, ApiResult};
use crate::services::ImageData;
use crate::AppState;

/// POST /api/identify request body
#[derive(Debug, Deserialize)]
pub struct IdentifyRequest {
    /// `data:image/<type>;base64,...`
    pub image: Option<String>,
}

/// Suggestion returned to the submitter
#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
    pub prediction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    pub is_known_species: bool,
    pub confidence: &'static str,
}

/// POST /api/identify
///
/// Suggests a species for an uploaded photo. Nothing is persisted; a 503
/// tells the client to fall back to manual selection.
pub async fn identify(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<IdentifyRequest>, JsonRejection>,
) -> ApiResult<Json<IdentifyResponse>> {
    if !caller.actor.is_authenticated() {
        return Err(ApiError::Unauthorized(
            "Sign in to identify photos".to_string(),
        ));
    }

    let request = json_body(body)?;
    let raw = request
        .image
        .ok_or_else(|| ApiError::Validation("No image provided".to_string()))?;
    let image = ImageData::from_data_uri(&raw).map_err(|e| ApiError::Validation(e.to_string()))?;

    let identification = state.reconciler.identify(&image).await.map_err(|e| {
        tracing::warn!(error = %e, "Identification unavailable");
        ApiError::from(e)
    })?;

    Ok(Json(IdentifyResponse {
        confidence: identification.confidence(),
        prediction: identification.prediction,
        scientific_name: identification.scientific_name,
        is_known_species: identification.is_known_species,
    }))
}

/// Build identification routes
pub fn identify_routes() -> Router<AppState> {
    Router::new().route("/api/identify", post(identify))
}
