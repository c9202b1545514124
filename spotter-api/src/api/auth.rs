//! Caller identity extraction
//!
//! Every handler that cares about who is calling takes a [`Caller`]. A
//! missing header, a non-bearer scheme or a token nobody holds all yield an
//! anonymous caller; whether that is acceptable is the lifecycle's decision.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use spotter_common::token::parse_bearer;
use spotter_common::Actor;

use crate::db::actors::ActorRecord;
use crate::error::ApiError;
use crate::AppState;

/// The resolved caller of a request
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub actor: Actor,
    /// Registered identity behind `actor`, when authenticated
    pub record: Option<ActorRecord>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    fn registered(record: ActorRecord) -> Self {
        Self {
            actor: record.to_actor(),
            record: Some(record),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Caller::anonymous());
        };

        let Some(token) = value.to_str().ok().and_then(parse_bearer) else {
            tracing::debug!("Ignoring non-bearer Authorization header");
            return Ok(Caller::anonymous());
        };

        match state.identity.resolve(token).await? {
            Some(record) => {
                tracing::debug!(actor_id = %record.id, role = %record.role, "Caller identified");
                Ok(Caller::registered(record))
            }
            None => {
                tracing::warn!("Unknown bearer token, treating caller as anonymous");
                Ok(Caller::anonymous())
            }
        }
    }
}
