//! Shared fixtures for spotter-api integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use spotter_api::db::actors;
use spotter_api::services::{Classifier, ClassifierError, ImageData};
use spotter_api::AppState;
use spotter_common::models::BoundingBox;
use spotter_common::{Actor, Role, SpeciesRegistry};

/// A tiny JPEG-ish payload as a data URI
pub const TEST_IMAGE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";

/// Classifier returning a canned answer, counting calls
pub struct FakeClassifier {
    answer: Result<String, u16>,
    pub calls: AtomicUsize,
}

impl FakeClassifier {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(status),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for FakeClassifier {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn classify(&self, _image: &ImageData, _prompt: &str) -> Result<String, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(ClassifierError::Api(*status, "upstream failure".to_string())),
        }
    }
}

/// Registered test identities
pub struct Cast {
    pub alice: Member,
    pub bob: Member,
    pub carol: Member,
}

pub struct Member {
    pub id: String,
    pub token: String,
    pub actor: Actor,
}

/// State over a fresh in-memory database with the default bounds
pub async fn test_state(classifier: Option<Arc<dyn Classifier>>) -> AppState {
    let db = spotter_common::db::init_memory_database().await.unwrap();
    AppState::new(
        db,
        Arc::new(SpeciesRegistry::builtin()),
        classifier,
        BoundingBox::ALACHUA_COUNTY,
    )
}

/// Alice and Bob are users, Carol is an admin
pub async fn register_cast(state: &AppState) -> Cast {
    Cast {
        alice: register(state, "alice@example.org", Some("Alice"), Role::User).await,
        bob: register(state, "bob@example.org", Some("Bob"), Role::User).await,
        carol: register(state, "carol@example.org", Some("Carol"), Role::Admin).await,
    }
}

pub async fn register(
    state: &AppState,
    email: &str,
    display_name: Option<&str>,
    role: Role,
) -> Member {
    let (record, token) = actors::insert_actor(&state.db, email, display_name, role)
        .await
        .unwrap();
    Member {
        id: record.id.clone(),
        actor: record.to_actor(),
        token,
    }
}

/// Build a request with optional bearer token and JSON body
pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Collect a response body as JSON (`Value::Null` when empty)
pub async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

/// Sighting payload at the center of Gainesville
pub fn gainesville_sighting(species: &str) -> Value {
    serde_json::json!({
        "species_name": species,
        "lat": 29.6516,
        "lng": -82.3248,
    })
}
