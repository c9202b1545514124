//! Identification reconciler
//!
//! Turns a classifier's free-text answer into either a canonical registry
//! match or an "unknown" result carrying the raw text.
//!
//! Only the first line of the (trimmed) answer is authoritative; anything
//! after it is commentary and ignored.
//!
//! A blank answer is an upstream failure (503), not an "Unknown" prediction
//! at low confidence: an empty reply says nothing about the plant, and a 503
//! tells the client to offer manual species selection straight away.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use spotter_common::SpeciesRegistry;

use super::classifier::{Classifier, ClassifierError, ImageData};

/// Best-effort species suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identification {
    /// Canonical common name when known, raw classifier text otherwise
    pub prediction: String,
    pub scientific_name: Option<String>,
    pub is_known_species: bool,
}

impl Identification {
    pub fn confidence(&self) -> &'static str {
        if self.is_known_species {
            "high"
        } else {
            "low"
        }
    }
}

/// Why no suggestion is available; the caller falls back to manual selection
#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("Image analysis is not configured")]
    NotConfigured,

    #[error("Image analysis failed: {0}")]
    Classifier(#[from] ClassifierError),
}

pub struct Reconciler {
    registry: Arc<SpeciesRegistry>,
    classifier: Option<Arc<dyn Classifier>>,
}

impl Reconciler {
    pub fn new(registry: Arc<SpeciesRegistry>, classifier: Option<Arc<dyn Classifier>>) -> Self {
        Self {
            registry,
            classifier,
        }
    }

    pub fn is_available(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn registry(&self) -> &SpeciesRegistry {
        &self.registry
    }

    /// Instruction sent with every image
    pub fn prompt(&self) -> String {
        let species_list = self.registry.common_names().collect::<Vec<_>>().join(", ");
        format!(
            "You are a plant identification expert specializing in invasive wetland and swamp plants.\n\
             \n\
             Analyze this image and identify the plant. Compare it against these known invasive species: {}.\n\
             \n\
             If the plant matches one of these species, respond with ONLY the exact name from the list.\n\
             If the plant does not match any of these species, respond with \"Unknown\" followed by your best guess of what the plant might be.\n\
             \n\
             Important: Only respond with the plant name, nothing else.",
            species_list
        )
    }

    /// Classify `image` and reconcile the answer against the registry
    ///
    /// Exactly one classifier call; failures are returned, never retried.
    pub async fn identify(&self, image: &ImageData) -> Result<Identification, IdentifyError> {
        let classifier = self.classifier.as_ref().ok_or(IdentifyError::NotConfigured)?;

        let raw = classifier.classify(image, &self.prompt()).await?;

        let identification = self
            .reconcile(&raw)
            .ok_or(IdentifyError::Classifier(ClassifierError::EmptyResponse))?;

        tracing::info!(
            classifier = classifier.name(),
            prediction = %identification.prediction,
            known = identification.is_known_species,
            "Image identified"
        );

        Ok(identification)
    }

    /// Match raw classifier text against the registry
    ///
    /// Returns `None` when the answer has no usable first line.
    pub fn reconcile(&self, raw: &str) -> Option<Identification> {
        let first_line = raw.trim().lines().next()?.trim();
        if first_line.is_empty() {
            return None;
        }

        let identification = match self.registry.resolve(first_line) {
            Some(species) => Identification {
                prediction: species.common_name.clone(),
                scientific_name: Some(species.scientific_name.clone()),
                is_known_species: true,
            },
            None => Identification {
                prediction: first_line.to_string(),
                scientific_name: None,
                is_known_species: false,
            },
        };

        Some(identification)
    }
}
