//! Sighting lifecycle controller
//!
//! The only component that mutates sightings. Every operation checks, in
//! order:
//!
//! 1. an authenticated actor where one is required (`Unauthorized`)
//! 2. the record exists (`NotFound`)
//! 3. the policy allows it (`Forbidden`)
//!
//! and only then validates the payload and touches the store.
//!
//! ```text
//! pending ──approve(admin)──▶ approved
//! ```
//!
//! Both states accept edits to the descriptive fields and hard deletes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use spotter_common::models::{BoundingBox, SightingFilter};
use spotter_common::policy::{self, Permissions};
use spotter_common::time::now;
use spotter_common::{Actor, Location, Sighting, SightingStatus, SpeciesRegistry};

use crate::db::actors::FALLBACK_DISPLAY_NAME;
use crate::db::sightings;

/// Lifecycle failures; each maps to one HTTP status
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Sighting {0} not found")]
    NotFound(Uuid),

    #[error("Sighting {0} is already approved")]
    AlreadyApproved(Uuid),

    #[error(transparent)]
    Store(#[from] spotter_common::Error),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Submission payload
///
/// Everything is optional at the type level so missing fields surface as
/// validation errors rather than decode failures. A client-sent `status` is
/// ignored: the initial status comes from the actor's role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSighting {
    pub species_name: Option<String>,
    pub scientific_name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// RFC 3339; defaults to submission time
    pub captured_at: Option<String>,
    pub notes: Option<String>,
    pub image_ref: Option<String>,
}

/// Edit payload
///
/// `null` clears an optional field, an absent key leaves it alone. Any key
/// outside the editable set lands in `other` and rejects the whole patch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SightingPatch {
    #[serde(default)]
    pub species_name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub scientific_name: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub image_ref: Option<Option<String>>,

    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// Distinguish an explicit `null` from an absent key
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

impl SightingPatch {
    fn is_empty(&self) -> bool {
        self.species_name.is_none()
            && self.scientific_name.is_none()
            && self.notes.is_none()
            && self.image_ref.is_none()
            && self.other.is_empty()
    }

    fn validate(&self) -> LifecycleResult<()> {
        if !self.other.is_empty() {
            let mut fields: Vec<&str> = self.other.keys().map(String::as_str).collect();
            fields.sort_unstable();
            return Err(LifecycleError::Validation(format!(
                "Fields cannot be edited: {}",
                fields.join(", ")
            )));
        }
        if self.is_empty() {
            return Err(LifecycleError::Validation("Nothing to update".to_string()));
        }
        if let Some(name) = &self.species_name {
            if name.trim().is_empty() {
                return Err(LifecycleError::Validation(
                    "Species name cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Trim, mapping blank strings to `None`
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct LifecycleController {
    db: SqlitePool,
    registry: Arc<SpeciesRegistry>,
    bounds: BoundingBox,
}

impl LifecycleController {
    pub fn new(db: SqlitePool, registry: Arc<SpeciesRegistry>, bounds: BoundingBox) -> Self {
        Self {
            db,
            registry,
            bounds,
        }
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Record a new sighting owned by `actor`
    pub async fn create(&self, actor: &Actor, fields: NewSighting) -> LifecycleResult<Sighting> {
        if !policy::can_create(actor) {
            return Err(LifecycleError::Unauthorized(
                "Sign in to submit a sighting".to_string(),
            ));
        }

        let species_name = clean(fields.species_name)
            .ok_or_else(|| LifecycleError::Validation("Species name is required".to_string()))?;
        let location = self.validate_location(fields.lat, fields.lng)?;

        let submitted_at = now();
        let captured_at = match clean(fields.captured_at) {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    LifecycleError::Validation(format!("Invalid captured_at '{}': {}", raw, e))
                })?,
            None => submitted_at,
        };

        let (species_name, scientific_name) =
            self.canonicalize(species_name, clean(fields.scientific_name));

        let status = policy::initial_status(actor.role);
        let (approved_at, approved_by) = match status {
            SightingStatus::Approved => (Some(submitted_at), actor.id.clone()),
            SightingStatus::Pending => (None, None),
        };

        let sighting = Sighting {
            id: Uuid::new_v4(),
            species_name,
            scientific_name,
            location,
            captured_at,
            submitted_at,
            notes: clean(fields.notes),
            image_ref: clean(fields.image_ref),
            owner_id: actor.id.clone(),
            owner_display_name: Some(
                actor
                    .display_name
                    .clone()
                    .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string()),
            ),
            status,
            updated_at: None,
            approved_at,
            approved_by,
        };

        sightings::insert_sighting(&self.db, &sighting).await?;

        info!(
            sighting_id = %sighting.id,
            owner = ?sighting.owner_id,
            species = %sighting.species_name,
            status = %sighting.status,
            "Sighting created"
        );

        Ok(sighting)
    }

    /// Change the descriptive fields of a sighting; owner only
    pub async fn edit(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: SightingPatch,
    ) -> LifecycleResult<Sighting> {
        require_identity(actor, "Sign in to edit sightings")?;
        let mut sighting = self.load(id).await?;
        if !policy::can_edit(actor, &sighting) {
            return Err(LifecycleError::Forbidden(
                "Only the submitter can edit this sighting".to_string(),
            ));
        }
        patch.validate()?;

        let species_changed = match clean(patch.species_name) {
            Some(name) if name != sighting.species_name => {
                sighting.species_name = name;
                true
            }
            _ => false,
        };

        let scientific_name = patch.scientific_name.map(clean);
        if species_changed {
            let (name, scientific) = self.canonicalize(
                std::mem::take(&mut sighting.species_name),
                scientific_name.flatten(),
            );
            sighting.species_name = name;
            sighting.scientific_name = scientific;
        } else if let Some(value) = scientific_name {
            sighting.scientific_name = value;
        }
        if let Some(value) = patch.notes {
            sighting.notes = clean(value);
        }
        if let Some(value) = patch.image_ref {
            sighting.image_ref = clean(value);
        }
        sighting.updated_at = Some(now());

        if !sightings::update_sighting_fields(&self.db, &sighting).await? {
            return Err(LifecycleError::NotFound(id));
        }

        info!(sighting_id = %id, actor = ?actor.id, "Sighting edited");
        Ok(sighting)
    }

    /// Hard delete; owner or admin
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> LifecycleResult<()> {
        require_identity(actor, "Sign in to delete sightings")?;
        let sighting = self.load(id).await?;
        if !policy::can_delete(actor, &sighting) {
            return Err(LifecycleError::Forbidden(
                "Only the submitter or an admin can delete this sighting".to_string(),
            ));
        }

        if !sightings::delete_sighting(&self.db, id).await? {
            return Err(LifecycleError::NotFound(id));
        }

        info!(sighting_id = %id, actor = ?actor.id, "Sighting deleted");
        Ok(())
    }

    /// Move a pending sighting to approved; admin only
    pub async fn approve(&self, actor: &Actor, id: Uuid) -> LifecycleResult<Sighting> {
        let admin_id = require_identity(actor, "Sign in to approve sightings")?;
        let sighting = self.load(id).await?;
        if !actor.is_admin() {
            return Err(LifecycleError::Forbidden(
                "Only admins can approve sightings".to_string(),
            ));
        }
        if !policy::can_approve(actor, &sighting) {
            return Err(LifecycleError::AlreadyApproved(id));
        }

        if !sightings::mark_approved(&self.db, id, admin_id, &now()).await? {
            // Lost a race: deleted or approved by someone else meanwhile
            return match sightings::get_sighting(&self.db, id).await? {
                Some(_) => Err(LifecycleError::AlreadyApproved(id)),
                None => Err(LifecycleError::NotFound(id)),
            };
        }

        info!(sighting_id = %id, approved_by = %admin_id, "Sighting approved");
        self.load(id).await
    }

    /// Filtered listing, newest first; always permitted
    pub async fn list(&self, filter: &SightingFilter) -> LifecycleResult<Vec<Sighting>> {
        let rows = sightings::list_sightings(&self.db, filter).await?;
        debug!(count = rows.len(), "Listed sightings");
        Ok(rows)
    }

    /// Single record read; always permitted
    pub async fn get(&self, id: Uuid) -> LifecycleResult<Sighting> {
        self.load(id).await
    }

    /// Edit/delete/approve decisions for `actor`; all false for unknown ids
    pub async fn permissions(&self, actor: &Actor, id: Uuid) -> LifecycleResult<Permissions> {
        let sighting = sightings::get_sighting(&self.db, id).await?;
        Ok(Permissions::evaluate(actor, sighting.as_ref()))
    }

    async fn load(&self, id: Uuid) -> LifecycleResult<Sighting> {
        sightings::get_sighting(&self.db, id)
            .await?
            .ok_or(LifecycleError::NotFound(id))
    }

    fn validate_location(&self, lat: Option<f64>, lng: Option<f64>) -> LifecycleResult<Location> {
        let (lat, lng) = match (lat, lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                return Err(LifecycleError::Validation(
                    "Latitude and longitude are required".to_string(),
                ))
            }
        };

        let location = Location { lat, lng };
        if !self.bounds.contains(&location) {
            return Err(LifecycleError::Validation(format!(
                "Location ({}, {}) is outside the service area (lat {}..{}, lng {}..{})",
                lat,
                lng,
                self.bounds.min_lat,
                self.bounds.max_lat,
                self.bounds.min_lng,
                self.bounds.max_lng
            )));
        }
        Ok(location)
    }

    /// Registry spelling and scientific name for exact matches
    ///
    /// An explicit scientific name always wins; free text passes through.
    fn canonicalize(
        &self,
        species_name: String,
        scientific_name: Option<String>,
    ) -> (String, Option<String>) {
        match self.registry.lookup_exact(&species_name) {
            Some(species) => (
                species.common_name.clone(),
                scientific_name.or_else(|| Some(species.scientific_name.clone())),
            ),
            None => (species_name, scientific_name),
        }
    }
}

fn require_identity<'a>(actor: &'a Actor, message: &str) -> LifecycleResult<&'a str> {
    actor
        .id
        .as_deref()
        .ok_or_else(|| LifecycleError::Unauthorized(message.to_string()))
}
