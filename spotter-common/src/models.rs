//! Domain models
//!
//! A [`Sighting`] moves through a two-state moderation lifecycle:
//! `Pending → Approved`. There is no transition back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// Actor role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Parse a stored role, falling back to `User` for anything unrecognized
    pub fn from_db_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.parse::<Role>()) {
            Some(Ok(role)) => role,
            Some(Err(_)) => {
                tracing::warn!(role = ?value, "Unrecognized role, treating as user");
                Role::User
            }
            None => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(Error::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// The identity performing an operation
///
/// An actor without an `id` is anonymous and may only read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: Option<String>,
    pub role: Role,
    pub display_name: Option<String>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            role: Role::User,
            display_name: None,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            role: Role::Admin,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Moderation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SightingStatus {
    /// Awaiting admin review
    Pending,
    /// Publicly confirmed; terminal
    Approved,
}

impl SightingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SightingStatus::Pending => "pending",
            SightingStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for SightingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SightingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(SightingStatus::Pending),
            "approved" => Ok(SightingStatus::Approved),
            other => Err(Error::InvalidInput(format!("Unknown status: {}", other))),
        }
    }
}

/// Geographic point (WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Inclusive latitude/longitude rectangle that new sightings must fall in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Alachua County, Florida (rough bounds)
    pub const ALACHUA_COUNTY: BoundingBox = BoundingBox {
        min_lat: 29.3,
        max_lat: 29.9,
        min_lng: -82.7,
        max_lng: -82.0,
    };

    pub fn contains(&self, location: &Location) -> bool {
        location.lat.is_finite()
            && location.lng.is_finite()
            && location.lat >= self.min_lat
            && location.lat <= self.max_lat
            && location.lng >= self.min_lng
            && location.lng <= self.max_lng
    }

    /// Reject inverted or out-of-range bounds
    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64, limit: f64| v.is_finite() && (-limit..=limit).contains(&v);

        if !in_range(self.min_lat, 90.0) || !in_range(self.max_lat, 90.0) {
            return Err(Error::Config("Latitude bounds must be within ±90".to_string()));
        }
        if !in_range(self.min_lng, 180.0) || !in_range(self.max_lng, 180.0) {
            return Err(Error::Config("Longitude bounds must be within ±180".to_string()));
        }
        if self.min_lat >= self.max_lat || self.min_lng >= self.max_lng {
            return Err(Error::Config(format!(
                "Bounding box is empty or inverted: lat {}..{}, lng {}..{}",
                self.min_lat, self.max_lat, self.min_lng, self.max_lng
            )));
        }
        Ok(())
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::ALACHUA_COUNTY
    }
}

/// A user-reported plant observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sighting {
    pub id: Uuid,
    pub species_name: String,
    pub scientific_name: Option<String>,
    pub location: Location,
    pub captured_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub image_ref: Option<String>,
    pub owner_id: Option<String>,
    pub owner_display_name: Option<String>,
    pub status: SightingStatus,
    pub updated_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
}

impl Sighting {
    pub fn is_pending(&self) -> bool {
        self.status == SightingStatus::Pending
    }

    /// True if `actor` is the recorded owner; ownerless records have no owner
    pub fn is_owned_by(&self, actor: &Actor) -> bool {
        match (&actor.id, &self.owner_id) {
            (Some(actor_id), Some(owner_id)) => actor_id == owner_id,
            _ => false,
        }
    }
}

/// Read filter for listing sightings
#[derive(Debug, Clone, Default)]
pub struct SightingFilter {
    pub status: Option<SightingStatus>,
    pub owner_id: Option<String>,
    pub limit: Option<u32>,
}

impl SightingFilter {
    pub const DEFAULT_LIMIT: u32 = 100;
    pub const MAX_LIMIT: u32 = 1000;

    /// Requested limit clamped to `1..=MAX_LIMIT`
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}
