//! # Swamp Spotter Common Library
//!
//! Shared code for the Swamp Spotter service and its operator tooling:
//! - Domain models (sightings, actors, roles)
//! - Canonical species registry
//! - Authorization policy (pure decision functions)
//! - Bearer token helpers
//! - Configuration loading and root folder resolution
//! - Database initialization

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod policy;
pub mod species;
pub mod time;
pub mod token;

pub use error::{Error, Result};
pub use models::{Actor, Location, Role, Sighting, SightingStatus};
pub use species::{Species, SpeciesRegistry};
