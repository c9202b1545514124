//! Database access layer

pub mod actors;
pub mod sightings;
