//! Authorization policy
//!
//! Pure decision functions: no I/O, no errors, only booleans. Callers resolve
//! a sighting id before asking; an id that does not resolve is passed as
//! `None` and every mutating decision on it is `false`.
//!
//! | decision | rule |
//! |---|---|
//! | create | actor authenticated |
//! | read | always |
//! | edit | actor is the recorded owner |
//! | delete | admin, or actor is the recorded owner |
//! | approve | admin and record pending |
//!
//! Ownerless (legacy/anonymous) records can never be edited and can only be
//! deleted by an admin.

use serde::Serialize;

use crate::models::{Actor, Role, Sighting, SightingStatus};

pub fn can_create(actor: &Actor) -> bool {
    actor.is_authenticated()
}

/// Reads are public for every status; hiding pending records from
/// non-admins is a presentation concern.
pub fn can_read(_actor: &Actor, _sighting: &Sighting) -> bool {
    true
}

pub fn can_edit(actor: &Actor, sighting: &Sighting) -> bool {
    sighting.is_owned_by(actor)
}

pub fn can_delete(actor: &Actor, sighting: &Sighting) -> bool {
    actor.is_admin() || sighting.is_owned_by(actor)
}

pub fn can_approve(actor: &Actor, sighting: &Sighting) -> bool {
    actor.is_admin() && sighting.status == SightingStatus::Pending
}

/// Status assigned at creation: admins publish immediately
pub fn initial_status(role: Role) -> SightingStatus {
    match role {
        Role::Admin => SightingStatus::Approved,
        Role::User => SightingStatus::Pending,
    }
}

/// Mutating decisions for one (possibly unresolved) record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_approve: bool,
}

impl Permissions {
    pub fn evaluate(actor: &Actor, sighting: Option<&Sighting>) -> Self {
        match sighting {
            Some(s) => Self {
                can_edit: can_edit(actor, s),
                can_delete: can_delete(actor, s),
                can_approve: can_approve(actor, s),
            },
            None => Self::default(),
        }
    }
}
