//! Bearer token to actor resolution

use async_trait::async_trait;
use sqlx::SqlitePool;

use spotter_common::Result;

use crate::db::actors::{self, ActorRecord};

/// Maps a bearer token to a registered identity
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` for tokens nobody holds
    async fn resolve(&self, token: &str) -> Result<Option<ActorRecord>>;
}

/// Identities registered in the `actors` table
pub struct SqliteIdentityProvider {
    db: SqlitePool,
}

impl SqliteIdentityProvider {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityProvider for SqliteIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<ActorRecord>> {
        actors::find_by_token(&self.db, token).await
    }
}
