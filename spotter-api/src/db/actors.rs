//! Registered actor persistence
//!
//! Bearer tokens never touch the database in clear text; lookups go through
//! [`hash_token`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use spotter_common::time::{from_db, now, to_db};
use spotter_common::token::{generate_token, hash_token};
use spotter_common::{Actor, Error, Result, Role};

/// Label used when an actor has neither a display name nor an email
pub const FALLBACK_DISPLAY_NAME: &str = "User";

/// A registered identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorRecord {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl ActorRecord {
    /// Display name, else email, else "User"
    pub fn display_label(&self) -> String {
        [self.display_name.as_deref(), Some(self.email.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
            .to_string()
    }

    pub fn to_actor(&self) -> Actor {
        Actor {
            id: Some(self.id.clone()),
            role: self.role,
            display_name: Some(self.display_label()),
        }
    }
}

/// Look up the actor holding `token`
pub async fn find_by_token(pool: &SqlitePool, token: &str) -> Result<Option<ActorRecord>> {
    let row = sqlx::query(
        "SELECT id, email, display_name, role, created_at FROM actors WHERE token_hash = ?",
    )
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(actor_from_row).transpose()
}

/// Look up an actor by id or (case-insensitive) email
pub async fn find_by_id_or_email(pool: &SqlitePool, key: &str) -> Result<Option<ActorRecord>> {
    let key = key.trim();
    let row = sqlx::query(
        r#"
        SELECT id, email, display_name, role, created_at
        FROM actors
        WHERE id = ? OR lower(email) = lower(?)
        "#,
    )
    .bind(key)
    .bind(key)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(actor_from_row).transpose()
}

/// Register a new actor
///
/// Returns the record and its bearer token. The token is not recoverable
/// afterwards.
pub async fn insert_actor(
    pool: &SqlitePool,
    email: &str,
    display_name: Option<&str>,
    role: Role,
) -> Result<(ActorRecord, String)> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::InvalidInput("Email is required".to_string()));
    }

    let record = ActorRecord {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        display_name: display_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        role,
        created_at: now(),
    };
    let token = generate_token();

    let result = sqlx::query(
        r#"
        INSERT INTO actors (id, email, display_name, role, token_hash, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.email)
    .bind(&record.display_name)
    .bind(record.role.as_str())
    .bind(hash_token(&token))
    .bind(to_db(&record.created_at))
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok((record, token)),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            Error::InvalidInput(format!("An actor with email {} already exists", email)),
        ),
        Err(e) => Err(e.into()),
    }
}

/// Change an actor's role; returns false if the id is unknown
pub async fn set_role(pool: &SqlitePool, id: &str, role: Role) -> Result<bool> {
    let result = sqlx::query("UPDATE actors SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// All actors, oldest first
pub async fn list_actors(pool: &SqlitePool) -> Result<Vec<ActorRecord>> {
    let rows = sqlx::query(
        "SELECT id, email, display_name, role, created_at FROM actors ORDER BY created_at, email",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(actor_from_row).collect()
}

fn actor_from_row(row: &SqliteRow) -> Result<ActorRecord> {
    let role: Option<String> = row.get("role");
    let created_at: String = row.get("created_at");

    Ok(ActorRecord {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        role: Role::from_db_lenient(role.as_deref()),
        created_at: from_db("created_at", &created_at)?,
    })
}
