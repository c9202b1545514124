//! Sighting persistence
//!
//! Free functions over a pool; only the lifecycle controller calls the
//! mutating ones.

use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use spotter_common::models::SightingFilter;
use spotter_common::time::{from_db, from_db_opt, to_db};
use spotter_common::{Error, Location, Result, Sighting, SightingStatus};

const SELECT_COLUMNS: &str = r#"
    SELECT id, species_name, scientific_name, lat, lng,
           captured_at, submitted_at, notes, image_ref,
           owner_id, owner_display_name, status,
           updated_at, approved_at, approved_by
    FROM sightings
"#;

/// Insert a new sighting
pub async fn insert_sighting(pool: &SqlitePool, sighting: &Sighting) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sightings (
            id, species_name, scientific_name, lat, lng,
            captured_at, submitted_at, notes, image_ref,
            owner_id, owner_display_name, status,
            updated_at, approved_at, approved_by
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(sighting.id.to_string())
    .bind(&sighting.species_name)
    .bind(&sighting.scientific_name)
    .bind(sighting.location.lat)
    .bind(sighting.location.lng)
    .bind(to_db(&sighting.captured_at))
    .bind(to_db(&sighting.submitted_at))
    .bind(&sighting.notes)
    .bind(&sighting.image_ref)
    .bind(&sighting.owner_id)
    .bind(&sighting.owner_display_name)
    .bind(sighting.status.as_str())
    .bind(sighting.updated_at.as_ref().map(to_db))
    .bind(sighting.approved_at.as_ref().map(to_db))
    .bind(&sighting.approved_by)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a sighting by id
pub async fn get_sighting(pool: &SqlitePool, id: Uuid) -> Result<Option<Sighting>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(sighting_from_row).transpose()
}

/// List sightings matching `filter`, newest submission first
pub async fn list_sightings(pool: &SqlitePool, filter: &SightingFilter) -> Result<Vec<Sighting>> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
    query.push(" WHERE 1 = 1");

    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(owner_id) = &filter.owner_id {
        query.push(" AND owner_id = ").push_bind(owner_id.clone());
    }

    query
        .push(" ORDER BY submitted_at DESC, id ASC LIMIT ")
        .push_bind(filter.effective_limit() as i64);

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(sighting_from_row).collect()
}

/// Persist the editable fields and `updated_at`
///
/// Returns false when the row no longer exists.
pub async fn update_sighting_fields(pool: &SqlitePool, sighting: &Sighting) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE sightings
        SET species_name = ?, scientific_name = ?, notes = ?, image_ref = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&sighting.species_name)
    .bind(&sighting.scientific_name)
    .bind(&sighting.notes)
    .bind(&sighting.image_ref)
    .bind(sighting.updated_at.as_ref().map(to_db))
    .bind(sighting.id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Conditionally move a pending sighting to approved
///
/// Returns false if the row is missing or no longer pending, so two
/// concurrent approvals cannot both stamp `approved_by`.
pub async fn mark_approved(
    pool: &SqlitePool,
    id: Uuid,
    approved_by: &str,
    approved_at: &chrono::DateTime<chrono::Utc>,
) -> Result<bool> {
    let stamp = to_db(approved_at);
    let result = sqlx::query(
        r#"
        UPDATE sightings
        SET status = 'approved', approved_at = ?, approved_by = ?, updated_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(&stamp)
    .bind(approved_by)
    .bind(&stamp)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Hard delete; returns false when nothing was removed
pub async fn delete_sighting(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sightings WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn sighting_from_row(row: &SqliteRow) -> Result<Sighting> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Invalid sighting id {}: {}", id, e)))?;

    let status: String = row.get("status");
    let status: SightingStatus = status.parse()?;

    let captured_at: String = row.get("captured_at");
    let submitted_at: String = row.get("submitted_at");

    Ok(Sighting {
        id,
        species_name: row.get("species_name"),
        scientific_name: row.get("scientific_name"),
        location: Location {
            lat: row.get("lat"),
            lng: row.get("lng"),
        },
        captured_at: from_db("captured_at", &captured_at)?,
        submitted_at: from_db("submitted_at", &submitted_at)?,
        notes: row.get("notes"),
        image_ref: row.get("image_ref"),
        owner_id: row.get("owner_id"),
        owner_display_name: row.get("owner_display_name"),
        status,
        updated_at: from_db_opt("updated_at", row.get("updated_at"))?,
        approved_at: from_db_opt("approved_at", row.get("approved_at"))?,
        approved_by: row.get("approved_by"),
    })
}
