//! Landmark repository. Writes happen in batches, one transaction each.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};
use crate::landmark::Landmark;

fn landmark_from_row(row: &Row<'_>) -> Result<Landmark, rusqlite::Error> {
    Ok(Landmark {
        sequence_order: row.get("sequence_order")?,
        location_code: row.get("location_code")?,
        landmark_type: row.get("landmark_type")?,
        name: row.get("name")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        prewarning_distance: row.get("prewarning_distance")?,
        direction: row.get("direction")?,
    })
}

/// Inserts all landmarks for a route in a single transaction. Either the
/// whole batch is committed or none of it is.
pub fn insert_batch(
    db: &Database,
    route_id: i64,
    landmarks: &[Landmark],
) -> Result<usize, DatabaseError> {
    if landmarks.is_empty() {
        return Ok(0);
    }

    db.with_transaction(|tx| {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO landmarks (route_id, sequence_order, location_code, landmark_type,
             name, latitude, longitude, prewarning_distance, direction)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for landmark in landmarks {
            stmt.execute(params![
                route_id,
                landmark.sequence_order,
                landmark.location_code,
                landmark.landmark_type,
                landmark.name,
                landmark.latitude,
                landmark.longitude,
                landmark.prewarning_distance,
                landmark.direction,
            ])?;
        }
        Ok(landmarks.len())
    })
}

/// Lists a route's landmarks ordered by sequence, then insertion.
pub fn list_by_route(db: &Database, route_id: i64) -> Result<Vec<Landmark>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM landmarks WHERE route_id = ?1 ORDER BY sequence_order ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![route_id], landmark_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn count_by_route(db: &Database, route_id: i64) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM landmarks WHERE route_id = ?1",
            params![route_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
