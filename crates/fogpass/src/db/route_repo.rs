//! Route repository. Routes are owned elsewhere; this service only reads
//! them, apart from seeding.

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{Database, DatabaseError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRow {
    pub id: i64,
    pub name: String,
    pub route_code: String,
    #[serde(default)]
    pub direction: Option<String>,
}

impl RouteRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            route_code: row.get("route_code")?,
            direction: row.get("direction")?,
        })
    }
}

/// Inserts a route unless one with the same id already exists.
/// Returns whether a row was written.
pub fn insert(db: &Database, route: &RouteRow) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let written = conn.execute(
            "INSERT OR IGNORE INTO routes (id, name, route_code, direction) VALUES (?1, ?2, ?3, ?4)",
            params![route.id, route.name, route.route_code, route.direction],
        )?;
        Ok(written > 0)
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<RouteRow>, DatabaseError> {
    db.with_conn(|conn| {
        let route = conn
            .query_row(
                "SELECT id, name, route_code, direction FROM routes WHERE id = ?1",
                params![id],
                RouteRow::from_row,
            )
            .optional()?;
        Ok(route)
    })
}

/// Removes a route. Only used to simulate a route vanishing mid-run.
pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM routes WHERE id = ?1", params![id])?;
        Ok(())
    })
}
