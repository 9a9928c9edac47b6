//! Records of durably stored upload copies (`landmark_files`).

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFileRow {
    pub id: i64,
    pub route_id: i64,
    pub original_file_name: String,
    pub storage_file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub created_at: String,
}

impl LandmarkFileRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            route_id: row.get("route_id")?,
            original_file_name: row.get("original_file_name")?,
            storage_file_name: row.get("storage_file_name")?,
            file_path: row.get("file_path")?,
            file_type: row.get("file_type")?,
            file_size: row.get("file_size")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Inserts a stored-file record. The `id` field of `file` is ignored;
/// the assigned id is returned.
pub fn insert(db: &Database, file: &LandmarkFileRow) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO landmark_files (route_id, original_file_name, storage_file_name,
             file_path, file_type, file_size, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                file.route_id,
                file.original_file_name,
                file.storage_file_name,
                file.file_path,
                file.file_type,
                file.file_size,
                file.created_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<LandmarkFileRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM landmark_files WHERE id = ?1",
                params![id],
                LandmarkFileRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::route_repo::{self, RouteRow};

    #[test]
    fn test_insert_and_find() {
        let db = Database::open_in_memory().unwrap();
        route_repo::insert(
            &db,
            &RouteRow {
                id: 4,
                name: "North".to_string(),
                route_code: "N4".to_string(),
                direction: None,
            },
        )
        .unwrap();

        let row = LandmarkFileRow {
            id: 0,
            route_id: 4,
            original_file_name: "north.csv".to_string(),
            storage_file_name: "0b4c.csv".to_string(),
            file_path: "/data/route_4/2026/03/0b4c.csv".to_string(),
            file_type: "text/csv".to_string(),
            file_size: 120,
            created_at: "2026-03-01T08:00:00Z".to_string(),
        };
        let id = insert(&db, &row).unwrap();

        let found = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(found, LandmarkFileRow { id, ..row });
    }
}
