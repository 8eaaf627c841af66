use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::ResolutionTemplate;

pub fn insert_resolution(
    conn: &Connection,
    resolution: &ResolutionTemplate,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO resolutions (name, resolution_name, resolution_text, is_active)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            resolution.name,
            resolution.resolution_name,
            resolution.resolution_text,
            resolution.is_active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_resolution(
    conn: &Connection,
    name: &str,
) -> Result<Option<ResolutionTemplate>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name, resolution_name, resolution_text, is_active
         FROM resolutions WHERE name = ?1",
    )?;
    let result = stmt.query_row(params![name], |row| {
        Ok(ResolutionTemplate {
            name: row.get(0)?,
            resolution_name: row.get(1)?,
            resolution_text: row.get(2)?,
            is_active: row.get::<_, i32>(3)? != 0,
        })
    });
    match result {
        Ok(resolution) => Ok(Some(resolution)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_resolutions(conn: &Connection) -> Result<Vec<ResolutionTemplate>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name, resolution_name, resolution_text, is_active
         FROM resolutions WHERE is_active = 1 ORDER BY resolution_name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ResolutionTemplate {
            name: row.get(0)?,
            resolution_name: row.get(1)?,
            resolution_text: row.get(2)?,
            is_active: row.get::<_, i32>(3)? != 0,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
