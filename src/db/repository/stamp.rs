use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{FieldMapping, Stamp};

pub fn insert_stamp(conn: &Connection, stamp: &Stamp) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO stamps (name, stamp_name, stamp_image, description, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            stamp.name,
            stamp.stamp_name,
            stamp.stamp_image,
            stamp.description,
            stamp.is_active as i32,
        ],
    )?;
    for (position, mapping) in stamp.field_mappings.iter().enumerate() {
        conn.execute(
            "INSERT INTO stamp_field_mappings (stamp_name, position, document_field,
             position_x, position_y, font_size, color, max_width)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                stamp.name,
                position as i64,
                mapping.document_field,
                mapping.position_x as f64,
                mapping.position_y as f64,
                mapping.font_size as f64,
                mapping.color,
                mapping.max_width as f64,
            ],
        )?;
    }
    Ok(())
}

pub fn get_stamp(conn: &Connection, name: &str) -> Result<Option<Stamp>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name, stamp_name, stamp_image, description, is_active
         FROM stamps WHERE name = ?1",
    )?;

    let result = stmt.query_row(params![name], |row| {
        Ok(Stamp {
            name: row.get(0)?,
            stamp_name: row.get(1)?,
            stamp_image: row.get(2)?,
            description: row.get(3)?,
            is_active: row.get::<_, i32>(4)? != 0,
            field_mappings: Vec::new(),
        })
    });

    let mut stamp = match result {
        Ok(stamp) => stamp,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    stamp.field_mappings = load_mappings(conn, name)?;
    Ok(Some(stamp))
}

pub fn list_stamps(conn: &Connection, only_active: bool) -> Result<Vec<Stamp>, DatabaseError> {
    let sql = if only_active {
        "SELECT name, stamp_name, stamp_image, description, is_active
         FROM stamps WHERE is_active = 1 ORDER BY stamp_name"
    } else {
        "SELECT name, stamp_name, stamp_image, description, is_active
         FROM stamps ORDER BY stamp_name"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(Stamp {
            name: row.get(0)?,
            stamp_name: row.get(1)?,
            stamp_image: row.get(2)?,
            description: row.get(3)?,
            is_active: row.get::<_, i32>(4)? != 0,
            field_mappings: Vec::new(),
        })
    })?;

    let mut stamps: Vec<Stamp> = rows.collect::<Result<_, _>>()?;
    for stamp in &mut stamps {
        stamp.field_mappings = load_mappings(conn, &stamp.name)?;
    }
    Ok(stamps)
}

fn load_mappings(conn: &Connection, stamp_name: &str) -> Result<Vec<FieldMapping>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT document_field, position_x, position_y, font_size, color, max_width
         FROM stamp_field_mappings WHERE stamp_name = ?1 ORDER BY position",
    )?;
    let mappings = stmt
        .query_map(params![stamp_name], |row| {
            Ok(FieldMapping {
                document_field: row.get(0)?,
                position_x: row.get::<_, f64>(1)? as f32,
                position_y: row.get::<_, f64>(2)? as f32,
                font_size: row.get::<_, f64>(3)? as f32,
                color: row.get(4)?,
                max_width: row.get::<_, f64>(5)? as f32,
            })
        })?
        .collect::<Result<_, _>>()?;
    Ok(mappings)
}
