use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::ReceptionOffice;

pub fn insert_office(conn: &Connection, office: &ReceptionOffice) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reception_offices (name, office_name, director) VALUES (?1, ?2, ?3)",
        params![office.name, office.office_name, office.director],
    )?;
    for member in &office.members {
        conn.execute(
            "INSERT OR IGNORE INTO reception_office_members (office_name, user) VALUES (?1, ?2)",
            params![office.name, member],
        )?;
    }
    Ok(())
}

pub fn get_office(conn: &Connection, name: &str) -> Result<Option<ReceptionOffice>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT name, office_name, director FROM reception_offices WHERE name = ?1")?;

    let result = stmt.query_row(params![name], |row| {
        Ok(ReceptionOffice {
            name: row.get(0)?,
            office_name: row.get(1)?,
            director: row.get(2)?,
            members: Vec::new(),
        })
    });

    let mut office = match result {
        Ok(office) => office,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut stmt = conn
        .prepare("SELECT user FROM reception_office_members WHERE office_name = ?1 ORDER BY user")?;
    office.members = stmt
        .query_map(params![name], |row| row.get(0))?
        .collect::<Result<_, _>>()?;
    Ok(Some(office))
}

/// Office names the user belongs to as a reception member.
pub fn offices_with_member(conn: &Connection, user: &str) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT office_name FROM reception_office_members WHERE user = ?1 ORDER BY office_name",
    )?;
    let names = stmt
        .query_map(params![user], |row| row.get(0))?
        .collect::<Result<_, _>>()?;
    Ok(names)
}

/// Office names the user directs.
pub fn offices_directed_by(conn: &Connection, user: &str) -> Result<Vec<String>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT name FROM reception_offices WHERE director = ?1 ORDER BY name")?;
    let names = stmt
        .query_map(params![user], |row| row.get(0))?
        .collect::<Result<_, _>>()?;
    Ok(names)
}
