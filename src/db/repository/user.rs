use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::models::UserProfile;

pub fn insert_user(conn: &Connection, user: &UserProfile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (name, full_name, user_image, enabled, fiska_priority)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.name,
            user.full_name,
            user.user_image,
            user.enabled as i32,
            user.fiska_priority,
        ],
    )?;
    for role in &user.roles {
        conn.execute(
            "INSERT OR IGNORE INTO user_roles (user, role) VALUES (?1, ?2)",
            params![user.name, role.as_str()],
        )?;
    }
    Ok(())
}

pub fn get_user(conn: &Connection, name: &str) -> Result<Option<UserProfile>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name, full_name, user_image, enabled, fiska_priority
         FROM users WHERE name = ?1",
    )?;

    let result = stmt.query_row(params![name], |row| {
        Ok(UserProfile {
            name: row.get(0)?,
            full_name: row.get(1)?,
            user_image: row.get(2)?,
            enabled: row.get::<_, i32>(3)? != 0,
            fiska_priority: row.get(4)?,
            roles: Vec::new(),
        })
    });

    let mut user = match result {
        Ok(user) => user,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    user.roles = roles_of(conn, name)?;
    Ok(Some(user))
}

pub fn roles_of(conn: &Connection, name: &str) -> Result<Vec<Role>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT role FROM user_roles WHERE user = ?1 ORDER BY role")?;
    let rows = stmt.query_map(params![name], |row| row.get::<_, String>(0))?;

    let mut roles = Vec::new();
    for row in rows {
        roles.push(Role::from_str(&row?)?);
    }
    Ok(roles)
}

/// All enabled users, for routing pickers. Ordered by display name.
pub fn list_users(conn: &Connection) -> Result<Vec<UserProfile>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name, full_name, user_image, enabled, fiska_priority
         FROM users WHERE enabled = 1 ORDER BY full_name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(UserProfile {
            name: row.get(0)?,
            full_name: row.get(1)?,
            user_image: row.get(2)?,
            enabled: row.get::<_, i32>(3)? != 0,
            fiska_priority: row.get(4)?,
            roles: Vec::new(),
        })
    })?;

    let mut users: Vec<UserProfile> = rows.collect::<Result<_, _>>()?;
    for user in &mut users {
        user.roles = roles_of(conn, &user.name)?;
    }
    Ok(users)
}
