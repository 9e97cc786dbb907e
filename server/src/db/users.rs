use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::models::{Identity, NewUser};

/// Insert a user row and return its generated id.
pub fn insert_user(conn: &Connection, user: &NewUser<'_>) -> rusqlite::Result<String> {
    let id = Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO users (id, display_name, email, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            user.display_name,
            user.email,
            user.password_hash,
            user.role,
            Utc::now().to_rfc3339()
        ],
    )?;
    Ok(id)
}

/// Look up an identity by primary key. `password_hash` is never selected.
pub fn find_identity(conn: &Connection, id: &str) -> rusqlite::Result<Option<Identity>> {
    conn.query_row(
        "SELECT id, display_name, email, role FROM users WHERE id = ?1",
        params![id],
        |row| {
            Ok(Identity {
                id: row.get(0)?,
                display_name: row.get(1)?,
                email: row.get(2)?,
                role: row.get(3)?,
            })
        },
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::migrations;
    use crate::db::models::ROLE_ADMIN;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        migrations().to_latest(&mut conn).unwrap();
        conn
    }

    #[test]
    fn find_identity_returns_inserted_user() {
        let conn = test_conn();
        let id = insert_user(
            &conn,
            &NewUser {
                display_name: "Admin",
                email: "admin@example.com",
                password_hash: "$argon2id$secret",
                role: ROLE_ADMIN,
            },
        )
        .unwrap();

        let identity = find_identity(&conn, &id).unwrap().unwrap();
        assert_eq!(identity.id, id);
        assert_eq!(identity.display_name, "Admin");
        assert_eq!(identity.role, ROLE_ADMIN);
    }

    #[test]
    fn find_identity_missing_is_none() {
        let conn = test_conn();
        assert_eq!(find_identity(&conn, "nope").unwrap(), None);
    }
}
