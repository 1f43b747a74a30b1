//! User rows. Only identity and ownership live here; credentials are
//! handled outside this crate.

use super::Database;
use crate::error::AppError;
use crate::types::User;
use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get("user_id")?,
        username: row.get("username")?,
        email: row.get("email")?,
    })
}

impl Database {
    /// Create a user row.
    pub fn create_user(&self, username: &str, email: Option<&str>) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::missing_field("username").into());
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email) VALUES (?1, ?2)",
                params![username, email],
            )?;
            let user_id = conn.last_insert_rowid();

            Ok(User {
                user_id,
                username: username.to_string(),
                email: email.map(|e| e.to_string()),
            })
        })
    }

    /// Look up a user by identity.
    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT * FROM users WHERE user_id = ?1",
                    params![user_id],
                    parse_user_row,
                )
                .optional()?;
            Ok(user)
        })
    }
}
