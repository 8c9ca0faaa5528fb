// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User CRUD operations.

use chrono::Utc;
use digestif_core::types::format_timestamp;
use digestif_core::DigestifError;
use rusqlite::params;

use crate::database::Database;
use crate::models::User;

/// Create or refresh a user's identity.
///
/// The `opted_out` flag is only written on the initial insert (false) and is
/// never touched on conflict; opt-out state survives identity refreshes.
pub async fn upsert_user(
    db: &Database,
    id: i64,
    username: Option<&str>,
    first_name: &str,
) -> Result<(), DigestifError> {
    let username = username.map(|s| s.to_string());
    let first_name = first_name.to_string();
    let now = format_timestamp(&Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, username, first_name, opted_out, updated_at)
                 VALUES (?1, ?2, ?3, 0, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     username = excluded.username,
                     first_name = excluded.first_name,
                     updated_at = excluded.updated_at",
                params![id, username, first_name, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set a user's opt-out flag.
///
/// Unknown users are a no-op: opt-out commands only arrive from users the
/// ingestion path has already upserted.
pub async fn set_user_opt_out(
    db: &Database,
    user_id: i64,
    opted_out: bool,
) -> Result<(), DigestifError> {
    let now = format_timestamp(&Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET opted_out = ?1, updated_at = ?2 WHERE id = ?3",
                params![i64::from(opted_out), now, user_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a user by ID.
pub async fn get_user(db: &Database, id: i64) -> Result<Option<User>, DigestifError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, first_name, opted_out, updated_at
                 FROM users WHERE id = ?1",
            )?;
            let result = stmt.query_row(params![id], |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    first_name: row.get(2)?,
                    opted_out: row.get::<_, i64>(3)? != 0,
                    updated_at: row.get(4)?,
                })
            });
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
