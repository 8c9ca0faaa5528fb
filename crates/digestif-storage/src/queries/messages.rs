// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.

use std::str::FromStr;

use digestif_core::DigestifError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{AuthoredMessage, MessageKind, StoredMessage};

/// Insert a new message.
///
/// Messages are immutable: re-inserting an existing (chat, message) key is
/// ignored, which dedups platform redeliveries.
pub async fn insert_message(db: &Database, msg: &StoredMessage) -> Result<(), DigestifError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO messages
                     (chat_id, message_id, user_id, kind, content, media_ref, reply_to, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    msg.chat_id,
                    msg.message_id,
                    msg.user_id,
                    msg.kind.to_string(),
                    msg.content,
                    msg.media_ref,
                    msg.reply_to,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get all messages for a chat within an inclusive timestamp range, joined
/// with the author's current opt-out status.
///
/// Ordered by creation time ascending; ties broken by insertion order
/// (rowid), so retrieval never reorders same-timestamp messages.
pub async fn get_messages_in_range(
    db: &Database,
    chat_id: i64,
    start_ts: &str,
    end_ts: &str,
) -> Result<Vec<AuthoredMessage>, DigestifError> {
    let start_ts = start_ts.to_string();
    let end_ts = end_ts.to_string();
    db.connection()
        .call(move |conn| {
            let mut messages = Vec::new();
            let mut stmt = conn.prepare(
                "SELECT m.chat_id, m.message_id, m.user_id, m.kind, m.content,
                        m.media_ref, m.reply_to, m.created_at,
                        u.first_name, u.username, u.opted_out
                 FROM messages m
                 JOIN users u ON u.id = m.user_id
                 WHERE m.chat_id = ?1 AND m.created_at BETWEEN ?2 AND ?3
                 ORDER BY m.created_at ASC, m.rowid ASC",
            )?;
            let rows = stmt.query_map(params![chat_id, start_ts, end_ts], |row| {
                let kind_raw: String = row.get(3)?;
                let kind = MessageKind::from_str(&kind_raw).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(AuthoredMessage {
                    message: StoredMessage {
                        chat_id: row.get(0)?,
                        message_id: row.get(1)?,
                        user_id: row.get(2)?,
                        kind,
                        content: row.get(4)?,
                        media_ref: row.get(5)?,
                        reply_to: row.get(6)?,
                        created_at: row.get(7)?,
                    },
                    author_name: row.get(8)?,
                    author_handle: row.get(9)?,
                    author_opted_out: row.get::<_, i64>(10)? != 0,
                })
            })?;
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
