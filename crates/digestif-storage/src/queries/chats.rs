// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat CRUD operations.

use chrono::Utc;
use digestif_core::types::format_timestamp;
use digestif_core::DigestifError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{Chat, ChatDefaults, ChatSettingsPatch};

fn row_to_chat(row: &rusqlite::Row<'_>) -> Result<Chat, rusqlite::Error> {
    Ok(Chat {
        id: row.get(0)?,
        title: row.get(1)?,
        kind: row.get(2)?,
        report_time: row.get(3)?,
        timezone: row.get(4)?,
        target_mention: row.get(5)?,
        active: row.get::<_, i64>(6)? != 0,
        created_at: row.get(7)?,
    })
}

const CHAT_COLUMNS: &str =
    "id, title, kind, report_time, timezone, target_mention, active, created_at";

/// Create the chat on first observed activity, or refresh its title/kind.
///
/// Digest settings (`report_time`, `timezone`, `target_mention`, `active`)
/// are only written on the initial insert, from `defaults`.
pub async fn upsert_chat(
    db: &Database,
    id: i64,
    title: &str,
    kind: &str,
    defaults: &ChatDefaults,
) -> Result<(), DigestifError> {
    let title = title.to_string();
    let kind = kind.to_string();
    let defaults = defaults.clone();
    let now = format_timestamp(&Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chats (id, title, kind, report_time, timezone, target_mention, active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
                 ON CONFLICT(id) DO UPDATE SET title = excluded.title, kind = excluded.kind",
                params![
                    id,
                    title,
                    kind,
                    defaults.report_time,
                    defaults.timezone,
                    defaults.target_mention,
                    now,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a chat by ID.
pub async fn get_chat(db: &Database, id: i64) -> Result<Option<Chat>, DigestifError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_chat);
            match result {
                Ok(chat) => Ok(Some(chat)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List every chat with the active flag set.
pub async fn list_active_chats(db: &Database) -> Result<Vec<Chat>, DigestifError> {
    db.connection()
        .call(move |conn| {
            let mut chats = Vec::new();
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHAT_COLUMNS} FROM chats WHERE active = 1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map([], row_to_chat)?;
            for row in rows {
                chats.push(row?);
            }
            Ok(chats)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a partial settings update; `None` fields are left unchanged.
pub async fn update_chat_settings(
    db: &Database,
    id: i64,
    patch: &ChatSettingsPatch,
) -> Result<(), DigestifError> {
    let patch = patch.clone();
    db.connection()
        .call(move |conn| {
            let mut sets: Vec<&str> = Vec::new();
            let mut values: Vec<rusqlite::types::Value> = Vec::new();

            if let Some(report_time) = patch.report_time {
                sets.push("report_time = ?");
                values.push(report_time.into());
            }
            if let Some(timezone) = patch.timezone {
                sets.push("timezone = ?");
                values.push(timezone.into());
            }
            if let Some(target_mention) = patch.target_mention {
                sets.push("target_mention = ?");
                values.push(target_mention.into());
            }
            if let Some(active) = patch.active {
                sets.push("active = ?");
                values.push(i64::from(active).into());
            }

            if sets.is_empty() {
                return Ok(());
            }

            let sql = format!("UPDATE chats SET {} WHERE id = ?", sets.join(", "));
            values.push(id.into());
            conn.execute(&sql, rusqlite::params_from_iter(values))?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn upsert_creates_chat_with_defaults() {
        let (db, _dir) = setup_db().await;
        let defaults = ChatDefaults {
            report_time: "08:00".to_string(),
            timezone: "Europe/Berlin".to_string(),
            target_mention: "@team".to_string(),
        };

        upsert_chat(&db, -100123, "Weekend Plans", "supergroup", &defaults)
            .await
            .unwrap();

        let chat = get_chat(&db, -100123).await.unwrap().unwrap();
        assert_eq!(chat.title, "Weekend Plans");
        assert_eq!(chat.kind, "supergroup");
        assert_eq!(chat.report_time, "08:00");
        assert_eq!(chat.timezone, "Europe/Berlin");
        assert_eq!(chat.target_mention, "@team");
        assert!(chat.active);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_refreshes_title_but_not_settings() {
        let (db, _dir) = setup_db().await;
        let defaults = ChatDefaults::default();

        upsert_chat(&db, -1, "Old Title", "group", &defaults).await.unwrap();
        update_chat_settings(
            &db,
            -1,
            &ChatSettingsPatch {
                report_time: Some("07:30".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        // Re-observing the chat with a new title must not reset report_time.
        upsert_chat(&db, -1, "New Title", "group", &defaults).await.unwrap();

        let chat = get_chat(&db, -1).await.unwrap().unwrap();
        assert_eq!(chat.title, "New Title");
        assert_eq!(chat.report_time, "07:30");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_nonexistent_chat_returns_none() {
        let (db, _dir) = setup_db().await;
        let result = get_chat(&db, 42).await.unwrap();
        assert!(result.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_active_chats_skips_inactive() {
        let (db, _dir) = setup_db().await;
        let defaults = ChatDefaults::default();

        upsert_chat(&db, -1, "Active", "group", &defaults).await.unwrap();
        upsert_chat(&db, -2, "Disabled", "group", &defaults).await.unwrap();
        update_chat_settings(
            &db,
            -2,
            &ChatSettingsPatch {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let active = list_active_chats(&db).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, -1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn empty_settings_patch_is_a_no_op() {
        let (db, _dir) = setup_db().await;
        let defaults = ChatDefaults::default();
        upsert_chat(&db, -1, "Chat", "group", &defaults).await.unwrap();

        update_chat_settings(&db, -1, &ChatSettingsPatch::default())
            .await
            .unwrap();

        let chat = get_chat(&db, -1).await.unwrap().unwrap();
        assert_eq!(chat.report_time, "21:00");
        assert!(chat.active);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn full_settings_patch_updates_all_fields() {
        let (db, _dir) = setup_db().await;
        let defaults = ChatDefaults::default();
        upsert_chat(&db, -1, "Chat", "group", &defaults).await.unwrap();

        update_chat_settings(
            &db,
            -1,
            &ChatSettingsPatch {
                report_time: Some("06:15".to_string()),
                timezone: Some("Asia/Tokyo".to_string()),
                target_mention: Some("@everyone".to_string()),
                active: Some(false),
            },
        )
        .await
        .unwrap();

        let chat = get_chat(&db, -1).await.unwrap().unwrap();
        assert_eq!(chat.report_time, "06:15");
        assert_eq!(chat.timezone, "Asia/Tokyo");
        assert_eq!(chat.target_mention, "@everyone");
        assert!(!chat.active);

        db.close().await.unwrap();
    }
}
