// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcript CRUD operations.

use digestif_core::DigestifError;
use rusqlite::params;

use crate::database::Database;
use crate::models::Transcript;

/// Store a transcript for a (message, media) pair.
///
/// Idempotent: the first row wins and any later write for the same composite
/// key is a no-op, so a cached transcript is never recomputed or replaced.
pub async fn put_transcript(db: &Database, transcript: &Transcript) -> Result<(), DigestifError> {
    let transcript = transcript.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO transcripts
                     (message_id, media_ref, text, language, duration_secs, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    transcript.message_id,
                    transcript.media_ref,
                    transcript.text,
                    transcript.language,
                    transcript.duration_secs,
                    transcript.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get the transcript for a (message, media) pair, if one exists.
pub async fn get_transcript(
    db: &Database,
    message_id: i64,
    media_ref: &str,
) -> Result<Option<Transcript>, DigestifError> {
    let media_ref = media_ref.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, media_ref, text, language, duration_secs, created_at
                 FROM transcripts WHERE message_id = ?1 AND media_ref = ?2",
            )?;
            let result = stmt.query_row(params![message_id, media_ref], |row| {
                Ok(Transcript {
                    message_id: row.get(0)?,
                    media_ref: row.get(1)?,
                    text: row.get(2)?,
                    language: row.get(3)?,
                    duration_secs: row.get(4)?,
                    created_at: row.get(5)?,
                })
            });
            match result {
                Ok(transcript) => Ok(Some(transcript)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
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

    fn make_transcript(message_id: i64, media_ref: &str, text: &str) -> Transcript {
        Transcript {
            message_id,
            media_ref: media_ref.to_string(),
            text: text.to_string(),
            language: Some("de".to_string()),
            duration_secs: Some(12.4),
            created_at: "2026-03-01T09:00:05.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn put_and_get_transcript_roundtrips() {
        let (db, _dir) = setup_db().await;
        let t = make_transcript(10, "file-abc", "hello from the voice note");

        put_transcript(&db, &t).await.unwrap();

        let stored = get_transcript(&db, 10, "file-abc").await.unwrap().unwrap();
        assert_eq!(stored.text, "hello from the voice note");
        assert_eq!(stored.language.as_deref(), Some("de"));
        assert_eq!(stored.duration_secs, Some(12.4));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn second_write_for_same_key_is_a_no_op() {
        let (db, _dir) = setup_db().await;

        put_transcript(&db, &make_transcript(10, "file-abc", "first version"))
            .await
            .unwrap();
        put_transcript(&db, &make_transcript(10, "file-abc", "second version"))
            .await
            .unwrap();

        let stored = get_transcript(&db, 10, "file-abc").await.unwrap().unwrap();
        assert_eq!(
            stored.text, "first version",
            "pre-existing transcript must always win"
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn distinct_media_refs_are_independent() {
        let (db, _dir) = setup_db().await;

        put_transcript(&db, &make_transcript(10, "file-a", "note a")).await.unwrap();
        put_transcript(&db, &make_transcript(10, "file-b", "note b")).await.unwrap();

        assert_eq!(
            get_transcript(&db, 10, "file-a").await.unwrap().unwrap().text,
            "note a"
        );
        assert_eq!(
            get_transcript(&db, 10, "file-b").await.unwrap().unwrap().text,
            "note b"
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_transcript_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_transcript(&db, 99, "nope").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
