// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete digest pipeline.
//!
//! Each test wires a real SQLite store on a temp file to the digest
//! generator, the render gate, a mock channel, and the schedule registry,
//! then drives whole fire cycles.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, TimeZone, Utc};

use digestif_config::model::StorageConfig;
use digestif_core::types::{format_timestamp, ChatSettingsPatch, MessageKind, StoredMessage, Transcript};
use digestif_core::{MessageStore, ProviderAdapter};
use digestif_digest::{DigestGenerator, StoreTranscripts};
use digestif_render::{Backend, RenderOptions, TextBackendGate};
use digestif_scheduler::{DigestScheduler, FireOutcome, SchedulerOptions};
use digestif_storage::{ChatDefaults, SqliteStore};
use digestif_test_utils::{MockChannel, MockProvider};

struct Pipeline {
    store: Arc<dyn MessageStore>,
    scheduler: DigestScheduler,
    channel: Arc<MockChannel>,
    provider: Option<Arc<MockProvider>>,
    _dir: tempfile::TempDir,
}

async fn pipeline_with(backend: Backend, provider: Option<Arc<MockProvider>>) -> Pipeline {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("e2e.db");
    let sqlite = SqliteStore::new(
        StorageConfig {
            database_path: db_path.to_str().unwrap().to_string(),
            wal_mode: true,
        },
        ChatDefaults::default(),
    );
    sqlite.initialize().await.unwrap();
    let store: Arc<dyn MessageStore> = Arc::new(sqlite);

    let channel = Arc::new(MockChannel::new());
    let transcripts = Arc::new(StoreTranscripts::new(store.clone()));
    let generator = Arc::new(DigestGenerator::new(store.clone(), transcripts));
    let gate = Arc::new(TextBackendGate::with_backend(
        provider.clone().map(|p| p as Arc<dyn ProviderAdapter>),
        RenderOptions {
            generation_timeout: Duration::from_millis(500),
            ..Default::default()
        },
        backend,
    ));
    let scheduler = DigestScheduler::new(
        store.clone(),
        generator,
        gate,
        channel.clone(),
        SchedulerOptions {
            delivery_timeout: Duration::from_millis(500),
        },
    );

    Pipeline {
        store,
        scheduler,
        channel,
        provider,
        _dir: dir,
    }
}

async fn pipeline() -> Pipeline {
    pipeline_with(Backend::Fallback, None).await
}

/// Yesterday's calendar date in the given zone, relative to the real clock.
fn yesterday_in(tz: chrono_tz::Tz) -> NaiveDate {
    Utc::now()
        .with_timezone(&tz)
        .date_naive()
        .checked_sub_days(Days::new(1))
        .unwrap()
}

/// A UTC store timestamp for a local wall-clock time in `tz`.
fn local_ts(tz: chrono_tz::Tz, date: NaiveDate, hour: u32, minute: u32) -> String {
    let local = tz
        .from_local_datetime(&date.and_hms_opt(hour, minute, 0).unwrap())
        .single()
        .unwrap();
    format_timestamp(&local.with_timezone(&Utc))
}

fn text_message(chat_id: i64, message_id: i64, user_id: i64, text: &str, ts: String) -> StoredMessage {
    StoredMessage {
        chat_id,
        message_id,
        user_id,
        kind: MessageKind::Text,
        content: Some(text.to_string()),
        media_ref: None,
        reply_to: None,
        created_at: ts,
    }
}

// ---- Scenario: Berlin chat, two messages on D, fire summarizes D ----

#[tokio::test]
async fn berlin_fire_covers_exactly_the_ended_day() {
    let p = pipeline().await;
    let berlin = chrono_tz::Europe::Berlin;

    // Chat C1 reports at 21:00 Europe/Berlin.
    p.store.upsert_chat(-1, "C1", "supergroup").await.unwrap();
    p.store
        .update_chat_settings(
            -1,
            &ChatSettingsPatch {
                report_time: Some("21:00".to_string()),
                timezone: Some("Europe/Berlin".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    p.store.upsert_user(1, Some("u1"), "U1").await.unwrap();

    // Two text messages at 10:00 and 14:00 local time on date D (the day
    // that just ended in Berlin).
    let d = yesterday_in(berlin);
    p.store
        .insert_message(&text_message(-1, 1, 1, "morning plan", local_ts(berlin, d, 10, 0)))
        .await
        .unwrap();
    p.store
        .insert_message(&text_message(-1, 2, 1, "afternoon update", local_ts(berlin, d, 14, 0)))
        .await
        .unwrap();

    let outcome = p.scheduler.fire(-1).await;
    match outcome {
        FireOutcome::Delivered { date } => assert_eq!(date, d),
        other => panic!("expected Delivered, got {other:?}"),
    }

    let sent = p.channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("Text messages: 2"));
    assert!(sent[0].text.contains("Statistics: 2 messages"));
    assert!(sent[0].text.contains("@all"));
}

#[tokio::test]
async fn fire_with_activity_only_today_is_suppressed() {
    let p = pipeline().await;
    let berlin = chrono_tz::Europe::Berlin;

    p.store.upsert_chat(-1, "C1", "supergroup").await.unwrap();
    p.store
        .update_chat_settings(
            -1,
            &ChatSettingsPatch {
                timezone: Some("Europe/Berlin".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    p.store.upsert_user(1, Some("u1"), "U1").await.unwrap();

    // Activity exists for today only; yesterday (the report target) is empty.
    // Mid-day local time, so the UTC-space timestamp stays on today's date.
    let today = Utc::now().with_timezone(&berlin).date_naive();
    p.store
        .insert_message(&text_message(-1, 1, 1, "today only", local_ts(berlin, today, 14, 0)))
        .await
        .unwrap();

    let outcome = p.scheduler.fire(-1).await;
    assert!(matches!(outcome, FireOutcome::SkippedEmpty { .. }));
    assert_eq!(p.channel.sent_count().await, 0, "suppressed fires send nothing");
}

// ---- Scenario: U2 opts out after posting; the digest excludes the post ----

#[tokio::test]
async fn opt_out_after_posting_hides_the_message_from_later_digests() {
    let p = pipeline().await;

    p.store.upsert_chat(-1, "C1", "group").await.unwrap();
    p.store.upsert_user(1, Some("u1"), "U1").await.unwrap();
    p.store.upsert_user(2, Some("u2"), "U2").await.unwrap();

    let d = yesterday_in(chrono_tz::UTC);
    p.store
        .insert_message(&text_message(-1, 1, 2, "posted at 09:00", format!("{d}T09:00:00.000Z")))
        .await
        .unwrap();
    p.store
        .insert_message(&text_message(-1, 2, 1, "still visible", format!("{d}T10:00:00.000Z")))
        .await
        .unwrap();

    // U2 opts out later the same day; generation happens after that.
    p.store.set_user_opt_out(2, true).await.unwrap();

    let outcome = p.scheduler.fire(-1).await;
    assert!(matches!(outcome, FireOutcome::Delivered { .. }));

    let sent = p.channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert!(
        sent[0].text.contains("Text messages: 1"),
        "U2's message must be excluded from content"
    );
    assert!(
        sent[0].text.contains("Statistics: 2 messages"),
        "the statistics total still counts the filtered row"
    );
}

// ---- Transcript attachment through the generative line protocol ----

#[tokio::test]
async fn voice_transcript_reaches_the_generative_backend() {
    let provider = Arc::new(MockProvider::with_responses(vec![
        "Summary with voice highlights.".to_string(),
    ]));
    let p = pipeline_with(Backend::Generative, Some(provider)).await;

    p.store.upsert_chat(-1, "C1", "group").await.unwrap();
    p.store.upsert_user(1, Some("alice"), "Alice").await.unwrap();

    let d = yesterday_in(chrono_tz::UTC);
    p.store
        .insert_message(&StoredMessage {
            chat_id: -1,
            message_id: 1,
            user_id: 1,
            kind: MessageKind::Voice,
            content: None,
            media_ref: Some("file-a".to_string()),
            reply_to: None,
            created_at: format!("{d}T09:00:00.000Z"),
        })
        .await
        .unwrap();
    p.store
        .put_transcript(&Transcript {
            message_id: 1,
            media_ref: "file-a".to_string(),
            text: "running late, order without me".to_string(),
            language: Some("en".to_string()),
            duration_secs: Some(4.2),
            created_at: format!("{d}T09:00:05.000Z"),
        })
        .await
        .unwrap();

    let outcome = p.scheduler.fire(-1).await;
    assert!(matches!(outcome, FireOutcome::Delivered { .. }));

    let sent = p.channel.sent_messages().await;
    assert_eq!(sent[0].text, "Summary with voice highlights.");

    // The exact protocol line for the voice message reached the backend.
    let provider = p.provider.as_ref().unwrap();
    let requests = provider.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0].messages[0]
            .content
            .contains("[09:00] @alice: [voice] running late, order without me"),
        "prompt should carry the transcript line, got: {}",
        requests[0].messages[0].content
    );
}

// ---- Reconcile over a real store ----

#[tokio::test]
async fn reconcile_rearms_active_chats_from_storage() {
    let p = pipeline().await;

    p.store.upsert_chat(-1, "Active One", "group").await.unwrap();
    p.store.upsert_chat(-2, "Disabled", "group").await.unwrap();
    p.store.upsert_chat(-3, "Active Two", "group").await.unwrap();
    p.store
        .update_chat_settings(
            -2,
            &ChatSettingsPatch {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let chats = p.store.list_active_chats().await.unwrap();
    let registered = p.scheduler.reconcile(&chats).await;

    assert_eq!(registered, 2);
    assert!(p.scheduler.is_registered(-1).await);
    assert!(!p.scheduler.is_registered(-2).await);
    assert!(p.scheduler.is_registered(-3).await);

    p.scheduler.shutdown().await;
}

// ---- Failure containment with a real store ----

#[tokio::test]
async fn delivery_outage_does_not_cancel_the_schedule() {
    let p = pipeline().await;

    p.store.upsert_chat(-1, "C1", "group").await.unwrap();
    p.store.upsert_user(1, None, "U1").await.unwrap();
    let d = yesterday_in(chrono_tz::UTC);
    p.store
        .insert_message(&text_message(-1, 1, 1, "hello", format!("{d}T09:00:00.000Z")))
        .await
        .unwrap();

    let chat = p.store.get_chat(-1).await.unwrap().unwrap();
    p.scheduler.register(&chat).await.unwrap();

    p.channel.set_fail_sends(true);
    let outcome = p.scheduler.fire(-1).await;
    assert!(matches!(outcome, FireOutcome::Failed { .. }));
    assert!(p.scheduler.is_registered(-1).await, "schedule must survive the outage");

    // Channel recovers; the next cycle delivers normally.
    p.channel.set_fail_sends(false);
    let outcome = p.scheduler.fire(-1).await;
    assert!(matches!(outcome, FireOutcome::Delivered { .. }));

    p.scheduler.shutdown().await;
}
