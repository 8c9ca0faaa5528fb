// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory MessageStore for deterministic testing.
//!
//! `MockStore` keeps chats, users, messages, and transcripts in plain maps
//! behind a single mutex, reproducing the SQLite store's observable
//! semantics: upsert rules, inclusive range windows, insertion-order
//! tie-breaks, and idempotent transcript writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use digestif_core::types::{
    AuthoredMessage, Chat, ChatSettingsPatch, StoredMessage, Transcript, User,
};
use digestif_core::{
    AdapterType, DigestifError, HealthStatus, MessageStore, PluginAdapter,
};

#[derive(Default)]
struct StoreState {
    chats: HashMap<i64, Chat>,
    users: HashMap<i64, User>,
    /// Kept in insertion order; range queries stable-sort by timestamp so
    /// equal timestamps preserve this order.
    messages: Vec<StoredMessage>,
    transcripts: HashMap<(i64, String), Transcript>,
}

/// An in-memory mock message store.
pub struct MockStore {
    state: Mutex<StoreState>,
    fail: AtomicBool,
}

impl MockStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every subsequent operation fail with a storage error,
    /// simulating an unreachable store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail.store(unavailable, Ordering::SeqCst);
    }

    /// Insert a fully specified chat row, bypassing upsert defaults.
    pub async fn put_chat(&self, chat: Chat) {
        self.state.lock().await.chats.insert(chat.id, chat);
    }

    /// Get a user by ID (test inspection).
    pub async fn user(&self, id: i64) -> Option<User> {
        self.state.lock().await.users.get(&id).cloned()
    }

    /// Total number of stored messages across all chats (test inspection).
    pub async fn message_count(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    fn check_available(&self) -> Result<(), DigestifError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(DigestifError::Storage {
                source: "mock store unavailable".into(),
            })
        } else {
            Ok(())
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockStore {
    fn name(&self) -> &str {
        "mock-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DigestifError> {
        if self.fail.load(Ordering::SeqCst) {
            Ok(HealthStatus::Unhealthy("mock store unavailable".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), DigestifError> {
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MockStore {
    async fn initialize(&self) -> Result<(), DigestifError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), DigestifError> {
        Ok(())
    }

    async fn get_chat(&self, id: i64) -> Result<Option<Chat>, DigestifError> {
        self.check_available()?;
        Ok(self.state.lock().await.chats.get(&id).cloned())
    }

    async fn list_active_chats(&self) -> Result<Vec<Chat>, DigestifError> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut chats: Vec<Chat> = state.chats.values().filter(|c| c.active).cloned().collect();
        chats.sort_by_key(|c| c.id);
        Ok(chats)
    }

    async fn upsert_chat(&self, id: i64, title: &str, kind: &str) -> Result<(), DigestifError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        match state.chats.get_mut(&id) {
            Some(chat) => {
                chat.title = title.to_string();
                chat.kind = kind.to_string();
            }
            None => {
                state.chats.insert(
                    id,
                    Chat {
                        id,
                        title: title.to_string(),
                        kind: kind.to_string(),
                        report_time: "21:00".to_string(),
                        timezone: "UTC".to_string(),
                        target_mention: "@all".to_string(),
                        active: true,
                        created_at: "2026-01-01T00:00:00.000Z".to_string(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn update_chat_settings(
        &self,
        id: i64,
        patch: &ChatSettingsPatch,
    ) -> Result<(), DigestifError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if let Some(chat) = state.chats.get_mut(&id) {
            if let Some(ref report_time) = patch.report_time {
                chat.report_time = report_time.clone();
            }
            if let Some(ref timezone) = patch.timezone {
                chat.timezone = timezone.clone();
            }
            if let Some(ref target_mention) = patch.target_mention {
                chat.target_mention = target_mention.clone();
            }
            if let Some(active) = patch.active {
                chat.active = active;
            }
        }
        Ok(())
    }

    async fn upsert_user(
        &self,
        id: i64,
        username: Option<&str>,
        first_name: &str,
    ) -> Result<(), DigestifError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        match state.users.get_mut(&id) {
            Some(user) => {
                user.username = username.map(|s| s.to_string());
                user.first_name = first_name.to_string();
            }
            None => {
                state.users.insert(
                    id,
                    User {
                        id,
                        username: username.map(|s| s.to_string()),
                        first_name: first_name.to_string(),
                        opted_out: false,
                        updated_at: "2026-01-01T00:00:00.000Z".to_string(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn set_user_opt_out(
        &self,
        user_id: i64,
        opted_out: bool,
    ) -> Result<(), DigestifError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.opted_out = opted_out;
        }
        Ok(())
    }

    async fn insert_message(&self, msg: &StoredMessage) -> Result<(), DigestifError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let exists = state
            .messages
            .iter()
            .any(|m| m.chat_id == msg.chat_id && m.message_id == msg.message_id);
        if !exists {
            state.messages.push(msg.clone());
        }
        Ok(())
    }

    async fn get_messages_in_range(
        &self,
        chat_id: i64,
        start_ts: &str,
        end_ts: &str,
    ) -> Result<Vec<AuthoredMessage>, DigestifError> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut rows: Vec<AuthoredMessage> = state
            .messages
            .iter()
            .filter(|m| {
                m.chat_id == chat_id
                    && m.created_at.as_str() >= start_ts
                    && m.created_at.as_str() <= end_ts
            })
            .map(|m| {
                let user = state.users.get(&m.user_id);
                AuthoredMessage {
                    message: m.clone(),
                    author_name: user
                        .map(|u| u.first_name.clone())
                        .unwrap_or_else(|| "unknown".to_string()),
                    author_handle: user.and_then(|u| u.username.clone()),
                    author_opted_out: user.map(|u| u.opted_out).unwrap_or(false),
                }
            })
            .collect();
        // Stable sort preserves insertion order for equal timestamps.
        rows.sort_by(|a, b| a.message.created_at.cmp(&b.message.created_at));
        Ok(rows)
    }

    async fn get_transcript(
        &self,
        message_id: i64,
        media_ref: &str,
    ) -> Result<Option<Transcript>, DigestifError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .transcripts
            .get(&(message_id, media_ref.to_string()))
            .cloned())
    }

    async fn put_transcript(&self, transcript: &Transcript) -> Result<(), DigestifError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let key = (transcript.message_id, transcript.media_ref.clone());
        state.transcripts.entry(key).or_insert_with(|| transcript.clone());
        Ok(())
    }
}
