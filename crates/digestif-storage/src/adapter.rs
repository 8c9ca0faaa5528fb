// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the MessageStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use digestif_config::model::StorageConfig;
use digestif_core::types::{
    AuthoredMessage, Chat, ChatSettingsPatch, StoredMessage, Transcript,
};
use digestif_core::{AdapterType, DigestifError, HealthStatus, MessageStore, PluginAdapter};

use crate::database::Database;
use crate::models::ChatDefaults;
use crate::queries;

/// SQLite-backed message store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`MessageStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    defaults: ChatDefaults,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given configuration.
    ///
    /// `defaults` supplies the digest settings written to newly observed
    /// chats. The database connection is not opened until `initialize` is
    /// called.
    pub fn new(config: StorageConfig, defaults: ChatDefaults) -> Self {
        Self {
            config,
            defaults,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, DigestifError> {
        self.db.get().ok_or_else(|| DigestifError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DigestifError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DigestifError> {
        // Shutdown delegates to close if the DB was initialized.
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn initialize(&self) -> Result<(), DigestifError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| DigestifError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), DigestifError> {
        self.db()?.close().await
    }

    // --- Chat operations ---

    async fn get_chat(&self, id: i64) -> Result<Option<Chat>, DigestifError> {
        queries::chats::get_chat(self.db()?, id).await
    }

    async fn list_active_chats(&self) -> Result<Vec<Chat>, DigestifError> {
        queries::chats::list_active_chats(self.db()?).await
    }

    async fn upsert_chat(&self, id: i64, title: &str, kind: &str) -> Result<(), DigestifError> {
        queries::chats::upsert_chat(self.db()?, id, title, kind, &self.defaults).await
    }

    async fn update_chat_settings(
        &self,
        id: i64,
        patch: &ChatSettingsPatch,
    ) -> Result<(), DigestifError> {
        queries::chats::update_chat_settings(self.db()?, id, patch).await
    }

    // --- User operations ---

    async fn upsert_user(
        &self,
        id: i64,
        username: Option<&str>,
        first_name: &str,
    ) -> Result<(), DigestifError> {
        queries::users::upsert_user(self.db()?, id, username, first_name).await
    }

    async fn set_user_opt_out(
        &self,
        user_id: i64,
        opted_out: bool,
    ) -> Result<(), DigestifError> {
        queries::users::set_user_opt_out(self.db()?, user_id, opted_out).await
    }

    // --- Message operations ---

    async fn insert_message(&self, msg: &StoredMessage) -> Result<(), DigestifError> {
        queries::messages::insert_message(self.db()?, msg).await
    }

    async fn get_messages_in_range(
        &self,
        chat_id: i64,
        start_ts: &str,
        end_ts: &str,
    ) -> Result<Vec<AuthoredMessage>, DigestifError> {
        queries::messages::get_messages_in_range(self.db()?, chat_id, start_ts, end_ts).await
    }

    // --- Transcript operations ---

    async fn get_transcript(
        &self,
        message_id: i64,
        media_ref: &str,
    ) -> Result<Option<Transcript>, DigestifError> {
        queries::transcripts::get_transcript(self.db()?, message_id, media_ref).await
    }

    async fn put_transcript(&self, transcript: &Transcript) -> Result<(), DigestifError> {
        queries::transcripts::put_transcript(self.db()?, transcript).await
    }
}
