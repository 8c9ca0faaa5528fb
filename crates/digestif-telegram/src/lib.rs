// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for the digestif digest service.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling for group activity, normalized inbound messages for the
//! ingestion adapter, and plain-text digest delivery.

pub mod commands;
pub mod handler;

use std::sync::Arc;

use async_trait::async_trait;
use digestif_config::model::TelegramConfig;
use digestif_core::error::DigestifError;
use digestif_core::traits::{ChannelAdapter, PluginAdapter};
use digestif_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundMessage, MessageId, OutboundMessage,
};
use teloxide::prelude::*;
use teloxide::types::{ChatId, Recipient};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telegram channel adapter implementing [`ChannelAdapter`].
///
/// Connects via long polling, filters messages to served group chats, and
/// delivers digests as plain text (digest prose carries no markup).
pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, DigestifError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            DigestifError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(DigestifError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            config,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, DigestifError> {
        // Check if the bot token is valid by calling getMe.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), DigestifError> {
        debug!("Telegram channel shutting down");
        // The polling handle is dropped when TelegramChannel is dropped,
        // which aborts the task. For graceful shutdown, the serve loop
        // stops calling receive() first.
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_markdown: true,
            max_message_length: Some(4096),
        }
    }

    async fn connect(&mut self) -> Result<(), DigestifError> {
        if self.polling_handle.is_some() {
            return Ok(()); // Already connected
        }

        let bot = self.bot.clone();
        let tx = self.inbound_tx.clone();
        let allowed_chats: Arc<Vec<i64>> = Arc::new(self.config.allowed_chats.clone());

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                let allowed = allowed_chats.clone();
                async move {
                    // Filter: group chats only
                    if !handler::is_group(&msg) {
                        debug!(chat_id = msg.chat.id.0, "ignoring non-group message");
                        return respond(());
                    }

                    // Filter: served chats only
                    if !handler::is_allowed_chat(&msg, &allowed) {
                        debug!(chat_id = msg.chat.id.0, "ignoring chat outside allow-list");
                        return respond(());
                    }

                    match handler::to_inbound_message(&msg) {
                        Some(inbound) => {
                            metrics::counter!("digestif_inbound_messages_total").increment(1);
                            if tx.send(inbound).await.is_err() {
                                warn!("inbound channel closed, dropping message");
                            }
                        }
                        None => {
                            debug!(msg_id = msg.id.0, "ignoring unsupported message type");
                        }
                    }

                    respond(())
                }
            });

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {}) // Silently ignore non-message updates
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, DigestifError> {
        let sent = self
            .bot
            .send_message(Recipient::Id(ChatId(msg.chat_id)), &msg.text)
            .await
            .map_err(|e| DigestifError::Channel {
                message: format!("failed to send message: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn receive(&self) -> Result<InboundMessage, DigestifError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| DigestifError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_requires_bot_token() {
        let config = TelegramConfig {
            bot_token: None,
            allowed_chats: vec![],
        };
        assert!(TelegramChannel::new(config).is_err());
    }

    #[test]
    fn new_rejects_empty_token() {
        let config = TelegramConfig {
            bot_token: Some(String::new()),
            allowed_chats: vec![],
        };
        assert!(TelegramChannel::new(config).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        let config = TelegramConfig {
            bot_token: Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11".into()),
            allowed_chats: vec![-100123],
        };
        assert!(TelegramChannel::new(config).is_ok());
    }

    #[test]
    fn capabilities_are_correct() {
        let config = TelegramConfig {
            bot_token: Some("test:token".into()),
            allowed_chats: vec![],
        };
        let channel = TelegramChannel::new(config).unwrap();
        let caps = channel.capabilities();
        assert!(caps.supports_markdown);
        assert_eq!(caps.max_message_length, Some(4096));
    }

    #[test]
    fn plugin_adapter_metadata() {
        let config = TelegramConfig {
            bot_token: Some("test:token".into()),
            allowed_chats: vec![],
        };
        let channel = TelegramChannel::new(config).unwrap();
        assert_eq!(channel.name(), "telegram");
        assert_eq!(channel.version(), semver::Version::new(0, 1, 0));
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }
}
