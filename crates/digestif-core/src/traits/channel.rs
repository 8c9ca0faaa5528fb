// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the messaging platform integration (Telegram).

use async_trait::async_trait;

use crate::error::DigestifError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, InboundMessage, MessageId, OutboundMessage};

/// Adapter for the bidirectional messaging channel.
///
/// The channel delivers finished digests to chats and feeds observed group
/// activity into the ingestion pipeline.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), DigestifError>;

    /// Sends a message to a chat.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, DigestifError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, DigestifError>;
}
