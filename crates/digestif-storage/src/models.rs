// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `digestif-core::types` for use across
//! adapter trait boundaries. This module re-exports them for convenience
//! within the storage crate, and defines the defaults applied to newly
//! observed chats.

pub use digestif_core::types::{
    AuthoredMessage, Chat, ChatSettingsPatch, MessageKind, StoredMessage, Transcript, User,
};

/// Digest settings applied to a chat row the first time it is observed.
#[derive(Debug, Clone)]
pub struct ChatDefaults {
    pub report_time: String,
    pub timezone: String,
    pub target_mention: String,
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            report_time: "21:00".to_string(),
            timezone: "UTC".to_string(),
            target_mention: "@all".to_string(),
        }
    }
}
