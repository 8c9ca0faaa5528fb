// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the digestif digest service.

use thiserror::Error;

/// The primary error type used across all digestif adapter traits and core operations.
#[derive(Debug, Error)]
pub enum DigestifError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// A chat schedule that cannot be registered (malformed report time or
    /// unresolvable timezone). Registration failures leave any previously
    /// installed timer for the chat untouched.
    #[error("invalid schedule: {reason}")]
    InvalidSchedule { reason: String },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (delivery failure, message format, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Text backend errors (API failure, quota, malformed response).
    /// Inside a scheduled fire this triggers the deterministic fallback and
    /// is never surfaced to the chat.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
