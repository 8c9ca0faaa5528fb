// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the digestif daily-digest service.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the digestif workspace. All adapter crates
//! implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::DigestifError;
pub use types::{AdapterType, HealthStatus, MessageId, MessageKind};

// Re-export all adapter traits at crate root.
pub use traits::{
    ChannelAdapter, MessageStore, PluginAdapter, ProviderAdapter, TranscriptResolver,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn digestif_error_has_all_variants() {
        // Verify all 7 error variants exist and can be constructed.
        let _config = DigestifError::Config("test".into());
        let _schedule = DigestifError::InvalidSchedule {
            reason: "test".into(),
        };
        let _storage = DigestifError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _channel = DigestifError::Channel {
            message: "test".into(),
            source: None,
        };
        let _provider = DigestifError::Provider {
            message: "test".into(),
            source: None,
        };
        let _timeout = DigestifError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = DigestifError::Internal("test".into());
    }

    #[test]
    fn invalid_schedule_error_message_carries_reason() {
        let err = DigestifError::InvalidSchedule {
            reason: "report_time '25:00' is not a valid HH:MM".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("invalid schedule"));
        assert!(rendered.contains("25:00"));
    }

    #[test]
    fn adapter_type_round_trips() {
        let variants = [
            AdapterType::Channel,
            AdapterType::Provider,
            AdapterType::Storage,
            AdapterType::Transcriber,
        ];
        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // If any trait module is missing or has a compile error, this test
        // won't compile.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_message_store<T: MessageStore>() {}
        fn _assert_transcript_resolver<T: TranscriptResolver>() {}
    }
}
