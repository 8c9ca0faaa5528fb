// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Digest generation for the digestif digest service.
//!
//! Assembles one calendar day of chat activity into an ordered, filtered
//! message set ready for rendering: pulls the day window from the message
//! store, drops currently opted-out authors, and attaches transcripts for
//! spoken media.

pub mod generator;
pub mod transcripts;

pub use generator::{day_window, DayDigest, DigestGenerator, DigestMessage, TranscriptText};
pub use transcripts::StoreTranscripts;
