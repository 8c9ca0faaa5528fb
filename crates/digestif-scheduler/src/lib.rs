// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat schedule registry for the digestif digest service.
//!
//! Owns one recurring timer per active chat, driven by the chat's
//! configured local time and IANA timezone. Timers invoke the digest
//! generator and the text backend gate, deliver the result through the
//! channel adapter, and contain every per-chat failure.

pub mod registry;
pub mod rule;

pub use registry::{DigestScheduler, FireOutcome, SchedulerOptions};
pub use rule::FiringRule;
