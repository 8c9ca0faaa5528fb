// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Digest rendering for the digestif digest service.
//!
//! Turns an assembled message set into final digest prose: a fixed line
//! protocol feeds the generative backend, and a deterministic template
//! guarantees a digest exists when the backend is unreachable, errors, or
//! times out.

pub mod backend;
pub mod lines;
pub mod template;

pub use backend::{Backend, RenderContext, RenderOptions, TextBackendGate};
