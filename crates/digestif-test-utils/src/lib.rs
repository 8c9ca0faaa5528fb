// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for digestif integration tests.
//!
//! Provides mock implementations of the core adapter traits so pipeline
//! tests run without a database file, a bot token, or an API key.

pub mod mock_channel;
pub mod mock_provider;
pub mod mock_store;

pub use mock_channel::MockChannel;
pub use mock_provider::MockProvider;
pub use mock_store::MockStore;
