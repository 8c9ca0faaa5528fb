// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-message line protocol handed to the generative backend.
//!
//! One line per message: `[HH:MM] author: body`. Order and fields are part
//! of the rendering contract, not incidental -- the prompt refers to the
//! timestamps and authors in these lines, and tests pin the format.

use digestif_core::types::MessageKind;
use digestif_digest::{DigestMessage, TranscriptText};

/// Marker rendered for spoken media whose transcript is unavailable.
pub const UNRECOGNIZED_MARKER: &str = "(unrecognized)";

/// Author display: handle when present, first name otherwise.
pub fn author_display(msg: &DigestMessage) -> String {
    match &msg.author_handle {
        Some(handle) => format!("@{handle}"),
        None => msg.author_name.clone(),
    }
}

/// Wall-clock `HH:MM` slice of a stored timestamp.
fn time_of_day(created_at: &str) -> &str {
    created_at.get(11..16).unwrap_or("??:??")
}

/// Renders one message into its protocol line.
pub fn format_line(msg: &DigestMessage) -> String {
    let time = time_of_day(&msg.created_at);
    let author = author_display(msg);
    let body = match msg.kind {
        MessageKind::Text => msg.content.clone().unwrap_or_default(),
        MessageKind::Sticker => format!("[{}]", msg.kind),
        MessageKind::Photo | MessageKind::Video | MessageKind::Document => {
            match &msg.content {
                Some(caption) => format!("[{}] {caption}", msg.kind),
                None => format!("[{}]", msg.kind),
            }
        }
        MessageKind::Voice | MessageKind::Audio | MessageKind::VideoNote => {
            match &msg.transcript {
                Some(TranscriptText::Resolved(text)) => format!("[{}] {text}", msg.kind),
                _ => format!("[{}] {UNRECOGNIZED_MARKER}", msg.kind),
            }
        }
    };
    format!("[{time}] {author}: {body}")
}

/// Renders the full ordered message set, one line per message.
pub fn format_input(messages: &[DigestMessage]) -> String {
    messages
        .iter()
        .map(format_line)
        .collect::<Vec<_>>()
        .join("\n")
}
