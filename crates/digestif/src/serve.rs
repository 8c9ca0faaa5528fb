// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `digestif serve` command implementation.
//!
//! Wires the full pipeline: SQLite message store, optional Anthropic
//! backend behind the render gate, Telegram channel, digest generator, and
//! the per-chat schedule registry. The serve loop ingests group activity
//! and executes digest commands until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use digestif_anthropic::AnthropicProvider;
use digestif_config::model::DigestifConfig;
use digestif_core::types::{ChatSettingsPatch, InboundMessage, MessageKind, OutboundMessage};
use digestif_core::{
    ChannelAdapter, DigestifError, MessageStore, PluginAdapter, ProviderAdapter,
};
use digestif_digest::{DigestGenerator, StoreTranscripts};
use digestif_render::{RenderOptions, TextBackendGate};
use digestif_scheduler::{DigestScheduler, FiringRule, SchedulerOptions};
use digestif_storage::{ChatDefaults, SqliteStore};
use digestif_telegram::commands::{parse_command, DigestCommand, USAGE};
use digestif_telegram::TelegramChannel;

use crate::ingest;

/// Shared handles the serve loop operates on.
pub(crate) struct ServeCtx {
    pub(crate) store: Arc<dyn MessageStore>,
    pub(crate) scheduler: DigestScheduler,
    pub(crate) channel: Arc<dyn ChannelAdapter>,
}

/// Runs the `digestif serve` command.
pub async fn run_serve(config: DigestifConfig) -> Result<(), DigestifError> {
    init_tracing(&config.agent.log_level);
    info!(name = %config.agent.name, "starting digestif serve");

    // Storage.
    let defaults = ChatDefaults {
        report_time: config.digest.default_report_time.clone(),
        timezone: config.digest.default_timezone.clone(),
        target_mention: config.digest.default_target_mention.clone(),
    };
    let sqlite = SqliteStore::new(config.storage.clone(), defaults);
    sqlite.initialize().await?;
    let store: Arc<dyn MessageStore> = Arc::new(sqlite);

    // Generative backend is optional; without credentials the render gate
    // stays on its deterministic fallback.
    let provider: Option<Arc<dyn ProviderAdapter>> = match AnthropicProvider::new(&config) {
        Ok(p) => Some(Arc::new(p)),
        Err(e) => {
            warn!(error = %e, "generative backend unavailable, using deterministic digests");
            None
        }
    };

    let gate = Arc::new(TextBackendGate::new(
        provider,
        RenderOptions {
            model: config.anthropic.default_model.clone(),
            max_tokens: config.anthropic.max_tokens,
            generation_timeout: Duration::from_secs(config.digest.generation_timeout_secs),
            max_digest_chars: config.digest.max_digest_chars,
        },
    ));

    // Channel.
    let mut telegram = TelegramChannel::new(config.telegram.clone())?;
    telegram.connect().await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);

    // Digest pipeline and schedule registry.
    let transcripts = Arc::new(StoreTranscripts::new(store.clone()));
    let generator = Arc::new(DigestGenerator::new(store.clone(), transcripts));
    let scheduler = DigestScheduler::new(
        store.clone(),
        generator,
        gate,
        channel.clone(),
        SchedulerOptions {
            delivery_timeout: Duration::from_secs(config.digest.delivery_timeout_secs),
        },
    );

    // Re-arm every active chat's timer.
    let chats = store.list_active_chats().await?;
    scheduler.reconcile(&chats).await;

    let ctx = ServeCtx {
        store,
        scheduler,
        channel,
    };

    info!("digestif serving");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            inbound = ctx.channel.receive() => match inbound {
                Ok(msg) => handle_inbound(&ctx, msg).await,
                Err(e) => {
                    error!(error = %e, "inbound channel closed");
                    break;
                }
            }
        }
    }

    ctx.scheduler.shutdown().await;
    ctx.store.shutdown().await?;
    info!("digestif stopped");
    Ok(())
}

/// Handle one inbound message: command execution or plain ingestion.
pub(crate) async fn handle_inbound(ctx: &ServeCtx, msg: InboundMessage) {
    // Chat and author exist before any command or message row lands.
    if let Err(e) = ctx
        .store
        .upsert_chat(msg.chat_id, &msg.chat_title, &msg.chat_kind)
        .await
    {
        error!(chat_id = msg.chat_id, error = %e, "chat upsert failed");
        return;
    }
    if let Err(e) = ctx
        .store
        .upsert_user(msg.user_id, msg.user_handle.as_deref(), &msg.user_name)
        .await
    {
        error!(user_id = msg.user_id, error = %e, "user upsert failed");
        return;
    }

    ensure_registered(ctx, msg.chat_id).await;

    let command = if msg.kind == MessageKind::Text {
        msg.content.as_deref().and_then(parse_command)
    } else {
        None
    };

    match command {
        Some(Ok(cmd)) => {
            debug!(chat_id = msg.chat_id, ?cmd, "executing digest command");
            let reply = execute_command(ctx, msg.chat_id, msg.user_id, cmd).await;
            send_reply(ctx, msg.chat_id, reply).await;
        }
        Some(Err(usage)) => {
            send_reply(ctx, msg.chat_id, usage).await;
        }
        None => {
            if let Err(e) = ingest::record(&ctx.store, &msg).await {
                error!(chat_id = msg.chat_id, error = %e, "message ingestion failed");
            }
        }
    }
}

/// Schedule a newly observed chat if it is active and not yet registered.
async fn ensure_registered(ctx: &ServeCtx, chat_id: i64) {
    if ctx.scheduler.is_registered(chat_id).await {
        return;
    }
    match ctx.store.get_chat(chat_id).await {
        Ok(Some(chat)) if chat.active => {
            if let Err(e) = ctx.scheduler.register(&chat).await {
                warn!(chat_id, error = %e, "could not schedule newly observed chat");
            }
        }
        Ok(_) => {}
        Err(e) => warn!(chat_id, error = %e, "could not load chat for scheduling"),
    }
}

/// Execute a digest command and produce the reply text.
pub(crate) async fn execute_command(
    ctx: &ServeCtx,
    chat_id: i64,
    user_id: i64,
    command: DigestCommand,
) -> String {
    match command {
        DigestCommand::Preview => match ctx.scheduler.trigger(chat_id).await {
            Ok(text) => text,
            // Previews surface errors to the caller instead of silently
            // falling back.
            Err(e) => format!("Could not generate the preview: {e}"),
        },
        DigestCommand::SetTime(value) => {
            update_schedule(ctx, chat_id, Some(value), None).await
        }
        DigestCommand::SetTimezone(value) => {
            update_schedule(ctx, chat_id, None, Some(value)).await
        }
        DigestCommand::SetMention(value) => {
            let patch = ChatSettingsPatch {
                target_mention: Some(value.clone()),
                ..Default::default()
            };
            match ctx.store.update_chat_settings(chat_id, &patch).await {
                Ok(()) => format!("Digests will address {value}."),
                Err(e) => format!("Could not save the mention: {e}"),
            }
        }
        DigestCommand::Enable => set_active(ctx, chat_id, true).await,
        DigestCommand::Disable => set_active(ctx, chat_id, false).await,
        DigestCommand::OptOut => match ctx.store.set_user_opt_out(user_id, true).await {
            Ok(()) => "Your messages will be excluded from future digests.".to_string(),
            Err(e) => format!("Could not update your opt-out: {e}"),
        },
        DigestCommand::OptIn => match ctx.store.set_user_opt_out(user_id, false).await {
            Ok(()) => "Your messages will be included in future digests.".to_string(),
            Err(e) => format!("Could not update your opt-out: {e}"),
        },
        DigestCommand::Help => USAGE.to_string(),
    }
}

/// Validate, persist, and re-arm a schedule change.
///
/// Validation runs before anything is stored; an invalid value leaves both
/// the stored settings and the live timer untouched.
async fn update_schedule(
    ctx: &ServeCtx,
    chat_id: i64,
    report_time: Option<String>,
    timezone: Option<String>,
) -> String {
    let chat = match ctx.store.get_chat(chat_id).await {
        Ok(Some(chat)) => chat,
        Ok(None) => return "This chat is not known yet.".to_string(),
        Err(e) => return format!("Could not load chat settings: {e}"),
    };

    let new_time = report_time.clone().unwrap_or_else(|| chat.report_time.clone());
    let new_zone = timezone.clone().unwrap_or_else(|| chat.timezone.clone());
    if let Err(e) = FiringRule::parse(&new_time, &new_zone) {
        return e.to_string();
    }

    let patch = ChatSettingsPatch {
        report_time,
        timezone,
        ..Default::default()
    };
    if let Err(e) = ctx.store.update_chat_settings(chat_id, &patch).await {
        return format!("Could not save the schedule: {e}");
    }

    if chat.active {
        let mut updated = chat;
        updated.report_time = new_time.clone();
        updated.timezone = new_zone.clone();
        if let Err(e) = ctx.scheduler.register(&updated).await {
            return e.to_string();
        }
    }

    format!("Daily digest scheduled at {new_time} ({new_zone}).")
}

/// Toggle the digest for a chat and adjust its timer.
async fn set_active(ctx: &ServeCtx, chat_id: i64, active: bool) -> String {
    let patch = ChatSettingsPatch {
        active: Some(active),
        ..Default::default()
    };
    if let Err(e) = ctx.store.update_chat_settings(chat_id, &patch).await {
        return format!("Could not save the setting: {e}");
    }

    if active {
        match ctx.store.get_chat(chat_id).await {
            Ok(Some(chat)) => match ctx.scheduler.register(&chat).await {
                Ok(()) => format!(
                    "Daily digest enabled, delivering at {} ({}).",
                    chat.report_time, chat.timezone
                ),
                Err(e) => e.to_string(),
            },
            Ok(None) => "This chat is not known yet.".to_string(),
            Err(e) => format!("Could not load chat settings: {e}"),
        }
    } else {
        ctx.scheduler.unregister(chat_id).await;
        "Daily digest disabled.".to_string()
    }
}

/// Best-effort reply into the chat.
async fn send_reply(ctx: &ServeCtx, chat_id: i64, text: String) {
    if let Err(e) = ctx.channel.send(OutboundMessage { chat_id, text }).await {
        warn!(chat_id, error = %e, "could not deliver command reply");
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("digestif={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use digestif_render::Backend;
    use digestif_test_utils::{MockChannel, MockStore};

    struct Fixture {
        ctx: ServeCtx,
        store: Arc<MockStore>,
        channel: Arc<MockChannel>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MockStore::new());
        let channel = Arc::new(MockChannel::new());
        let dyn_store: Arc<dyn MessageStore> = store.clone();
        let transcripts = Arc::new(StoreTranscripts::new(dyn_store.clone()));
        let generator = Arc::new(DigestGenerator::new(dyn_store.clone(), transcripts));
        let gate = Arc::new(TextBackendGate::with_backend(
            None,
            RenderOptions::default(),
            Backend::Fallback,
        ));
        let scheduler = DigestScheduler::new(
            dyn_store.clone(),
            generator,
            gate,
            channel.clone(),
            SchedulerOptions::default(),
        );
        Fixture {
            ctx: ServeCtx {
                store: dyn_store,
                scheduler,
                channel: channel.clone(),
            },
            store,
            channel,
        }
    }

    async fn seed_chat(f: &Fixture) {
        f.store.upsert_chat(-1, "Test Chat", "group").await.unwrap();
        f.store.upsert_user(7, Some("alice"), "Alice").await.unwrap();
    }

    #[tokio::test]
    async fn opt_out_command_flips_the_flag() {
        let f = fixture();
        seed_chat(&f).await;

        let reply = execute_command(&f.ctx, -1, 7, DigestCommand::OptOut).await;
        assert!(reply.contains("excluded"));
        assert!(f.store.user(7).await.unwrap().opted_out);

        let reply = execute_command(&f.ctx, -1, 7, DigestCommand::OptIn).await;
        assert!(reply.contains("included"));
        assert!(!f.store.user(7).await.unwrap().opted_out);
    }

    #[tokio::test]
    async fn set_time_validates_before_storing() {
        let f = fixture();
        seed_chat(&f).await;

        let reply =
            execute_command(&f.ctx, -1, 7, DigestCommand::SetTime("25:00".to_string())).await;
        assert!(reply.contains("invalid schedule"));

        let chat = f.store.get_chat(-1).await.unwrap().unwrap();
        assert_eq!(chat.report_time, "21:00", "invalid value must not be stored");
    }

    #[tokio::test]
    async fn set_time_persists_and_registers() {
        let f = fixture();
        seed_chat(&f).await;

        let reply =
            execute_command(&f.ctx, -1, 7, DigestCommand::SetTime("08:30".to_string())).await;
        assert!(reply.contains("08:30"));

        let chat = f.store.get_chat(-1).await.unwrap().unwrap();
        assert_eq!(chat.report_time, "08:30");
        assert!(f.ctx.scheduler.is_registered(-1).await);
    }

    #[tokio::test]
    async fn set_timezone_validates_against_current_time() {
        let f = fixture();
        seed_chat(&f).await;

        let reply = execute_command(
            &f.ctx,
            -1,
            7,
            DigestCommand::SetTimezone("Europe/Berlin".to_string()),
        )
        .await;
        assert!(reply.contains("Europe/Berlin"));

        let chat = f.store.get_chat(-1).await.unwrap().unwrap();
        assert_eq!(chat.timezone, "Europe/Berlin");
    }

    #[tokio::test]
    async fn disable_unregisters_and_enable_rearms() {
        let f = fixture();
        seed_chat(&f).await;
        execute_command(&f.ctx, -1, 7, DigestCommand::SetTime("21:00".to_string())).await;
        assert!(f.ctx.scheduler.is_registered(-1).await);

        let reply = execute_command(&f.ctx, -1, 7, DigestCommand::Disable).await;
        assert!(reply.contains("disabled"));
        assert!(!f.ctx.scheduler.is_registered(-1).await);
        assert!(!f.store.get_chat(-1).await.unwrap().unwrap().active);

        let reply = execute_command(&f.ctx, -1, 7, DigestCommand::Enable).await;
        assert!(reply.contains("enabled"));
        assert!(f.ctx.scheduler.is_registered(-1).await);
        assert!(f.store.get_chat(-1).await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn preview_returns_empty_state_for_quiet_chat() {
        let f = fixture();
        seed_chat(&f).await;

        let reply = execute_command(&f.ctx, -1, 7, DigestCommand::Preview).await;
        assert!(reply.contains("no digest"));
    }

    #[tokio::test]
    async fn help_returns_usage() {
        let f = fixture();
        let reply = execute_command(&f.ctx, -1, 7, DigestCommand::Help).await;
        assert!(reply.contains("/digest_time"));
    }

    #[tokio::test]
    async fn inbound_text_is_ingested_and_chat_registered() {
        use chrono::{TimeZone, Utc};
        let f = fixture();

        let msg = InboundMessage {
            chat_id: -1,
            chat_title: "Test Chat".to_string(),
            chat_kind: "group".to_string(),
            message_id: 1,
            user_id: 7,
            user_name: "Alice".to_string(),
            user_handle: Some("alice".to_string()),
            kind: MessageKind::Text,
            content: Some("just chatting".to_string()),
            media_ref: None,
            reply_to: None,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        };
        handle_inbound(&f.ctx, msg).await;

        assert_eq!(f.store.message_count().await, 1);
        assert!(f.ctx.scheduler.is_registered(-1).await);
        assert_eq!(f.channel.sent_count().await, 0, "plain messages get no reply");
    }

    #[tokio::test]
    async fn inbound_command_replies_and_is_not_stored() {
        use chrono::{TimeZone, Utc};
        let f = fixture();

        let msg = InboundMessage {
            chat_id: -1,
            chat_title: "Test Chat".to_string(),
            chat_kind: "group".to_string(),
            message_id: 1,
            user_id: 7,
            user_name: "Alice".to_string(),
            user_handle: Some("alice".to_string()),
            kind: MessageKind::Text,
            content: Some("/digest_help".to_string()),
            media_ref: None,
            reply_to: None,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        };
        handle_inbound(&f.ctx, msg).await;

        assert_eq!(f.store.message_count().await, 0, "commands are not digest content");
        assert_eq!(f.channel.sent_count().await, 1);
        assert!(f.channel.sent_messages().await[0].text.contains("/digest_time"));
    }
}
