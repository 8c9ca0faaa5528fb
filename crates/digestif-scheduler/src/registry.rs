// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat recurring timer registry.
//!
//! [`DigestScheduler`] owns one live timer per active chat, keyed by chat
//! identifier. Registering a chat atomically replaces any existing timer;
//! timers never stack. Each timer recomputes its next fire instant in the
//! chat's timezone before every sleep and runs the fire cycle when it
//! elapses.
//!
//! Failures inside one chat's fire are fully contained: the supervisor logs
//! the outcome, a best-effort error notice is attempted once, and neither
//! the chat's future recurrence nor any other chat's timer is affected.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use digestif_core::types::{Chat, OutboundMessage};
use digestif_core::{ChannelAdapter, DigestifError, MessageStore};
use digestif_digest::DigestGenerator;
use digestif_render::{RenderContext, TextBackendGate};

use crate::rule::FiringRule;

/// Notice sent to a chat when its scheduled digest cannot be produced.
const ERROR_NOTICE: &str =
    "The daily digest could not be prepared today. It will run again tomorrow as scheduled.";

/// Scheduler tuning knobs.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Bound on one delivery attempt.
    pub delivery_timeout: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            delivery_timeout: Duration::from_secs(30),
        }
    }
}

/// One live timer entry.
struct ScheduledJob {
    rule: FiringRule,
    cancel: CancellationToken,
    _handle: tokio::task::JoinHandle<()>,
}

/// The result of one fire cycle, consumed by the supervisor.
#[derive(Debug)]
pub enum FireOutcome {
    /// A digest was generated and delivered.
    Delivered { date: NaiveDate },
    /// The target date had no renderable content; nothing was sent.
    SkippedEmpty { date: NaiveDate },
    /// The cycle failed; recurrence is unaffected.
    Failed {
        error: DigestifError,
        /// Whether the best-effort error notice reached the chat.
        notice_sent: bool,
    },
}

enum FireDelivery {
    Sent { date: NaiveDate },
    Suppressed { date: NaiveDate },
}

struct SchedulerInner {
    store: Arc<dyn MessageStore>,
    generator: Arc<DigestGenerator>,
    gate: Arc<TextBackendGate>,
    channel: Arc<dyn ChannelAdapter>,
    options: SchedulerOptions,
    /// The one piece of shared mutable state; every register/unregister/
    /// reconcile serializes on this lock.
    jobs: Mutex<HashMap<i64, ScheduledJob>>,
}

/// Per-chat recurring digest scheduler.
///
/// Cheap to clone; all clones share the same timer table. Pass the instance
/// explicitly to call sites -- there is no ambient registry.
#[derive(Clone)]
pub struct DigestScheduler {
    inner: Arc<SchedulerInner>,
}

impl DigestScheduler {
    pub fn new(
        store: Arc<dyn MessageStore>,
        generator: Arc<DigestGenerator>,
        gate: Arc<TextBackendGate>,
        channel: Arc<dyn ChannelAdapter>,
        options: SchedulerOptions,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                generator,
                gate,
                channel,
                options,
                jobs: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Install (or atomically replace) the recurring timer for a chat.
    ///
    /// Validation happens before the timer table is touched: a malformed
    /// `report_time` or unresolvable `timezone` returns
    /// [`DigestifError::InvalidSchedule`] and leaves any previous timer
    /// running untouched.
    pub async fn register(&self, chat: &Chat) -> Result<(), DigestifError> {
        let rule = FiringRule::parse(&chat.report_time, &chat.timezone)?;

        let mut jobs = self.inner.jobs.lock().await;
        if let Some(old) = jobs.remove(&chat.id) {
            old.cancel.cancel();
            debug!(chat_id = chat.id, "replacing existing timer");
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_timer(
            self.inner.clone(),
            chat.id,
            rule.clone(),
            cancel.clone(),
        ));
        jobs.insert(
            chat.id,
            ScheduledJob {
                rule,
                cancel,
                _handle: handle,
            },
        );

        info!(
            chat_id = chat.id,
            report_time = %chat.report_time,
            timezone = %chat.timezone,
            "chat registered for daily digest"
        );
        Ok(())
    }

    /// Cancel and discard a chat's timer. Idempotent.
    ///
    /// Takes effect before the next scheduled fire; a fire already in
    /// flight is allowed to complete.
    pub async fn unregister(&self, chat_id: i64) {
        let mut jobs = self.inner.jobs.lock().await;
        if let Some(job) = jobs.remove(&chat_id) {
            job.cancel.cancel();
            info!(chat_id, "chat unregistered");
        }
    }

    /// Bulk (re)registration at startup: register every active chat,
    /// skip inactive ones, log and continue on per-chat failure.
    ///
    /// Returns the number of chats registered.
    pub async fn reconcile(&self, chats: &[Chat]) -> usize {
        let mut registered = 0;
        for chat in chats {
            if !chat.active {
                debug!(chat_id = chat.id, "skipping inactive chat");
                continue;
            }
            match self.register(chat).await {
                Ok(()) => registered += 1,
                Err(e) => {
                    warn!(chat_id = chat.id, error = %e, "skipping chat with invalid schedule");
                }
            }
        }
        info!(registered, total = chats.len(), "scheduler reconciled");
        registered
    }

    /// On-demand preview, bypassing the timer: renders today's digest and
    /// returns the text to the caller.
    ///
    /// Unlike a scheduled fire, zero-message input renders the dedicated
    /// empty-state text, and errors surface to the caller directly.
    pub async fn trigger(&self, chat_id: i64) -> Result<String, DigestifError> {
        let inner = &self.inner;
        let chat = inner
            .store
            .get_chat(chat_id)
            .await?
            .ok_or_else(|| DigestifError::Internal(format!("chat {chat_id} is not known")))?;
        let rule = FiringRule::parse(&chat.report_time, &chat.timezone)?;
        let date = rule.today(Utc::now());

        let day = inner.generator.assemble(chat_id, date).await?;
        let ctx = render_context(&chat, date, day.total_count);
        Ok(inner.gate.render(&day.messages, &ctx).await)
    }

    /// One scheduled fire cycle for a chat: summarize yesterday, suppress
    /// empty days, deliver, contain failures.
    ///
    /// This is exactly what an elapsed timer runs; exposed so tests and
    /// operators can run a cycle without waiting for the wall clock.
    pub async fn fire(&self, chat_id: i64) -> FireOutcome {
        fire_cycle(&self.inner, chat_id).await
    }

    /// Number of live timers.
    pub async fn job_count(&self) -> usize {
        self.inner.jobs.lock().await.len()
    }

    /// Whether a chat currently has a live timer.
    pub async fn is_registered(&self, chat_id: i64) -> bool {
        self.inner.jobs.lock().await.contains_key(&chat_id)
    }

    /// The firing rule currently installed for a chat, if any.
    pub async fn rule_for(&self, chat_id: i64) -> Option<FiringRule> {
        self.inner.jobs.lock().await.get(&chat_id).map(|j| j.rule.clone())
    }

    /// Cancel all timers (shutdown).
    pub async fn shutdown(&self) {
        let mut jobs = self.inner.jobs.lock().await;
        for (chat_id, job) in jobs.drain() {
            job.cancel.cancel();
            debug!(chat_id, "timer cancelled on shutdown");
        }
    }
}

/// The per-chat timer loop: sleep until the next fire instant in the
/// chat's timezone, run the cycle, repeat until cancelled.
async fn run_timer(
    inner: Arc<SchedulerInner>,
    chat_id: i64,
    rule: FiringRule,
    cancel: CancellationToken,
) {
    loop {
        let now = Utc::now();
        // Recomputed in the target zone every cycle; a fixed UTC offset
        // cached at registration would drift across DST transitions.
        let next = rule.next_fire_after(now);
        let sleep = (next - now).to_std().unwrap_or(Duration::ZERO);
        debug!(chat_id, next = %next, "timer armed");

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(chat_id, "timer cancelled");
                return;
            }
            _ = tokio::time::sleep(sleep) => {}
        }

        let outcome = fire_cycle(&inner, chat_id).await;
        supervise(chat_id, &outcome);
    }
}

/// Supervisor: consumes a fire outcome, logs, counts, never propagates.
fn supervise(chat_id: i64, outcome: &FireOutcome) {
    match outcome {
        FireOutcome::Delivered { date } => {
            info!(chat_id, date = %date, "digest delivered");
            metrics::counter!("digestif_fires_total").increment(1);
        }
        FireOutcome::SkippedEmpty { date } => {
            info!(chat_id, date = %date, "no content for target date, delivery suppressed");
            metrics::counter!("digestif_fires_skipped_total").increment(1);
        }
        FireOutcome::Failed { error, notice_sent } => {
            error!(chat_id, error = %error, notice_sent, "fire cycle failed; recurrence unaffected");
            metrics::counter!("digestif_fires_failed_total").increment(1);
        }
    }
}

async fn fire_cycle(inner: &Arc<SchedulerInner>, chat_id: i64) -> FireOutcome {
    match generate_and_deliver(inner, chat_id).await {
        Ok(FireDelivery::Sent { date }) => FireOutcome::Delivered { date },
        Ok(FireDelivery::Suppressed { date }) => FireOutcome::SkippedEmpty { date },
        Err(error) => {
            let notice_sent = send_error_notice(inner, chat_id).await;
            FireOutcome::Failed { error, notice_sent }
        }
    }
}

async fn generate_and_deliver(
    inner: &Arc<SchedulerInner>,
    chat_id: i64,
) -> Result<FireDelivery, DigestifError> {
    // Settings are re-read at fire time so mid-flight reconfiguration
    // (mention, title, timezone) is honored.
    let chat = inner
        .store
        .get_chat(chat_id)
        .await?
        .ok_or_else(|| DigestifError::Internal(format!("chat {chat_id} is not known")))?;
    let rule = FiringRule::parse(&chat.report_time, &chat.timezone)?;

    // Reports summarize the day that just ended in the chat's timezone.
    let date = rule.yesterday(Utc::now());

    if !inner.generator.has_content(chat_id, date).await? {
        return Ok(FireDelivery::Suppressed { date });
    }

    let day = inner.generator.assemble(chat_id, date).await?;
    let ctx = render_context(&chat, date, day.total_count);
    let text = inner.gate.render(&day.messages, &ctx).await;

    send_with_timeout(inner, chat_id, text).await?;
    Ok(FireDelivery::Sent { date })
}

/// Best-effort, one-shot error notice. Never retried.
async fn send_error_notice(inner: &Arc<SchedulerInner>, chat_id: i64) -> bool {
    match send_with_timeout(inner, chat_id, ERROR_NOTICE.to_string()).await {
        Ok(()) => true,
        Err(e) => {
            warn!(chat_id, error = %e, "error notice could not be delivered");
            false
        }
    }
}

async fn send_with_timeout(
    inner: &Arc<SchedulerInner>,
    chat_id: i64,
    text: String,
) -> Result<(), DigestifError> {
    tokio::time::timeout(
        inner.options.delivery_timeout,
        inner.channel.send(OutboundMessage { chat_id, text }),
    )
    .await
    .map_err(|_| DigestifError::Timeout {
        duration: inner.options.delivery_timeout,
    })??;
    Ok(())
}

fn render_context(chat: &Chat, date: NaiveDate, total_count: usize) -> RenderContext {
    RenderContext {
        chat_title: chat.title.clone(),
        date_label: date.format("%Y-%m-%d").to_string(),
        total_count,
        target_mention: chat.target_mention.clone(),
    }
}
