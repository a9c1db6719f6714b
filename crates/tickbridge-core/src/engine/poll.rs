//! Poll loop: drives the differ on a timer and owns snapshot lifecycle.
//!
//! One cycle is fetch -> diff -> adopt. The engine owns the previous
//! snapshot outright; nothing else writes it, and adoption is a single
//! assignment so observers never see a half-replaced state. Failed
//! cycles leave the previous snapshot untouched.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{BridgeConfig, MAX_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS};
use crate::engine::diff::diff_snapshots;
use crate::error::ApiError;
use crate::events::EventSink;
use crate::ticktick::api::TickTickClient;
use crate::ticktick::model::Snapshot;

/// Consecutive transient failures tolerated before the bridge reports
/// itself unavailable.
pub const FAILURE_ESCALATION_THRESHOLD: u32 = 3;

const BACKOFF_BASE_SECS: u64 = 60;
const BACKOFF_MAX_SECS: u64 = 3600;

/// Tuning for the poll loop.
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Seconds between cycles, clamped to [60, 3600].
    pub interval_secs: u64,
    /// Lookahead for due-soon warnings, in minutes.
    pub due_soon_minutes: i64,
}

impl PollOptions {
    pub fn new(interval_secs: u64, due_soon_minutes: i64) -> Self {
        Self {
            interval_secs: interval_secs.clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS),
            due_soon_minutes: due_soon_minutes.max(0),
        }
    }
}

impl From<&BridgeConfig> for PollOptions {
    fn from(config: &BridgeConfig) -> Self {
        Self::new(config.poll_interval_secs, config.due_soon_minutes)
    }
}

/// Health surface exposed to the host.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStatus {
    /// False once failures persist or authentication is rejected.
    pub available: bool,
    /// Authentication was rejected; the user must re-authorize.
    pub needs_reauth: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    /// Set while a rate-limit backoff is deferring the next attempt.
    pub backoff_until: Option<DateTime<Utc>>,
}

/// Requests an out-of-cycle poll. Held by command forwarders so a
/// mutation is reflected locally without waiting for the next tick.
#[derive(Debug, Clone, Default)]
pub struct RefreshHandle {
    notify: Arc<Notify>,
}

impl RefreshHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the poll loop to run a cycle as soon as it is idle.
    pub fn request(&self) {
        self.notify.notify_one();
    }

    pub(crate) async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Timer-driven fetch/diff/adopt loop.
pub struct PollEngine<S: EventSink> {
    client: TickTickClient,
    options: PollOptions,
    sink: S,
    previous: Option<Snapshot>,
    refresh: RefreshHandle,
    needs_reauth: bool,
    consecutive_failures: u32,
    backoff_secs: Option<u64>,
    backoff_until: Option<DateTime<Utc>>,
    last_success_at: Option<DateTime<Utc>>,
}

impl<S: EventSink> PollEngine<S> {
    pub fn new(client: TickTickClient, options: PollOptions, sink: S) -> Self {
        Self {
            client,
            options,
            sink,
            previous: None,
            refresh: RefreshHandle::new(),
            needs_reauth: false,
            consecutive_failures: 0,
            backoff_secs: None,
            backoff_until: None,
            last_success_at: None,
        }
    }

    /// Handle for requesting out-of-cycle polls.
    pub fn refresh_handle(&self) -> RefreshHandle {
        self.refresh.clone()
    }

    /// The most recently adopted snapshot, if any cycle has succeeded.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            available: !self.needs_reauth
                && self.consecutive_failures < FAILURE_ESCALATION_THRESHOLD,
            needs_reauth: self.needs_reauth,
            last_success_at: self.last_success_at,
            consecutive_failures: self.consecutive_failures,
            backoff_until: self.backoff_until,
        }
    }

    /// Run one fetch/diff/adopt cycle. Returns the number of events
    /// emitted. On failure the retained snapshot is left unchanged.
    pub async fn poll_once(&mut self) -> Result<usize, ApiError> {
        let now = Utc::now();
        let current = match self.client.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.note_failure(&err, now);
                return Err(err);
            }
        };

        let events = diff_snapshots(
            self.previous.as_ref(),
            &current,
            now,
            ChronoDuration::minutes(self.options.due_soon_minutes),
        );
        for event in &events {
            self.sink.emit(event);
        }
        self.sink.snapshot_replaced(&current);

        // adoption is unconditional, even when no events fired
        self.previous = Some(current);
        self.needs_reauth = false;
        self.consecutive_failures = 0;
        self.backoff_secs = None;
        self.backoff_until = None;
        self.last_success_at = Some(now);

        debug!(events = events.len(), "poll cycle complete");
        Ok(events.len())
    }

    /// Timer loop. Ticks that land while a cycle is still in flight are
    /// skipped, not queued. Runs until the owning future is dropped.
    pub async fn run(&mut self) {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(self.options.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.options.interval_secs,
            due_soon_minutes = self.options.due_soon_minutes,
            "poll loop started"
        );

        loop {
            let refresh = self.refresh.clone();
            tokio::select! {
                _ = ticker.tick() => {
                    if self.in_backoff(Utc::now()) {
                        debug!("tick skipped during rate-limit backoff");
                        continue;
                    }
                    let _ = self.poll_once().await;
                }
                _ = refresh.wait() => {
                    // a command just mutated remote state; backoff does
                    // not apply to explicit refreshes
                    debug!("out-of-cycle refresh requested");
                    let _ = self.poll_once().await;
                }
            }
        }
    }

    fn in_backoff(&self, now: DateTime<Utc>) -> bool {
        self.backoff_until.is_some_and(|until| now < until)
    }

    fn note_failure(&mut self, err: &ApiError, now: DateTime<Utc>) {
        self.consecutive_failures += 1;

        if err.is_auth() {
            self.needs_reauth = true;
            warn!(error = %err, "authentication rejected; re-authorization required");
            return;
        }

        if matches!(err, ApiError::RateLimited) {
            let step = self
                .backoff_secs
                .map(|s| (s * 2).min(BACKOFF_MAX_SECS))
                .unwrap_or(BACKOFF_BASE_SECS);
            self.backoff_secs = Some(step);
            self.backoff_until = Some(now + ChronoDuration::seconds(step as i64));
            warn!(backoff_secs = step, "rate limited; deferring next attempt");
            return;
        }

        if self.consecutive_failures >= FAILURE_ESCALATION_THRESHOLD {
            warn!(
                failures = self.consecutive_failures,
                error = %err,
                "poll failures persist; marking bridge unavailable"
            );
        } else {
            debug!(error = %err, "poll cycle failed; will retry on next tick");
        }
    }
}
