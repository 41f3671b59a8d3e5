// Periodic bot status poller.
//
// Each interval tick starts a poll cycle as its own task, so a slow backend
// never delays the next tick and cycles may overlap. Cycles are numbered when
// they start; a cycle only renders if no later-started cycle has rendered
// before it, so a slow stale response cannot overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::error::{AppError, PollFailure};
use crate::indicator::{Indicator, Presentation};
use crate::metrics;
use crate::status::{BotStatus, StatusResponse};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Sequence number and status of the newest rendered cycle.
#[derive(Debug, Default)]
struct RenderState {
    seq: u64,
    status: Option<BotStatus>,
}

/// Keeps the in-flight gauge right even when a cycle is aborted mid-request.
struct InFlight;

impl InFlight {
    fn start() -> Self {
        metrics::POLLS_IN_FLIGHT.inc();
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        metrics::POLLS_IN_FLIGHT.dec();
    }
}

/// Polls the bot's status endpoint and writes the result to an indicator.
pub struct StatusPoller<I> {
    client: reqwest::Client,
    status_url: String,
    interval: Duration,
    indicator: I,
    next_seq: AtomicU64,
    rendered: Mutex<RenderState>,
}

impl<I: Indicator> StatusPoller<I> {
    /// Build a poller with an HTTP client configured from `config`.
    pub fn new(config: &Config, indicator: I) -> Result<Self, AppError> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self::with_client(
            client,
            config.status_url.clone(),
            config.poll_interval,
            indicator,
        ))
    }

    pub fn with_client(
        client: reqwest::Client,
        status_url: impl Into<String>,
        interval: Duration,
        indicator: I,
    ) -> Self {
        Self {
            client,
            status_url: status_url.into(),
            interval,
            indicator,
            next_seq: AtomicU64::new(1),
            rendered: Mutex::new(RenderState::default()),
        }
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Status shown by the newest rendered cycle, `None` before the first.
    pub fn last_status(&self) -> Option<BotStatus> {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    /// Query the status endpoint once. Never fails: every failure is logged
    /// and reported as `Offline`.
    pub async fn poll(&self) -> BotStatus {
        let in_flight = InFlight::start();
        let timer = metrics::POLL_DURATION_SECONDS.start_timer();
        let result = self.fetch().await;
        timer.observe_duration();
        drop(in_flight);

        match result {
            Ok(response) => {
                let status = response.bot_status();
                tracing::debug!(
                    status = %status,
                    bot = response.bot.as_deref().unwrap_or("-"),
                    message = response.message.as_deref().unwrap_or("-"),
                    "Status poll completed"
                );
                metrics::POLLS_TOTAL
                    .with_label_values(&[status.as_str()])
                    .inc();
                status
            }
            Err(e) => {
                tracing::warn!(
                    url = %self.status_url,
                    timeout = e.is_timeout(),
                    "Error checking bot status: {e}"
                );
                metrics::POLLS_TOTAL.with_label_values(&[e.outcome()]).inc();
                BotStatus::Offline
            }
        }
    }

    async fn fetch(&self) -> Result<StatusResponse, PollFailure> {
        let response = self
            .client
            .get(&self.status_url)
            .send()
            .await
            .map_err(PollFailure::Request)?;

        let code = response.status();
        if !code.is_success() {
            return Err(PollFailure::HttpStatus(code));
        }

        let body: Value = response.json().await.map_err(PollFailure::Decode)?;
        StatusResponse::from_body(&body).ok_or(PollFailure::NotAnObject)
    }

    /// Write the fixed presentation for `status` to the indicator
    /// unconditionally. A panicking indicator is logged and contained.
    pub fn render(&self, status: BotStatus) {
        let presentation = Presentation::for_status(status);
        let rendered = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.indicator.render(status, &presentation);
        }));
        if rendered.is_err() {
            tracing::error!(status = %status, "Indicator panicked while rendering");
        }
        metrics::BOT_ONLINE.set(i64::from(status.is_online()));
    }

    /// One full cycle: poll, then render unless a newer cycle already has.
    pub async fn poll_once(&self) -> BotStatus {
        let seq = self.begin_cycle();
        let status = self.poll().await;
        self.finish_cycle(seq, status);
        status
    }

    fn begin_cycle(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Render the result of cycle `seq`. Returns false if it was superseded.
    fn finish_cycle(&self, seq: u64, status: BotStatus) -> bool {
        let mut rendered = self
            .rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if seq <= rendered.seq {
            tracing::debug!(seq, newest = rendered.seq, "Dropping stale status result");
            metrics::STALE_RESULTS_TOTAL.inc();
            return false;
        }

        match rendered.status {
            Some(prev) if prev == status => {}
            Some(prev) => tracing::info!("Bot status changed: {prev} -> {status}"),
            None => tracing::info!("Bot status: {status}"),
        }

        rendered.seq = seq;
        rendered.status = Some(status);
        // Lock stays held so renders happen in sequence order.
        self.render(status);
        true
    }
}

impl<I: Indicator + 'static> StatusPoller<I> {
    /// Start polling: one cycle right away, then one per interval, until the
    /// returned handle is shut down or dropped.
    pub fn spawn(self: Arc<Self>) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval.max(MIN_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut cycles = JoinSet::new();

            tracing::info!(
                url = %self.status_url,
                interval_secs = self.interval.as_secs_f64(),
                "Status poller started"
            );

            loop {
                tokio::select! {
                    // Sender dropped or shutdown requested.
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        let poller = self.clone();
                        cycles.spawn(async move {
                            poller.poll_once().await;
                        });
                    }
                    Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                        if let Err(e) = joined {
                            tracing::error!("Status poll task failed: {e}");
                        }
                    }
                }
            }

            let abandoned = cycles.len();
            cycles.abort_all();
            tracing::info!(abandoned, "Status poller stopped");
        });

        PollerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Owned handle to a running poller. Dropping it stops the poller.
#[derive(Debug)]
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop scheduling cycles, abort in-flight ones, and wait for the
    /// scheduler to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!("Status poller task failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::{SharedIndicator, OFFLINE, ONLINE};

    /// Poller aimed at a closed port; only the sequencing logic is exercised.
    fn test_poller() -> StatusPoller<SharedIndicator> {
        StatusPoller::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:9/api/status",
            Duration::from_secs(30),
            SharedIndicator::new(),
        )
    }

    #[test]
    fn test_cycles_are_numbered_in_start_order() {
        let poller = test_poller();
        let a = poller.begin_cycle();
        let b = poller.begin_cycle();
        let c = poller.begin_cycle();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_newer_cycle_wins_over_late_older_one() {
        let poller = test_poller();
        let older = poller.begin_cycle();
        let newer = poller.begin_cycle();

        assert!(poller.finish_cycle(newer, BotStatus::Offline));
        assert!(!poller.finish_cycle(older, BotStatus::Online));

        assert_eq!(poller.last_status(), Some(BotStatus::Offline));
        assert_eq!(poller.indicator().status(), Some(BotStatus::Offline));
    }

    #[test]
    fn test_in_order_completion_renders_each() {
        let poller = test_poller();
        let first = poller.begin_cycle();
        let second = poller.begin_cycle();

        assert!(poller.finish_cycle(first, BotStatus::Online));
        assert_eq!(poller.indicator().status(), Some(BotStatus::Online));

        assert!(poller.finish_cycle(second, BotStatus::Offline));
        assert_eq!(poller.indicator().status(), Some(BotStatus::Offline));
    }

    #[test]
    fn test_nothing_rendered_before_first_cycle() {
        let poller = test_poller();
        assert!(poller.last_status().is_none());
        assert!(poller.indicator().status().is_none());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = Config {
            poll_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(StatusPoller::new(&config, SharedIndicator::new()).is_err());
    }

    /// Panics on its first render, then behaves.
    #[derive(Default)]
    struct PanicOnceIndicator {
        renders: AtomicU64,
        shown: Mutex<Option<Presentation>>,
    }

    impl Indicator for PanicOnceIndicator {
        fn render(&self, _status: BotStatus, presentation: &Presentation) {
            if self.renders.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("indicator surface not ready");
            }
            *self.shown.lock().unwrap() = Some(*presentation);
        }
    }

    #[test]
    fn test_panicking_indicator_does_not_freeze_later_cycles() {
        let poller = StatusPoller::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:9/api/status",
            Duration::from_secs(30),
            PanicOnceIndicator::default(),
        );

        let first = poller.begin_cycle();
        assert!(poller.finish_cycle(first, BotStatus::Online));
        assert_eq!(poller.last_status(), Some(BotStatus::Online));

        let second = poller.begin_cycle();
        assert!(poller.finish_cycle(second, BotStatus::Offline));
        assert_eq!(poller.last_status(), Some(BotStatus::Offline));
        assert_eq!(*poller.indicator().shown.lock().unwrap(), Some(OFFLINE));
        assert_eq!(poller.indicator().renders.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_render_delivers_fixed_presentation() {
        let poller = test_poller();
        poller.render(BotStatus::Online);
        assert_eq!(poller.indicator().snapshot().presentation, ONLINE);
        poller.render(BotStatus::Offline);
        assert_eq!(poller.indicator().snapshot().presentation, OFFLINE);
    }

    #[tokio::test]
    async fn test_absent_indicator_still_tracks_status() {
        let poller = StatusPoller::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:9/api/status",
            Duration::from_secs(30),
            None::<SharedIndicator>,
        );
        let seq = poller.begin_cycle();
        assert!(poller.finish_cycle(seq, BotStatus::Online));
        assert_eq!(poller.last_status(), Some(BotStatus::Online));
    }
}
