//! Per-subreddit polling loop.
//!
//! A [`Poller`] builds a baseline of known titles once, then repeatedly
//! fetches the whole "new" listing and broadcasts the posts whose titles are
//! not in the baseline.
//!
//! - A tick that finds nothing new publishes nothing.
//! - A tick that fails is logged and retried on the next interval.
//! - The baseline is never extended with published posts; call
//!   [`Poller::refresh_baseline`] to rebuild it.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::app::{Result, SubwatchError};
use crate::config::{format_interval, ConfigError, PollingConfig};
use crate::domain::{Baseline, Post};
use crate::service::DataService;

/// How long a freshly built baseline stays cached (2 hours).
pub const DEFAULT_BASELINE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub baseline_ttl: Duration,
    /// Batches buffered per subscriber before the oldest are dropped
    pub channel_capacity: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            baseline_ttl: DEFAULT_BASELINE_TTL,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl PollerConfig {
    pub fn from_config(config: &PollingConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            baseline_ttl: config.baseline_ttl()?,
            channel_capacity: config.channel_capacity.max(1),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Initializing,
    Polling,
    Cancelled,
}

pub struct Poller {
    service: Arc<DataService>,
    subreddit: String,
    config: PollerConfig,
    baseline: Mutex<Option<Arc<Baseline>>>,
    sender: broadcast::Sender<Vec<Post>>,
    state: watch::Sender<PollerState>,
    running: AtomicBool,
    stop: CancellationToken,
}

impl Poller {
    pub fn new(service: Arc<DataService>, subreddit: &str, config: PollerConfig) -> Result<Self> {
        SubwatchError::validate_non_blank(subreddit, "subreddit")?;

        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        let (state, _) = watch::channel(PollerState::Idle);

        Ok(Self {
            service,
            subreddit: subreddit.trim().to_string(),
            config,
            baseline: Mutex::new(None),
            sender,
            state,
            running: AtomicBool::new(false),
            stop: CancellationToken::new(),
        })
    }

    pub fn subreddit(&self) -> &str {
        &self.subreddit
    }

    /// Receive every batch of new posts published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Post>> {
        self.sender.subscribe()
    }

    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<PollerState> {
        self.state.subscribe()
    }

    /// Send a batch to all current subscribers; returns how many received it.
    pub fn publish(&self, posts: Vec<Post>) -> usize {
        match self.sender.send(posts) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!(subreddit = %self.subreddit, "No subscribers for new posts");
                0
            }
        }
    }

    /// Stop the polling loop. The poller cannot be restarted afterwards.
    pub fn stop_polling(&self) {
        self.stop.cancel();
    }

    /// Currently loaded baseline, if one has been built or loaded.
    pub async fn baseline(&self) -> Option<Arc<Baseline>> {
        self.baseline.lock().await.clone()
    }

    /// Run the polling loop on a background task.
    pub fn spawn(self: Arc<Self>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.start_polling(interval, cancel).await })
    }

    /// Poll every `interval` until `cancel` fires or [`stop_polling`](Self::stop_polling) is called.
    ///
    /// Returns without error on cancellation. Only one loop runs per poller;
    /// a second concurrent call returns immediately.
    pub async fn start_polling(&self, interval: Duration, cancel: CancellationToken) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!(subreddit = %self.subreddit, "Polling loop already running");
            return;
        }
        let _running = RunningGuard(&self.running);

        if self.is_cancelled(&cancel) {
            tracing::debug!(subreddit = %self.subreddit, "Cancelled before polling started");
            self.state.send_replace(PollerState::Cancelled);
            return;
        }

        tracing::info!(
            subreddit = %self.subreddit,
            interval = %format_interval(interval),
            "Polling started"
        );

        while !self.is_cancelled(&cancel) {
            let started = Instant::now();

            match self.poll_once(&cancel).await {
                Ok(new_posts) if new_posts.is_empty() => {
                    tracing::debug!(subreddit = %self.subreddit, "No new posts");
                }
                Ok(new_posts) => {
                    tracing::info!(
                        subreddit = %self.subreddit,
                        count = new_posts.len(),
                        "Publishing new posts"
                    );
                    self.publish(new_posts);
                }
                Err(e) => {
                    tracing::error!(
                        subreddit = %self.subreddit,
                        error = %e,
                        "Poll failed, retrying next interval"
                    );
                }
            }

            let remaining = interval.saturating_sub(started.elapsed());
            if self
                .until_cancelled(&cancel, tokio::time::sleep(remaining))
                .await
                .is_none()
            {
                break;
            }
        }

        self.state.send_replace(PollerState::Cancelled);
        tracing::info!(subreddit = %self.subreddit, "Polling stopped");
    }

    /// Run a single tick: make sure a baseline exists, fetch the listing and
    /// return the posts missing from the baseline.
    ///
    /// Returns an empty list if cancelled part-way.
    pub async fn poll_once(&self, cancel: &CancellationToken) -> Result<Vec<Post>> {
        if self.is_cancelled(cancel) {
            return Ok(Vec::new());
        }

        let Some(baseline) = self.ensure_baseline(cancel).await? else {
            return Ok(Vec::new());
        };
        self.state.send_replace(PollerState::Polling);

        let fetched = self.fetch_all(cancel).await?;
        if self.is_cancelled(cancel) {
            return Ok(Vec::new());
        }

        Ok(baseline.new_posts(fetched))
    }

    /// Fetch every page of the listing, following cursors until one is blank.
    ///
    /// Cancellation discards whatever was already collected.
    pub async fn fetch_all(&self, cancel: &CancellationToken) -> Result<Vec<Post>> {
        let mut posts = Vec::new();
        let mut after = String::new();

        loop {
            let request = self.service.get_listing_page(&self.subreddit, &after);
            let Some(page) = self.until_cancelled(cancel, request).await else {
                tracing::debug!(
                    subreddit = %self.subreddit,
                    discarded = posts.len(),
                    "Fetch cancelled"
                );
                return Ok(Vec::new());
            };
            let page = page?;

            let next = page.next_cursor().map(str::to_string);
            posts.extend(page.posts);

            match next {
                Some(cursor) => after = cursor,
                None => break,
            }
        }

        tracing::debug!(subreddit = %self.subreddit, count = posts.len(), "Fetched listing");
        Ok(posts)
    }

    /// Rebuild the baseline from the current listing and persist it.
    ///
    /// Returns `None` if cancelled before the listing was complete.
    pub async fn refresh_baseline(&self, cancel: &CancellationToken) -> Result<Option<Arc<Baseline>>> {
        let mut slot = self.baseline.lock().await;
        let Some(baseline) = self.build_baseline(cancel).await? else {
            return Ok(None);
        };
        *slot = Some(baseline.clone());
        Ok(Some(baseline))
    }

    async fn ensure_baseline(&self, cancel: &CancellationToken) -> Result<Option<Arc<Baseline>>> {
        let mut slot = self.baseline.lock().await;

        if let Some(baseline) = slot.as_ref().filter(|b| !b.is_empty()) {
            return Ok(Some(baseline.clone()));
        }

        self.state.send_replace(PollerState::Initializing);

        let baseline = match self.load_baseline()? {
            Some(stored) => {
                tracing::info!(
                    subreddit = %self.subreddit,
                    titles = stored.len(),
                    "Loaded baseline"
                );
                Arc::new(stored)
            }
            None => match self.build_baseline(cancel).await? {
                Some(built) => built,
                None => return Ok(None),
            },
        };

        *slot = Some(baseline.clone());
        Ok(Some(baseline))
    }

    /// Stored baseline, unless it is missing, empty, unreadable or older than the ttl.
    fn load_baseline(&self) -> Result<Option<Baseline>> {
        let key = Baseline::store_key(&self.subreddit);
        let stored = match self.service.load::<Baseline>(&key, false) {
            Ok(stored) => stored,
            Err(SubwatchError::Serialization(e)) => {
                tracing::warn!(subreddit = %self.subreddit, error = %e, "Discarding unreadable baseline");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(stored.filter(|b| !b.is_empty()).filter(|b| {
            let fresh = b.is_fresh(self.config.baseline_ttl);
            if !fresh {
                tracing::info!(
                    subreddit = %self.subreddit,
                    built_at = %b.built_at(),
                    "Stored baseline expired"
                );
            }
            fresh
        }))
    }

    async fn build_baseline(&self, cancel: &CancellationToken) -> Result<Option<Arc<Baseline>>> {
        let posts = self.fetch_all(cancel).await?;
        if self.is_cancelled(cancel) {
            return Ok(None);
        }

        let baseline = Baseline::from_posts(&posts);
        self.service.save(
            &Baseline::store_key(&self.subreddit),
            &baseline,
            Some(self.config.baseline_ttl),
        )?;

        tracing::info!(
            subreddit = %self.subreddit,
            titles = baseline.len(),
            "Built baseline"
        );
        Ok(Some(Arc::new(baseline)))
    }

    fn is_cancelled(&self, cancel: &CancellationToken) -> bool {
        cancel.is_cancelled() || self.stop.is_cancelled()
    }

    /// Drive `fut` unless cancellation comes first, in which case it is dropped.
    async fn until_cancelled<F: Future>(&self, cancel: &CancellationToken, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            _ = self.stop.cancelled() => None,
            output = fut => Some(output),
        }
    }
}

/// Clears the running flag when the loop exits, including when its future is dropped.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
