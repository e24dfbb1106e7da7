//! Scripted [`ApiClient`] used by the service and poller unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::api::{ApiClient, ApiResponse};
use crate::app::{Result, SubwatchError};
use crate::cache::{Cache, MokaCache};
use crate::domain::{BearerToken, ListingChild, ListingData, ListingResponse, Post};
use crate::service::{Credentials, DataService};
use crate::store::MemoryStore;

#[derive(Clone)]
struct FakePage {
    titles: Vec<String>,
    after: Option<String>,
}

pub(crate) struct FakeApi {
    auth_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    auth_status: StatusCode,
    access_token: Option<String>,
    expires_in: i64,
    auth_delay: Duration,
    fetch_status: StatusCode,
    no_data: bool,
    pages: Mutex<HashMap<String, FakePage>>,
    failures: Mutex<VecDeque<StatusCode>>,
    fetch_delays: HashMap<String, Duration>,
    seen_tokens: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            auth_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            auth_status: StatusCode::OK,
            access_token: Some("fake-token".to_string()),
            expires_in: 3600,
            auth_delay: Duration::ZERO,
            fetch_status: StatusCode::OK,
            no_data: false,
            pages: Mutex::new(HashMap::new()),
            failures: Mutex::new(VecDeque::new()),
            fetch_delays: HashMap::new(),
            seen_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn with_token(mut self, access_token: &str, expires_in: i64) -> Self {
        self.access_token = Some(access_token.to_string());
        self.expires_in = expires_in;
        self
    }

    pub fn without_token_body(mut self) -> Self {
        self.access_token = None;
        self
    }

    pub fn with_auth_status(mut self, status: StatusCode) -> Self {
        self.auth_status = status;
        self
    }

    pub fn with_auth_delay(mut self, delay: Duration) -> Self {
        self.auth_delay = delay;
        self
    }

    pub fn with_fetch_status(mut self, status: StatusCode) -> Self {
        self.fetch_status = status;
        self
    }

    pub fn with_no_data(mut self) -> Self {
        self.no_data = true;
        self
    }

    /// Hold the request for `cursor` for `delay` before answering.
    pub fn with_fetch_delay(mut self, cursor: &str, delay: Duration) -> Self {
        self.fetch_delays.insert(cursor.to_string(), delay);
        self
    }

    pub fn with_page(self, cursor: &str, titles: &[&str], after: &str) -> Self {
        self.set_page(cursor, titles, after);
        self
    }

    /// Replace the page served for `cursor`.
    pub fn set_page(&self, cursor: &str, titles: &[&str], after: &str) {
        let page = FakePage {
            titles: titles.iter().map(|t| t.to_string()).collect(),
            after: Some(after.to_string()),
        };
        self.pages.lock().unwrap().insert(cursor.to_string(), page);
    }

    /// Make the next `count` page fetches fail with `status`.
    pub fn fail_next_fetches(&self, count: usize, status: StatusCode) {
        let mut failures = self.failures.lock().unwrap();
        for _ in 0..count {
            failures.push_back(status);
        }
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.auth_calls() + self.fetch_calls()
    }

    pub fn seen_tokens(&self) -> Vec<String> {
        self.seen_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiClient for FakeApi {
    async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<ApiResponse<BearerToken>> {
        SubwatchError::validate_non_blank(client_id, "client_id")?;
        SubwatchError::validate_non_blank(client_secret, "client_secret")?;

        let call = self.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.auth_delay.is_zero() {
            tokio::time::sleep(self.auth_delay).await;
        }

        if !self.auth_status.is_success() {
            return Err(SubwatchError::request_failed(self.auth_status));
        }

        let token = self.access_token.as_ref().and_then(|access| {
            // Distinct value per call so refreshes are observable.
            let access = if access.trim().is_empty() {
                access.clone()
            } else {
                format!("{}-{}", access, call)
            };
            BearerToken::new(access, "bearer", self.expires_in, "*")
        });

        Ok(ApiResponse::new(self.auth_status, token, ""))
    }

    async fn fetch_page(
        &self,
        bearer_token: &str,
        subreddit: &str,
        after: &str,
    ) -> Result<ApiResponse<ListingResponse>> {
        SubwatchError::validate_non_blank(bearer_token, "bearer_token")?;
        SubwatchError::validate_non_blank(subreddit, "subreddit")?;

        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens
            .lock()
            .unwrap()
            .push(bearer_token.to_string());

        if let Some(delay) = self.fetch_delays.get(after) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(status) = self.failures.lock().unwrap().pop_front() {
            return Err(SubwatchError::request_failed(status));
        }
        if !self.fetch_status.is_success() {
            return Err(SubwatchError::request_failed(self.fetch_status));
        }

        if self.no_data {
            return Ok(ApiResponse::new(
                self.fetch_status,
                Some(ListingResponse { data: None }),
                "{}",
            ));
        }

        let page = self
            .pages
            .lock()
            .unwrap()
            .get(after)
            .cloned()
            .unwrap_or(FakePage {
                titles: Vec::new(),
                after: None,
            });

        let data = ListingData {
            after: page.after,
            before: None,
            children: page
                .titles
                .iter()
                .map(|title| ListingChild {
                    data: Post::new(title.as_str()),
                })
                .collect(),
        };

        Ok(ApiResponse::new(
            self.fetch_status,
            Some(ListingResponse { data: Some(data) }),
            "",
        ))
    }
}

/// Cache that remembers the ttl of every insert.
#[derive(Default)]
pub(crate) struct RecordingCache {
    inner: MokaCache,
    ttls: Mutex<HashMap<String, Duration>>,
}

impl RecordingCache {
    pub fn ttl_for(&self, key: &str) -> Option<Duration> {
        self.ttls.lock().unwrap().get(key).copied()
    }
}

impl Cache for RecordingCache {
    fn try_set(&self, key: &str, value: String, ttl: Duration) -> bool {
        self.ttls.lock().unwrap().insert(key.to_string(), ttl);
        self.inner.try_set(key, value, ttl)
    }

    fn try_get(&self, key: &str) -> Option<String> {
        self.inner.try_get(key)
    }
}

pub(crate) fn credentials() -> Credentials {
    Credentials::new("client-id", "client-secret")
}

pub(crate) struct Harness {
    pub api: Arc<FakeApi>,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<RecordingCache>,
    pub service: Arc<DataService>,
}

pub(crate) fn harness(api: FakeApi) -> Harness {
    harness_with_credentials(api, credentials())
}

pub(crate) fn harness_with_credentials(api: FakeApi, credentials: Credentials) -> Harness {
    let api = Arc::new(api);
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(RecordingCache::default());
    let service = Arc::new(DataService::new(
        api.clone(),
        store.clone(),
        cache.clone(),
        credentials,
    ));

    Harness {
        api,
        store,
        cache,
        service,
    }
}
