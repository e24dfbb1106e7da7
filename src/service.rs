//! Data access shared by every poller: bearer-token lifecycle, listing pages,
//! and a cache-over-store facade for small JSON documents.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::api::ApiClient;
use crate::app::{AuthError, Result, SubwatchError};
use crate::cache::Cache;
use crate::config::RedditConfig;
use crate::domain::{BearerToken, ListingPage};
use crate::store::Store;

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
        }
    }

    pub fn from_config(config: &RedditConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    fn require(&self) -> Result<(&str, &str)> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|s| !s.trim().is_empty())
        }

        let id = present(&self.client_id).ok_or(AuthError::MissingCredentials("client_id"))?;
        let secret =
            present(&self.client_secret).ok_or(AuthError::MissingCredentials("client_secret"))?;
        Ok((id, secret))
    }
}

pub struct DataService {
    client: Arc<dyn ApiClient + Send + Sync>,
    store: Arc<dyn Store + Send + Sync>,
    cache: Arc<dyn Cache + Send + Sync>,
    credentials: Credentials,
    // Held across the whole check-and-refresh so only one refresh is ever in flight.
    token: Mutex<Option<BearerToken>>,
}

impl DataService {
    pub fn new(
        client: Arc<dyn ApiClient + Send + Sync>,
        store: Arc<dyn Store + Send + Sync>,
        cache: Arc<dyn Cache + Send + Sync>,
        credentials: Credentials,
    ) -> Self {
        Self {
            client,
            store,
            cache,
            credentials,
            token: Mutex::new(None),
        }
    }

    /// Return a valid access token, authenticating first if none is held or it expired.
    ///
    /// Concurrent callers wait for an in-progress refresh and reuse its token.
    pub async fn ensure_authenticated(&self) -> Result<String> {
        let mut token = self.token.lock().await;

        if let Some(current) = token.as_ref().filter(|t| t.is_valid()) {
            return Ok(current.access_token.clone());
        }

        let fresh = self.request_token().await?;
        let access_token = fresh.access_token.clone();
        *token = Some(fresh);

        Ok(access_token)
    }

    /// Unconditionally replace the held token with a freshly issued one.
    pub async fn authenticate(&self) -> Result<()> {
        let mut token = self.token.lock().await;
        *token = Some(self.request_token().await?);
        Ok(())
    }

    pub async fn token_expiry(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.token.lock().await.as_ref().map(|t| t.expires_at)
    }

    async fn request_token(&self) -> Result<BearerToken> {
        let (client_id, client_secret) = self.credentials.require()?;

        tracing::info!("Requesting a new bearer token");
        let response = self.client.authenticate(client_id, client_secret).await?;

        if response.status != StatusCode::OK {
            return Err(AuthError::UnexpectedStatus(response.status.as_u16()).into());
        }

        let token = response.value.ok_or(AuthError::EmptyBody)?;
        if token.access_token.trim().is_empty() {
            return Err(AuthError::BlankToken.into());
        }

        tracing::debug!(expires_at = %token.expires_at, scope = %token.scope, "Bearer token issued");
        Ok(token)
    }

    /// Fetch one page of `subreddit`'s newest posts.
    pub async fn get_listing_page(&self, subreddit: &str, after: &str) -> Result<ListingPage> {
        let access_token = self.ensure_authenticated().await?;

        let response = self
            .client
            .fetch_page(&access_token, subreddit, after)
            .await?;

        if response.status != StatusCode::OK {
            return Err(SubwatchError::request_failed(response.status));
        }

        let data = response
            .value
            .and_then(|body| body.data)
            .ok_or_else(|| {
                SubwatchError::NoData(format!("listing for '{}' carried no data", subreddit))
            })?;

        Ok(ListingPage::from(data))
    }

    /// Write `value` through to the store, and to the cache as well when a `ttl` is given.
    pub fn save<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<bool> {
        let json = serde_json::to_string(value)?;
        let written = self.store.put(key, &json)?;

        if let Some(ttl) = ttl {
            self.cache.try_set(key, json, ttl);
        }

        Ok(written)
    }

    /// Read `key` from the cache, falling back to the store.
    pub fn load<T: DeserializeOwned>(&self, key: &str, bypass_cache: bool) -> Result<Option<T>> {
        if !bypass_cache {
            if let Some(json) = self.cache.try_get(key) {
                tracing::trace!(key, "Cache hit");
                return Ok(Some(serde_json::from_str(&json)?));
            }
        }

        match self.store.get(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
