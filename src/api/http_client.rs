use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::{ApiClient, ApiResponse, RateLimiter};
use crate::app::{Result, SubwatchError};
use crate::config::RedditConfig;
use crate::domain::{BearerToken, ListingResponse};

pub const PAGE_LIMIT: u32 = 100;

/// reqwest-backed [`ApiClient`] with its own [`RateLimiter`].
pub struct HttpApiClient {
    client: Client,
    rate_limiter: RateLimiter,
    user_agent: String,
    token_url: String,
    api_base: String,
}

impl HttpApiClient {
    pub fn new(config: &RedditConfig) -> Result<Self> {
        SubwatchError::validate_non_blank(&config.user_agent, "user_agent")?;
        Url::parse(&config.token_url)?;
        Url::parse(&config.api_base)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(),
            user_agent: config.user_agent.clone(),
            token_url: config.token_url.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    fn token_endpoint(&self) -> Result<Url> {
        Ok(Url::parse_with_params(
            &self.token_url,
            &[("grant_type", "client_credentials")],
        )?)
    }

    fn listing_endpoint(&self, subreddit: &str, after: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}/new", self.api_base, subreddit))?;
        url.query_pairs_mut()
            .append_pair("after", after)
            .append_pair("limit", &PAGE_LIMIT.to_string());
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<ApiResponse<T>> {
        self.rate_limiter.throttle().await;

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "{}", context);
            SubwatchError::Http(e)
        })?;

        self.rate_limiter.observe(response.headers()).await;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "{}", context);
            return Err(SubwatchError::request_failed(status));
        }

        let content = response.text().await?;
        let value = parse_body::<T>(&content)?;

        Ok(ApiResponse::new(status, value, content))
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<ApiResponse<BearerToken>> {
        SubwatchError::validate_non_blank(client_id, "client_id")?;
        SubwatchError::validate_non_blank(client_secret, "client_secret")?;

        let request = self
            .client
            .post(self.token_endpoint()?)
            .basic_auth(client_id, Some(client_secret))
            .header(USER_AGENT, &self.user_agent);

        self.send(request, "Failed to authenticate").await
    }

    async fn fetch_page(
        &self,
        bearer_token: &str,
        subreddit: &str,
        after: &str,
    ) -> Result<ApiResponse<ListingResponse>> {
        SubwatchError::validate_non_blank(bearer_token, "bearer_token")?;
        SubwatchError::validate_non_blank(subreddit, "subreddit")?;

        tracing::debug!(subreddit, after, "Fetching listing page");

        let request = self
            .client
            .get(self.listing_endpoint(subreddit, after)?)
            .bearer_auth(bearer_token)
            .header(USER_AGENT, &self.user_agent);

        self.send(request, "Failed to fetch listing page").await
    }
}

fn parse_body<T: DeserializeOwned>(content: &str) -> Result<Option<T>> {
    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<Option<T>>(content).map_err(|e| {
        SubwatchError::Deserialization(format!(
            "could not read {}: {}",
            std::any::type_name::<T>(),
            e
        ))
    })
}
