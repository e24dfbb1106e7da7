pub mod http_client;
pub mod rate_limiter;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::app::Result;
use crate::domain::{BearerToken, ListingResponse};

pub use http_client::HttpApiClient;
pub use rate_limiter::{RateLimitState, RateLimiter};

/// Parsed body of a successful call, together with the raw status and content.
///
/// `value` is `None` when the server answered with an empty or `null` body.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub value: Option<T>,
    pub content: String,
}

impl<T> ApiResponse<T> {
    pub fn new(status: StatusCode, value: Option<T>, content: impl Into<String>) -> Self {
        Self {
            status,
            value,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait ApiClient {
    /// Obtain a bearer token through the client-credentials grant.
    async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<ApiResponse<BearerToken>>;

    /// Fetch one page of the newest posts of `subreddit`, starting after `after`.
    async fn fetch_page(
        &self,
        bearer_token: &str,
        subreddit: &str,
        after: &str,
    ) -> Result<ApiResponse<ListingResponse>>;
}
