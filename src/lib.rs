//! # Subwatch
//!
//! Watches subreddits for newly submitted posts.
//!
//! ## Architecture
//!
//! ```text
//! RateLimiter → ApiClient → DataService → Poller → subscribers
//!                                │
//!                          Cache / Store
//! ```
//!
//! Each [`Poller`](poller::Poller) records the titles present on its first
//! fetch as a baseline, then on every interval fetches the whole listing and
//! publishes the posts whose titles are not in that baseline.
//!
//! ## Quick Start
//!
//! ```bash
//! export SUBWATCH_CLIENT_ID=...
//! export SUBWATCH_CLIENT_SECRET=...
//!
//! # Print new posts from two subreddits every 2 seconds
//! subwatch watch rust programming --interval 2s
//!
//! # Print the current listing once
//! subwatch fetch rust
//!
//! # Show or rebuild the stored baseline
//! subwatch baseline rust --refresh
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// store, cache, API client, data service.
pub mod app;

/// Remote API access.
///
/// - [`ApiClient`](api::ApiClient): Async trait for token and listing requests
/// - [`HttpApiClient`](api::HttpApiClient): reqwest-based implementation
/// - [`RateLimiter`](api::RateLimiter): Quota tracking from response headers
pub mod api;

/// Short-lived in-memory cache with per-entry expiry.
pub mod cache;

/// Command-line interface using clap.
///
/// - `watch <subreddit>...` - Print new posts until Ctrl-C
/// - `fetch <subreddit>` - Print the current listing
/// - `baseline <subreddit>` - Show or rebuild the stored baseline
pub mod cli;

/// Configuration loaded from `~/.config/subwatch/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Post`](domain::Post): A listing entry, identified by its title
/// - [`BearerToken`](domain::BearerToken): OAuth2 access token with expiry
/// - [`Baseline`](domain::Baseline): Titles known before polling started
pub mod domain;

/// Per-subreddit polling loop with cancellation and broadcast delivery.
pub mod poller;

/// Token lifecycle, listing pages and the cache-over-store facade.
pub mod service;

/// Key/value persistence.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
/// - [`MemoryStore`](store::MemoryStore): In-process map
pub mod store;

#[cfg(test)]
mod testing;
