use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Post;

/// Raw body of `GET /r/{subreddit}/new`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingResponse {
    #[serde(default)]
    pub data: Option<ListingData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<serde_json::Value>,
    pub children: Vec<ListingChild>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingChild {
    pub data: Post,
}

/// One page of posts plus the cursor for the page that follows it.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub posts: Vec<Post>,
    pub after: Option<String>,
}

impl ListingPage {
    /// Cursor of the next page, or `None` when this is the last one.
    pub fn next_cursor(&self) -> Option<&str> {
        self.after
            .as_deref()
            .filter(|cursor| !cursor.trim().is_empty())
    }
}

impl From<ListingData> for ListingPage {
    fn from(data: ListingData) -> Self {
        Self {
            posts: data.children.into_iter().map(|child| child.data).collect(),
            after: data.after,
        }
    }
}

/// Titles already known for a subreddit, stamped with when they were collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    titles: HashSet<String>,
    built_at: DateTime<Utc>,
}

impl Default for Baseline {
    fn default() -> Self {
        Self::with_titles(HashSet::new())
    }
}

impl Baseline {
    pub fn store_key(subreddit: &str) -> String {
        format!("InitialTitles_{}", subreddit)
    }

    fn with_titles(titles: HashSet<String>) -> Self {
        Self {
            titles,
            built_at: Utc::now(),
        }
    }

    pub fn from_posts(posts: &[Post]) -> Self {
        Self::with_titles(posts.iter().map(|p| p.identity().to_string()).collect())
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn with_built_at(mut self, built_at: DateTime<Utc>) -> Self {
        self.built_at = built_at;
        self
    }

    pub fn age_since(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.built_at)
    }

    /// Whether the baseline is younger than `ttl` at `now`.
    ///
    /// A `ttl` too large to represent never expires.
    pub fn is_fresh_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match TimeDelta::from_std(ttl) {
            Ok(ttl) => self.age_since(now) < ttl,
            Err(_) => true,
        }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.is_fresh_at(ttl, Utc::now())
    }

    pub fn contains(&self, title: &str) -> bool {
        self.titles.contains(title)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Posts whose title is not part of the baseline, in fetch order.
    pub fn new_posts(&self, fetched: Vec<Post>) -> Vec<Post> {
        fetched
            .into_iter()
            .filter(|post| !self.contains(post.identity()))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Baseline {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::with_titles(iter.into_iter().map(Into::into).collect())
    }
}
