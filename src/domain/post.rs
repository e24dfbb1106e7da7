use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single submission from a subreddit listing.
///
/// Posts are identified by their title when diffing against a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub author: String,
    pub url: String,
    pub num_comments: i64,
    pub subreddit_name_prefixed: String,
    pub ups: i64,
    pub downs: i64,
    pub over_18: bool,
    #[serde(skip, default = "Utc::now")]
    pub synced_at: DateTime<Utc>,
}

impl Post {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: String::new(),
            url: String::new(),
            num_comments: 0,
            subreddit_name_prefixed: String::new(),
            ups: 0,
            downs: 0,
            over_18: false,
            synced_at: Utc::now(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.title
    }

    pub fn display_author(&self) -> String {
        if self.author.is_empty() {
            "(unknown)".to_string()
        } else {
            format!("u/{}", self.author)
        }
    }
}
