use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubwatchError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Request failed: {status} ({reason})")]
    RequestFailed { status: u16, reason: String },

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("No data in response: {0}")]
    NoData(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl SubwatchError {
    /// Build a `RequestFailed` from a status code, using its canonical reason phrase.
    pub fn request_failed(status: reqwest::StatusCode) -> Self {
        Self::RequestFailed {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    pub(crate) fn validate_non_blank(value: &str, name: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(Self::Validation(format!(
                "'{}' cannot be empty or whitespace",
                name
            )));
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credential '{0}'")]
    MissingCredentials(&'static str),

    #[error("token endpoint answered with HTTP {0}, expected 200")]
    UnexpectedStatus(u16),

    #[error("token response did not include a body")]
    EmptyBody,

    #[error("token response did not include a valid access token")]
    BlankToken,
}

pub type Result<T> = std::result::Result<T, SubwatchError>;
