use chrono::{DateTime, Duration, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Short-lived credential returned by the client-credentials grant.
///
/// `expires_at` is fixed when the value is constructed; the token is valid
/// while `now < expires_at`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BearerToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    /// Returns `None` when `expires_in` puts the expiry out of range.
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in: i64,
        scope: impl Into<String>,
    ) -> Option<Self> {
        Self::issued_at(access_token, token_type, expires_in, scope, Utc::now())
    }

    pub fn issued_at(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in: i64,
        scope: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Option<Self> {
        let expires_at = Duration::try_seconds(expires_in)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))?;

        Some(Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expires_in,
            scope: scope.into(),
            expires_at,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    scope: Option<String>,
}

impl<'de> Deserialize<'de> for BearerToken {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = TokenResponse::deserialize(deserializer)?;
        let expires_in = raw.expires_in;
        Self::new(
            raw.access_token,
            raw.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_in,
            raw.scope.unwrap_or_else(|| "*".to_string()),
        )
        .ok_or_else(|| de::Error::custom(format!("expires_in {} is out of range", expires_in)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_fixed_at_construction() {
        let issued = Utc::now();
        let token = BearerToken::issued_at("abc", "bearer", 3600, "*", issued).unwrap();
        assert_eq!(token.expires_at, issued + Duration::seconds(3600));
        assert!(token.is_valid_at(issued + Duration::seconds(3599)));
        assert!(!token.is_valid_at(issued + Duration::seconds(3600)));
    }

    #[test]
    fn test_zero_ttl_is_never_valid() {
        let token = BearerToken::new("abc", "bearer", 0, "*").unwrap();
        assert!(!token.is_valid());
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let token: BearerToken =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":86400}"#).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.scope, "*");
        assert!(token.is_valid());
    }

    #[test]
    fn test_deserialize_requires_access_token() {
        let result: serde_json::Result<BearerToken> =
            serde_json::from_str(r#"{"token_type":"bearer","expires_in":60}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_lifetime_is_rejected() {
        assert!(BearerToken::new("abc", "bearer", i64::MAX, "*").is_none());
        assert!(BearerToken::new("abc", "bearer", i64::MIN, "*").is_none());

        let result: serde_json::Result<BearerToken> = serde_json::from_str(
            r#"{"access_token":"abc","expires_in":9223372036854775807}"#,
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
