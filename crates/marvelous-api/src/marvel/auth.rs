//! Request signing for the Marvel public API.
//!
//! Every call carries `ts`, `apikey` and `hash`, where
//! `hash = md5(ts + private_key + public_key)` in lowercase hex.

use md5::{Digest, Md5};

use super::error::MarvelError;

pub const PUBLIC_KEY_ENV: &str = "MARVEL_PUBLIC_KEY";
pub const PRIVATE_KEY_ENV: &str = "MARVEL_PRIVATE_KEY";

/// The public/private key pair issued by the developer portal.
#[derive(Clone, Default)]
pub struct Credentials {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: Some(public_key.into()),
            private_key: Some(private_key.into()),
        }
    }

    /// Read both keys from the process environment.
    pub fn from_env() -> Self {
        Self {
            public_key: std::env::var(PUBLIC_KEY_ENV).ok(),
            private_key: std::env::var(PRIVATE_KEY_ENV).ok(),
        }
    }

    /// Fill any missing key from `other`.
    pub fn or(self, other: Credentials) -> Self {
        Self {
            public_key: non_empty(self.public_key).or(other.public_key),
            private_key: non_empty(self.private_key).or(other.private_key),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Query parameters authenticating a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthParams {
    pub timestamp: i64,
    pub public_key: String,
    pub hash: String,
}

impl AuthParams {
    /// Sign a request at the current wall-clock time (ms since epoch).
    pub fn generate(credentials: &Credentials) -> Result<Self, MarvelError> {
        Self::generate_at(credentials, chrono::Utc::now().timestamp_millis())
    }

    pub fn generate_at(credentials: &Credentials, timestamp: i64) -> Result<Self, MarvelError> {
        let (Some(public_key), Some(private_key)) = (
            non_empty(credentials.public_key.clone()),
            non_empty(credentials.private_key.clone()),
        ) else {
            return Err(MarvelError::Config(format!(
                "Marvel API keys are not configured. Set {PUBLIC_KEY_ENV} and {PRIVATE_KEY_ENV}."
            )));
        };

        let digest = Md5::digest(format!("{timestamp}{private_key}{public_key}").as_bytes());
        Ok(Self {
            timestamp,
            public_key,
            hash: hex::encode(digest),
        })
    }

    /// The `ts`, `apikey`, `hash` triple in query order.
    pub fn query_pairs(&self) -> [(&'static str, String); 3] {
        [
            ("ts", self.timestamp.to_string()),
            ("apikey", self.public_key.clone()),
            ("hash", self.hash.clone()),
        ]
    }
}
