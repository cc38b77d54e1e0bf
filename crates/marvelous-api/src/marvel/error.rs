use thiserror::Error;

/// Errors from the Marvel catalog API client.
#[derive(Debug, Error)]
pub enum MarvelError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Marvel API Error: {status} {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),
}
