use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarvelousError {
    #[error("config error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(#[from] marvelous_api::MarvelError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
