pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use auth::{AuthParams, Credentials};
pub use client::{MarvelClient, MAX_PAGE_LIMIT};
pub use error::MarvelError;
pub use types::{Character, DataContainer, Series, Thumbnail};
