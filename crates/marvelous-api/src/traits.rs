//! Trait definition for the comic catalog.
//!
//! The store talks to the catalog only through this trait, so it can run
//! against the real HTTP client or an in-process fake.

use std::future::Future;

use crate::marvel::{Character, DataContainer, Series};

/// Read-only access to the series and character catalog.
pub trait CatalogService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// One page of series, `limit` items starting at `offset`.
    fn series_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> impl Future<Output = Result<DataContainer<Series>, Self::Error>> + Send;

    /// A single series by id. The result holds at most one item.
    fn series_detail(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<DataContainer<Series>, Self::Error>> + Send;

    /// Series whose title starts with `prefix` (single page).
    fn search_series(
        &self,
        prefix: &str,
        limit: u32,
    ) -> impl Future<Output = Result<DataContainer<Series>, Self::Error>> + Send;

    /// The character at a given offset of the catalog, one item per page.
    fn character_at(
        &self,
        offset: u32,
    ) -> impl Future<Output = Result<DataContainer<Character>, Self::Error>> + Send;
}
