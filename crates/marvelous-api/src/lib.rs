pub mod marvel;
pub mod traits;

pub use marvel::{
    Character, Credentials, DataContainer, MarvelClient, MarvelError, Series, Thumbnail,
    MAX_PAGE_LIMIT,
};
pub use traits::CatalogService;
