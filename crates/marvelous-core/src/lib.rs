pub mod config;
pub mod error;
pub mod library;
pub mod persistence;
pub mod route;
pub mod store;
