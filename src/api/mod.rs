//! REST access to the catalog and the user's watch state.

pub mod catalog;
pub mod client;
pub mod errors;
pub mod retry;
pub mod watch_state;

pub use catalog::{CatalogApi, HttpCatalogApi};
pub use client::ApiClient;
pub use errors::ApiError;
pub use retry::RetryPolicy;
pub use watch_state::{HttpWatchStateApi, WatchStateApi};
