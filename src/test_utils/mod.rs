//! Shared fakes and helpers for unit tests
mod common;
mod mock_cache;
mod mock_client;

pub use common::*;
pub use mock_cache::*;
pub use mock_client::*;
