//! Synchronization bridge that keeps a pull-based query cache populated with
//! live values from a push-based reactive subscription client.
//!
//! Data flow:
//! - cache lifecycle events -> [`CacheEventBridge`] -> [`SubscriptionRegistry`]
//!   (open/close one [`Watch`] per reactive key)
//! - watch notifications -> [`UpdatePropagator`] -> cache entry write
//! - cache fetch requests -> [`QueryFunctionAdapter`] -> one-shot remote query

mod bridge;
mod cache;
mod client;
mod config;
mod constants;
mod errors;
mod fetch;
mod key;
mod propagator;
mod registry;

pub use bridge::*;
pub use cache::*;
pub use client::*;
pub use config::*;
pub use constants::REACTIVE_HASH_PREFIX;
pub use errors::*;
pub use fetch::*;
pub use key::*;
pub use propagator::*;
pub use registry::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
