//! Push-based reactive client collaborator.
//!
//! The bridge never talks to a server itself. It needs exactly two
//! primitives from the reactive client:
//! - [`ReactiveClient::watch_query`] - a live subscription handle ([`Watch`])
//! - [`ReactiveClient::query`] - a one-shot read
//!
//! Arguments handed to either primitive are always in canonical form (see
//! [`crate::canonicalize`]).

#[cfg(test)]
use mockall::automock;
use async_trait::async_trait;
use serde_json::Value;

use crate::FunctionReference;
use crate::RemoteQueryError;
use crate::SnapshotError;

/// Invoked by a [`Watch`] every time its value may have changed
pub type UpdateCallback = Box<dyn Fn() + Send + Sync>;

/// An owned one-shot closure that removes a listener when called.
pub type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

/// Live push subscription to one reactive query.
///
/// Dropping the watch without calling the [`Unsubscribe`] returned by
/// [`Watch::on_update`] leaves the listener attached.
#[cfg_attr(test, automock)]
pub trait Watch: Send + Sync {
    /// Most recent value available without a network round trip
    fn local_query_result(&self) -> std::result::Result<Value, SnapshotError>;

    /// Register `callback`; calling the returned closure detaches it
    /// synchronously.
    fn on_update(
        &self,
        callback: UpdateCallback,
    ) -> Unsubscribe;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReactiveClient: Send + Sync + 'static {
    fn watch_query(
        &self,
        function: &FunctionReference,
        args: &Value,
    ) -> Box<dyn Watch>;

    async fn query(
        &self,
        function: &FunctionReference,
        args: &Value,
    ) -> std::result::Result<Value, RemoteQueryError>;
}
