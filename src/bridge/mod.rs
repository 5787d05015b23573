//! Bridge between a push-based reactive client and a pull-based query cache.
//!
//! Provides:
//! - [`QueryBridge`] - entry point; owns the cache connection
//! - [`QueryBridgeBuilder`] - configurable construction
//! - [`CacheEventBridge`] - cache lifecycle events to subscribe/unsubscribe edges
//! - [`DiagnosticsEmitter`] - [`BridgeEvent`] stream for logging and tooling
//!
//! # Basic Usage
//! ```ignore
//! use std::sync::Arc;
//! use query_bridge::{FunctionReference, QueryBridge};
//! use serde_json::json;
//!
//! let bridge = QueryBridge::builder(reactive_client)
//!     .query_cache(cache.clone())
//!     .build()?;
//!
//! // install the key hasher and the fetch function in the cache
//! let codec = bridge.key_codec().clone();
//! let options = bridge.query_options(FunctionReference::new("repos:get"), json!({ "repo": "a/b" }));
//! ```

mod builder;
mod connection;
mod diagnostics;
mod event_bridge;

pub use builder::*;
pub use diagnostics::*;
pub use event_bridge::*;


use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde_json::Value;
use tracing::debug;
use tracing::info;
use tracing::warn;

use connection::BridgeConnection;

use crate::BridgeConfig;
use crate::BridgeError;
use crate::CacheEvent;
use crate::ConsistencyError;
use crate::Error;
use crate::FunctionReference;
use crate::KeyCodec;
use crate::Propagation;
use crate::QueryCache;
use crate::QueryFn;
use crate::QueryFunctionAdapter;
use crate::QueryKey;
use crate::QueryKeyHash;
use crate::QueryOptions;
use crate::ReactiveClient;
use crate::RemoteQueryError;
use crate::Result;
use crate::Subscription;

/// Keeps a pull-based query cache populated with live values from a
/// push-based reactive client.
///
/// Created through [`QueryBridge::builder`]. A bridge binds to at most one
/// cache at a time.
#[derive(Clone)]
pub struct QueryBridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: BridgeConfig,
    codec: KeyCodec,
    client: Arc<dyn ReactiveClient>,
    adapter: QueryFunctionAdapter,
    diagnostics: Arc<DiagnosticsEmitter>,
    connection: ArcSwapOption<BridgeConnection>,
}

impl QueryBridge {
    pub fn builder(client: Arc<dyn ReactiveClient>) -> QueryBridgeBuilder {
        QueryBridgeBuilder::new(client)
    }

    pub(crate) fn from_parts(
        client: Arc<dyn ReactiveClient>,
        config: BridgeConfig,
        codec: KeyCodec,
    ) -> Self {
        let diagnostics = Arc::new(DiagnosticsEmitter::new(config.diagnostics.max_listeners));
        Self {
            inner: Arc::new(BridgeInner {
                adapter: QueryFunctionAdapter::new(Arc::clone(&client), codec.clone()),
                config,
                codec,
                client,
                diagnostics,
                connection: ArcSwapOption::empty(),
            }),
        }
    }

    /// Bind the bridge to `cache` and start mirroring its lifecycle events.
    ///
    /// # Errors
    /// [`BridgeError::AlreadyConnected`] if a cache is already bound; call
    /// [`QueryBridge::disconnect`] first.
    pub fn connect(
        &self,
        cache: Arc<dyn QueryCache>,
    ) -> Result<()> {
        let connection = BridgeConnection::new(
            cache,
            Arc::clone(&self.inner.client),
            Arc::clone(&self.inner.diagnostics),
            &self.inner.config,
        );

        let previous = self
            .inner
            .connection
            .compare_and_swap(&None::<Arc<BridgeConnection>>, Some(Arc::clone(&connection)));
        if previous.is_some() {
            warn!("[:QueryBridge:connect] rejected, bridge already connected");
            return Err(BridgeError::AlreadyConnected.into());
        }

        connection.attach();
        info!("[:QueryBridge:connect] connected to query cache");
        Ok(())
    }

    /// Stop listening to the cache and close every open subscription.
    ///
    /// Returns the hashes that were unsubscribed.
    ///
    /// # Errors
    /// [`BridgeError::NotConnected`] if no cache is bound.
    pub fn disconnect(&self) -> Result<Vec<QueryKeyHash>> {
        let connection = self.inner.connection.swap(None).ok_or(BridgeError::NotConnected)?;
        let closed = connection.detach();
        info!("[:QueryBridge:disconnect] disconnected from query cache");
        Ok(closed)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connection.load().is_some()
    }

    /// The bound cache.
    ///
    /// # Errors
    /// [`BridgeError::NotConnected`] if no cache is bound.
    pub fn query_cache(&self) -> Result<Arc<dyn QueryCache>> {
        Ok(Arc::clone(self.connection()?.cache()))
    }

    /// Installable as the cache's global key hasher
    pub fn key_hash(
        &self,
        key: &QueryKey,
    ) -> QueryKeyHash {
        self.inner.codec.hash(key)
    }

    pub fn key_codec(&self) -> &KeyCodec {
        &self.inner.codec
    }

    /// One-shot fetch, installable as the cache's per-query fetch function
    pub async fn fetch(
        &self,
        function: &FunctionReference,
        args: &Value,
    ) -> std::result::Result<Value, RemoteQueryError> {
        self.inner.adapter.fetch(function, args).await
    }

    pub fn query_fn(&self) -> QueryFn {
        self.inner.adapter.query_fn()
    }

    /// Key, fetch function, staleness and retry settings for one reactive query
    pub fn query_options(
        &self,
        function: FunctionReference,
        args: Value,
    ) -> QueryOptions {
        QueryOptions::new(function, args, self.query_fn(), &self.inner.config.fetch)
    }

    /// Feed one cache event through the bridge synchronously.
    ///
    /// The listener installed by [`QueryBridge::connect`] calls the same
    /// handler and logs errors instead of returning them.
    pub fn handle_cache_event(
        &self,
        event: &CacheEvent,
    ) -> Result<()> {
        self.connection()?.events().handle(event)
    }

    /// Propagate the current snapshot of `hash` into the cache.
    pub fn on_update(
        &self,
        hash: &QueryKeyHash,
    ) -> Result<Propagation> {
        self.connection()?.propagate(hash)
    }

    /// Propagate every open subscription, in hash order.
    ///
    /// A subscription closed while the sweep runs is reported as
    /// [`Propagation::Skipped`].
    pub fn refresh_all(&self) -> Result<Vec<(QueryKeyHash, Propagation)>> {
        let connection = self.connection()?;
        let hashes = connection.registry().hashes();

        let mut outcomes = Vec::with_capacity(hashes.len());
        for hash in hashes {
            let propagation = match connection.propagate(&hash) {
                Ok(propagation) => propagation,
                Err(Error::Consistency(ConsistencyError::UnknownSubscription { .. })) => {
                    debug!("[:QueryBridge:refresh_all] {} closed during refresh, skipping", hash);
                    Propagation::Skipped
                }
                Err(e) => return Err(e),
            };
            outcomes.push((hash, propagation));
        }
        Ok(outcomes)
    }

    pub fn subscription(
        &self,
        hash: &QueryKeyHash,
    ) -> Option<Arc<Subscription>> {
        self.inner
            .connection
            .load_full()
            .and_then(|connection| connection.registry().get(hash))
    }

    /// Open subscriptions, sorted
    pub fn subscribed_hashes(&self) -> Vec<QueryKeyHash> {
        self.inner
            .connection
            .load_full()
            .map(|connection| connection.registry().hashes())
            .unwrap_or_default()
    }

    pub fn diagnostics(&self) -> &DiagnosticsEmitter {
        &self.inner.diagnostics
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    fn connection(&self) -> Result<Arc<BridgeConnection>> {
        self.inner
            .connection
            .load_full()
            .ok_or_else(|| BridgeError::NotConnected.into())
    }
}
