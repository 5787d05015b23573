//! Pull-cache query function backed by one-shot reactive queries.

mod options;
pub use options::*;


use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tracing::debug;

use crate::canonicalize;
use crate::ConsistencyError;
use crate::FunctionReference;
use crate::KeyCodec;
use crate::QueryKey;
use crate::ReactiveClient;
use crate::RemoteQueryError;
use crate::Result;

/// Fetch function installable as the pull cache's per-query `queryFn`
pub type QueryFn = Arc<dyn Fn(QueryKey) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Satisfies initial loads, explicit refetches and post-invalidate reloads.
///
/// Performs no retries of its own; failures go back to the cache untouched.
#[derive(Clone)]
pub struct QueryFunctionAdapter {
    client: Arc<dyn ReactiveClient>,
    codec: KeyCodec,
}

impl QueryFunctionAdapter {
    /// `codec` must be the one the cache hashes keys with, so reported
    /// hashes match the cache's.
    pub fn new(
        client: Arc<dyn ReactiveClient>,
        codec: KeyCodec,
    ) -> Self {
        Self { client, codec }
    }

    /// One-shot query with canonically encoded `args`.
    ///
    /// # Errors
    /// The [`RemoteQueryError`] returned by the client, unchanged.
    pub async fn fetch(
        &self,
        function: &FunctionReference,
        args: &Value,
    ) -> std::result::Result<Value, RemoteQueryError> {
        let args = canonicalize(args);
        debug!("[:QueryFunctionAdapter:fetch] running fetch for {}({})", function, args);
        self.client.query(function, &args).await
    }

    /// Fetch for a full cache key, as the cache hands it to its query function.
    ///
    /// # Errors
    /// - [`ConsistencyError::NotReactive`] for opaque keys
    /// - [`crate::Error::RemoteQuery`] when the remote call fails
    pub async fn fetch_key(
        &self,
        key: &QueryKey,
    ) -> Result<Value> {
        let reactive = key
            .as_reactive()
            .ok_or_else(|| ConsistencyError::NotReactive { hash: self.codec.hash(key) })?;
        let args = reactive.canonical_args();

        debug!("[:QueryFunctionAdapter:fetch_key] running fetch for {}({})", reactive.function, args);
        let value = self.client.query(reactive.function, &args).await?;
        Ok(value)
    }

    pub fn query_fn(&self) -> QueryFn {
        let adapter = self.clone();
        Arc::new(move |key: QueryKey| {
            let adapter = adapter.clone();
            async move { adapter.fetch_key(&key).await }.boxed()
        })
    }
}
