use std::fmt;
use std::time::Duration;

use serde_json::Value;

use super::QueryFn;
use crate::FetchConfig;
use crate::FunctionReference;
use crate::QueryKey;

/// Everything the pull cache needs to serve one reactive query.
///
/// ```ignore
/// let options = bridge.query_options(FunctionReference::new("repos:get"), json!({ "repo": "a/b" }));
/// cache.use_query(options.query_key, options.query_fn);
/// ```
#[derive(Clone)]
pub struct QueryOptions {
    pub query_key: QueryKey,
    pub query_fn: QueryFn,
    /// `None` = never stale; the watch keeps the entry current
    pub stale_time: Option<Duration>,
    /// Cache-level retries for a failed fetch
    pub retry: u32,
}

impl QueryOptions {
    pub(crate) fn new(
        function: FunctionReference,
        args: Value,
        query_fn: QueryFn,
        fetch: &FetchConfig,
    ) -> Self {
        Self {
            query_key: QueryKey::reactive(function, args),
            query_fn,
            stale_time: fetch.stale_time(),
            retry: fetch.retry,
        }
    }
}

impl fmt::Debug for QueryOptions {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("query_key", &self.query_key)
            .field("stale_time", &self.stale_time)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
