use std::sync::Arc;

use super::QueryBridge;
use crate::BridgeConfig;
use crate::KeyCodec;
use crate::QueryCache;
use crate::QueryKey;
use crate::ReactiveClient;
use crate::Result;

pub struct QueryBridgeBuilder {
    client: Arc<dyn ReactiveClient>,
    config: BridgeConfig,
    codec: KeyCodec,
    cache: Option<Arc<dyn QueryCache>>,
}

impl QueryBridgeBuilder {
    /// Create a new builder with default config for `client`
    pub fn new(client: Arc<dyn ReactiveClient>) -> Self {
        Self {
            client,
            config: BridgeConfig::default(),
            codec: KeyCodec::default(),
            cache: None,
        }
    }

    /// Completely replaces the default configuration
    pub fn config(
        mut self,
        config: BridgeConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Hasher for opaque keys (default: [`crate::hash_key`])
    pub fn fallback_hasher(
        mut self,
        next: impl Fn(&QueryKey) -> String + Send + Sync + 'static,
    ) -> Self {
        self.codec = KeyCodec::with_fallback(next);
        self
    }

    /// Connect to `cache` during [`build`](QueryBridgeBuilder::build).
    ///
    /// A cache can also be bound later with [`QueryBridge::connect`].
    pub fn query_cache(
        mut self,
        cache: Arc<dyn QueryCache>,
    ) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Validate the configuration, build the bridge and connect it if a
    /// cache was given.
    pub fn build(self) -> Result<QueryBridge> {
        self.config.validate()?;

        let bridge = QueryBridge::from_parts(self.client, self.config, self.codec);
        if let Some(cache) = self.cache {
            bridge.connect(cache)?;
        }
        Ok(bridge)
    }
}
