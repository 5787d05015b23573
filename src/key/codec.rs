use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::canonical_json;
use super::KeyPart;
use super::QueryKey;
use super::QueryKeyHash;
use super::ReactiveKey;
use crate::constants::REACTIVE_HASH_PREFIX;
use crate::constants::REACTIVE_HASH_SEPARATOR;

/// Hashing function for keys the bridge does not own
pub type FallbackHasher = dyn Fn(&QueryKey) -> String + Send + Sync;

/// Pure key-hashing function installable as the pull cache's global hasher.
///
/// Reactive keys hash to `convex-query|<function>-<canonical args>`; opaque
/// keys are delegated to the fallback hasher so non-reactive caching keeps
/// whatever hashing it had before.
#[derive(Clone)]
pub struct KeyCodec {
    fallback: Arc<FallbackHasher>,
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::with_fallback(hash_key)
    }
}

impl fmt::Debug for KeyCodec {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("KeyCodec").finish_non_exhaustive()
    }
}

impl KeyCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose reactive hashing over a caller-provided hasher for opaque keys
    pub fn with_fallback(next: impl Fn(&QueryKey) -> String + Send + Sync + 'static) -> Self {
        Self {
            fallback: Arc::new(next),
        }
    }

    pub fn hash(
        &self,
        key: &QueryKey,
    ) -> QueryKeyHash {
        match key.as_reactive() {
            Some(reactive) => Self::reactive_hash(reactive),
            None => QueryKeyHash::from((self.fallback)(key)),
        }
    }

    pub fn reactive_hash(key: ReactiveKey<'_>) -> QueryKeyHash {
        let args = canonical_json(&key.canonical_args());

        let mut hash =
            String::with_capacity(REACTIVE_HASH_PREFIX.len() + key.function.name().len() + 1 + args.len());
        hash.push_str(REACTIVE_HASH_PREFIX);
        hash.push_str(key.function.name());
        hash.push(REACTIVE_HASH_SEPARATOR);
        hash.push_str(&args);
        QueryKeyHash::from(hash)
    }
}

/// Default hasher for opaque keys: the canonical JSON array of all parts.
///
/// A function reference outside first position is written as
/// `{"$functionName": name}`.
pub fn hash_key(key: &QueryKey) -> String {
    let parts: Vec<Value> = key
        .parts()
        .iter()
        .map(|part| match part {
            KeyPart::Value(value) => value.clone(),
            KeyPart::Function(function) => {
                let mut marker = serde_json::Map::new();
                marker.insert("$functionName".to_string(), Value::String(function.name().to_string()));
                Value::Object(marker)
            }
        })
        .collect();

    canonical_json(&Value::Array(parts))
}
