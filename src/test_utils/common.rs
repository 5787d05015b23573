use serde_json::Value;

use crate::FunctionReference;
use crate::QueryKey;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = env_logger::builder().is_test(true).try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

pub(crate) fn get_repo() -> FunctionReference {
    FunctionReference::new("repos:get")
}

pub(crate) fn repo_key(args: Value) -> QueryKey {
    QueryKey::reactive(get_repo(), args)
}

/// Builds an object whose keys are inserted in the given order
pub(crate) fn object_in_order(pairs: &[(&str, Value)]) -> Value {
    let mut map = serde_json::Map::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v.clone());
    }
    Value::Object(map)
}

/// Top-level object keys in iteration order
pub(crate) fn object_keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}
