//! Canonical JSON form of query arguments.
//!
//! Both the hash and the arguments sent over the wire go through
//! [`canonicalize`], so a watch and a one-shot fetch for the same key always
//! carry byte-identical arguments.
//!
//! Rules:
//! - object keys are emitted in lexicographic order at every depth;
//! - a float with an integral value inside the exactly representable range is
//!   written as an integer (`1.0` and `1` are the same argument, and so are
//!   `-0.0` and `0`);
//! - strings use standard JSON escaping.

use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

/// Largest integer a 64-bit float represents exactly (2^53 - 1)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Returns `value` with numbers normalized and object keys sorted.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(canonical_number(n)),
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (k, v) in entries {
                sorted.insert(k.clone(), canonicalize(v));
            }
            Value::Object(sorted)
        }
        other => other.clone(),
    }
}

/// Serializes `value` canonically.
///
/// Key order is enforced while writing, so the output does not depend on the
/// map implementation `serde_json` was compiled with.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(
    value: &Value,
    out: &mut String,
) {
    match value {
        Value::Number(n) => out.push_str(&canonical_number(n).to_string()),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        // null, bool and string already have a single JSON spelling
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn canonical_number(n: &Number) -> Number {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
                return Number::from(f as i64);
            }
        }
    }
    n.clone()
}
