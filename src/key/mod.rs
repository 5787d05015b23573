//! Query keys and their canonical hashes.
//!
//! A [`QueryKey`] is whatever the pull cache uses to address an entry. It is
//! *reactive* when its first part is a [`FunctionReference`]; the second part
//! is then the function arguments and anything after that is ignored for
//! hashing. Every other key is *opaque* and is hashed by the fallback hasher
//! the bridge was configured with.

mod canonical;
mod codec;

pub use canonical::*;
pub use codec::*;


use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use serde_json::Value;

/// Identity of a remote read operation, e.g. `repos:get`.
///
/// Two references are equal iff their names are equal.
#[derive(Clone, Debug)]
pub struct FunctionReference {
    name: Arc<str>,
}

impl FunctionReference {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for FunctionReference {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.name == other.name
    }
}

impl Eq for FunctionReference {}

impl Hash for FunctionReference {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        self.name.hash(state);
    }
}

impl fmt::Display for FunctionReference {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One element of a [`QueryKey`]
#[derive(Clone, Debug, PartialEq)]
pub enum KeyPart {
    /// Marker part: only a function reference in first position makes a key reactive
    Function(FunctionReference),
    Value(Value),
}

impl From<Value> for KeyPart {
    fn from(value: Value) -> Self {
        KeyPart::Value(value)
    }
}

impl From<FunctionReference> for KeyPart {
    fn from(function: FunctionReference) -> Self {
        KeyPart::Function(function)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryKey {
    parts: Vec<KeyPart>,
}

/// Borrowed view of a reactive key
#[derive(Clone, Copy, Debug)]
pub struct ReactiveKey<'a> {
    pub function: &'a FunctionReference,
    /// `None` when the key carried no argument part
    pub args: Option<&'a Value>,
}

impl ReactiveKey<'_> {
    /// Arguments in canonical form; a missing argument part is the empty object
    pub fn canonical_args(&self) -> Value {
        match self.args {
            Some(args) => canonicalize(args),
            None => Value::Object(Default::default()),
        }
    }
}

impl QueryKey {
    /// `[function, args]`
    pub fn reactive(
        function: FunctionReference,
        args: Value,
    ) -> Self {
        Self {
            parts: vec![KeyPart::Function(function), KeyPart::Value(args)],
        }
    }

    /// `[function, args, options]`; `options` never affects the hash
    pub fn reactive_with_options(
        function: FunctionReference,
        args: Value,
        options: Value,
    ) -> Self {
        Self {
            parts: vec![
                KeyPart::Function(function),
                KeyPart::Value(args),
                KeyPart::Value(options),
            ],
        }
    }

    pub fn from_parts(parts: impl IntoIterator<Item = KeyPart>) -> Self {
        Self {
            parts: parts.into_iter().collect(),
        }
    }

    /// A key made only of plain values
    pub fn opaque(parts: impl IntoIterator<Item = Value>) -> Self {
        Self::from_parts(parts.into_iter().map(KeyPart::Value))
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    pub fn is_reactive(&self) -> bool {
        self.as_reactive().is_some()
    }

    pub fn as_reactive(&self) -> Option<ReactiveKey<'_>> {
        let function = match self.parts.first() {
            Some(KeyPart::Function(function)) => function,
            _ => return None,
        };

        match self.parts.get(1) {
            None => Some(ReactiveKey { function, args: None }),
            Some(KeyPart::Value(args)) => Some(ReactiveKey {
                function,
                args: Some(args),
            }),
            Some(KeyPart::Function(_)) => None,
        }
    }
}

/// Deterministic string identity of a [`QueryKey`]
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKeyHash(Arc<str>);

impl QueryKeyHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for QueryKeyHash {
    fn from(hash: String) -> Self {
        Self(Arc::from(hash))
    }
}

impl From<&str> for QueryKeyHash {
    fn from(hash: &str) -> Self {
        Self(Arc::from(hash))
    }
}

impl fmt::Display for QueryKeyHash {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}
