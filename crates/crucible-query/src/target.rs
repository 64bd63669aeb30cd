//! The `target` the interpreter walks (spec §9 "Dynamic key access").
//!
//! In a dynamically typed host the target is just the language's own object
//! graph; in Rust we need an explicit capability trait. `Target` is the
//! polymorphic capability set spec §9 prescribes for statically typed
//! hosts — `read`, `invoke`, plus existence checks — collapsed slightly:
//! `indexGet`/`slice`/`length` fold into [`TargetValue::Sequence`] because
//! this runtime's object graphs are always fully in-memory (see
//! `DESIGN.md`).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// A value flowing through evaluation: either a plain JSON scalar, a
/// further-resolvable host object, or an ordered sequence of either.
///
/// Distinct from `serde_json::Value::Null`: [`TargetValue::Undefined`]
/// models the host language's "missing" (spec's `undefined`), which is not
/// the same thing as a present `null`.
#[derive(Clone)]
#[allow(clippy::large_enum_variant)]
pub enum TargetValue {
    /// Missing: an attribute that does not exist, or a method that does
    /// not exist.
    Undefined,
    /// A plain JSON leaf value (including `null`).
    Scalar(Value),
    /// A host object with its own attributes/methods.
    Node(Arc<dyn Target>),
    /// An ordered collection, each element independently a scalar, node,
    /// or nested sequence.
    Sequence(Vec<TargetValue>),
}

impl std::fmt::Debug for TargetValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetValue::Undefined => write!(f, "Undefined"),
            TargetValue::Scalar(v) => write!(f, "Scalar({v})"),
            TargetValue::Node(_) => write!(f, "Node(..)"),
            TargetValue::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
        }
    }
}

impl TargetValue {
    /// Collapse this value into plain JSON for the final query result
    /// (spec §4.2 step 3, "Leaf"). `Undefined` becomes `null`, matching
    /// how the reference host serializes a missing value.
    pub fn materialize(&self) -> Value {
        match self {
            TargetValue::Undefined => Value::Null,
            TargetValue::Scalar(v) => v.clone(),
            TargetValue::Node(node) => node.to_output(),
            TargetValue::Sequence(items) => {
                Value::Array(items.iter().map(TargetValue::materialize).collect())
            }
        }
    }

    /// Number of elements, if this value is a sequence (spec's `length()`
    /// capability).
    pub fn len(&self) -> Option<usize> {
        match self {
            TargetValue::Sequence(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Whether this value is the "missing" sentinel.
    pub fn is_undefined(&self) -> bool {
        matches!(self, TargetValue::Undefined)
    }
}

impl From<Value> for TargetValue {
    fn from(value: Value) -> Self {
        TargetValue::Scalar(value)
    }
}

/// The capability set a host object graph exposes to the interpreter
/// (spec §9).
///
/// Library consumers implement this for their own domain types to get
/// attribute reads and method calls dispatched through the query runtime;
/// [`JsonTarget`] is the built-in implementation for plain JSON data with
/// no methods.
#[async_trait]
pub trait Target: Send + Sync {
    /// Read attribute `key`. Returns [`TargetValue::Undefined`] if the
    /// attribute does not exist — this is not an error (spec §4.2 step 1).
    async fn read(&self, key: &str) -> Result<TargetValue, anyhow::Error>;

    /// Whether `key` names a method on this target, without invoking it.
    /// Consulted before authorization so a missing method is never run
    /// past the authorizer (spec §4.2 step 1).
    fn has_method(&self, key: &str) -> bool;

    /// Invoke method `key` with `params` and the interpreter's `context`
    /// appended as a trailing argument (spec §4.2 step 1, §6 `context`
    /// option). Only called after [`Target::has_method`] returned `true`
    /// and the authorizer allowed the call.
    async fn invoke(
        &self,
        key: &str,
        params: &[Value],
        context: Option<&Value>,
    ) -> Result<TargetValue, anyhow::Error>;

    /// Collapse this node to plain JSON when evaluation stops here with no
    /// further descent (spec §4.2 step 3).
    fn to_output(&self) -> Value;
}

/// A [`Target`] over plain `serde_json::Value` data, with no methods.
///
/// This is the target used by the CLI wrapper and by tests that only
/// exercise attribute projection, renaming, slicing, and optional chaining
/// — everything in spec §8's scenarios 1, 3, 4, 7, and 8. Scenarios that
/// call methods (2, 5, 6, 9) implement [`Target`] directly for a small test
/// double instead.
#[derive(Clone)]
pub struct JsonTarget(Value);

impl JsonTarget {
    /// Wrap a JSON value as a target graph root.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    fn wrap(value: &Value) -> TargetValue {
        match value {
            Value::Array(items) => {
                TargetValue::Sequence(items.iter().map(JsonTarget::wrap).collect())
            }
            other => TargetValue::Node(Arc::new(JsonTarget(other.clone()))),
        }
    }
}

#[async_trait]
impl Target for JsonTarget {
    async fn read(&self, key: &str) -> Result<TargetValue, anyhow::Error> {
        match self.0.as_object().and_then(|obj| obj.get(key)) {
            Some(value) => Ok(JsonTarget::wrap(value)),
            None => Ok(TargetValue::Undefined),
        }
    }

    fn has_method(&self, _key: &str) -> bool {
        false
    }

    async fn invoke(
        &self,
        key: &str,
        _params: &[Value],
        _context: Option<&Value>,
    ) -> Result<TargetValue, anyhow::Error> {
        anyhow::bail!("JsonTarget has no methods; attempted to call `{key}`")
    }

    fn to_output(&self) -> Value {
        self.0.clone()
    }
}

/// Convert a root [`Target`] into the [`TargetValue`] evaluation starts
/// from.
pub fn root(target: Arc<dyn Target>) -> TargetValue {
    TargetValue::Node(target)
}
