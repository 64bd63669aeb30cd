//! Error types for the parser and the interpreter.
//!
//! The two stages have disjoint failure modes (spec §7): parsing is pure
//! and its errors are always fatal; interpretation can recover from most of
//! its own errors via an `errorHandler`, with `AuthorizationDenied` carved
//! out as the one variant that is never routed through it.

use thiserror::Error;

/// Errors raised while compiling a [`crate::query::Query`] into an
/// [`crate::expression::Expression`].
///
/// Parsing is pure and deterministic: these errors always abort the whole
/// parse, never just one branch of it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// An object contained more than one `()`, `[]`, `<=`, or empty-target
    /// `=>` key.
    #[error("duplicate `{marker}` key in query object")]
    DuplicateReservedKey {
        /// The reserved marker that appeared twice (`"()"`, `"[]"`, `"<="`,
        /// or `"=>"`).
        marker: &'static str,
    },

    /// `[]`'s value was neither a number nor an array of 0-2 numbers.
    #[error("`[]` must be a number or an array of 0-2 numbers, got {found}")]
    InvalidCollectionSelector {
        /// A short description of what was found instead.
        found: String,
    },

    /// `()`'s value was not an array.
    #[error("`()` must be an array of parameters, got {found}")]
    ParamsNotArray {
        /// A short description of what was found instead.
        found: String,
    },

    /// A user key's `source=>target` form had more than one `=>`.
    #[error("malformed key `{key}`: a key may contain at most one `=>`")]
    MalformedKey {
        /// The raw key string that failed to parse.
        key: String,
    },

    /// A node had both a named-target child (`nestedExpressions`) and an
    /// empty-target child (`nextExpression`), or more than one empty-target
    /// child.
    #[error("key `{key}` mixes an inline `=>` target with named targets on the same object")]
    MixedTargets {
        /// The source key of the object where the conflict was found.
        key: String,
    },

    /// `{"||": ...}` appeared alongside other keys in the same object.
    #[error("`||` must be the sole key in its object")]
    ParallelNotSole,

    /// `{"||": ...}`'s value was not an array.
    #[error("`||` must be an array of queries, got {found}")]
    ParallelNotArray {
        /// A short description of what was found instead.
        found: String,
    },

    /// The query was not `true`, an object, or an array.
    #[error("invalid query shape: expected `true`, an object, or an array, got {found}")]
    InvalidShape {
        /// A short description of what was found instead.
        found: String,
    },
}

/// The operation an [`crate::options::Authorizer`] is being consulted about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// An attribute read (`sourceKey` with no `()`).
    Get,
    /// A method invocation (`sourceKey` with `()`).
    Call,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Get => write!(f, "get"),
            Operation::Call => write!(f, "call"),
        }
    }
}

/// Errors raised while evaluating an [`crate::expression::Expression`]
/// against a [`crate::target::Target`].
///
/// All variants except [`InterpretError::AuthorizationDenied`] are eligible
/// to be caught and replaced by a configured `errorHandler` (spec §7).
#[derive(Debug, Error)]
pub enum InterpretError {
    /// Descent continued through a missing (`undefined`) target without a
    /// `?` marking the traversal optional.
    #[error("`{source_key}` is undefined and the query does not mark it optional")]
    QueryOnUndefined {
        /// The source key whose resolved value was missing.
        source_key: String,
    },

    /// `()` was applied to a key with no corresponding method, and the
    /// traversal was not marked optional.
    #[error("`{source_key}` has no method to call")]
    MethodNotFound {
        /// The source key that had no corresponding method.
        source_key: String,
    },

    /// The configured [`crate::options::Authorizer`] returned `false` for a
    /// `get` or `call` operation. Never routed through `errorHandler` — it
    /// is a security boundary, not a recoverable condition (spec §7).
    #[error("authorization denied for {operation} on `{source_key}`")]
    AuthorizationDenied {
        /// The source key the operation targeted.
        source_key: String,
        /// Whether this was a `get` or a `call`.
        operation: Operation,
    },

    /// A host method invoked through [`crate::target::Target::invoke`]
    /// returned an error.
    #[error("error from host method `{source_key}`: {source}")]
    UserError {
        /// The source key of the method that failed.
        source_key: String,
        /// The underlying error the host method reported.
        #[source]
        source: anyhow::Error,
    },

    /// An index or slice bound referenced a collection position that does
    /// not exist and no optional marker or error handler covered it.
    #[error("collection selector out of range for `{source_key}`: {detail}")]
    CollectionSelectorOutOfRange {
        /// The source key whose collection selector failed.
        source_key: String,
        /// A short description of the failure.
        detail: String,
    },
}

impl InterpretError {
    /// Whether this error is eligible to be replaced by a configured
    /// `errorHandler`. Only [`InterpretError::AuthorizationDenied`] is
    /// excluded (spec §7).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, InterpretError::AuthorizationDenied { .. })
    }

    /// The source key this error is attributed to, for logging.
    pub fn source_key(&self) -> &str {
        match self {
            InterpretError::QueryOnUndefined { source_key }
            | InterpretError::MethodNotFound { source_key }
            | InterpretError::AuthorizationDenied { source_key, .. }
            | InterpretError::UserError { source_key, .. }
            | InterpretError::CollectionSelectorOutOfRange { source_key, .. } => source_key,
        }
    }
}
