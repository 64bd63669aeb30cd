//! # Crucible Query
//!
//! A declarative query→expression compiler and async interpreter for
//! in-memory object graphs.
//!
//! A caller hands a JSON-shaped [`serde_json::Value`] query describing which
//! attributes to project, which methods to call and with what parameters,
//! and how to reshape the result. [`parser::parse_query`] compiles that
//! query once into a reusable [`expression::Expression`] intermediate
//! representation; [`interpreter::invoke_expression`] walks that expression
//! against a concrete [`target::Target`] graph, producing a JSON result
//! shaped the way the query asked.
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use crucible_query::{parser::ParseOptions, target::JsonTarget, options::InvokeOptions};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let target: Arc<dyn crucible_query::target::Target> =
//!     Arc::new(JsonTarget::new(json!({"title": "Inception", "year": 2010})));
//! let result = crucible_query::query(
//!     target,
//!     &json!({"title": true, "year": true}),
//!     &ParseOptions::default(),
//!     &InvokeOptions::new(),
//! )
//! .await
//! .unwrap();
//! assert_eq!(result, json!({"title": "Inception", "year": 2010}));
//! # }
//! ```

pub mod error;
pub mod expression;
pub mod interpreter;
pub mod key;
pub mod options;
pub mod parser;
pub mod target;

use std::sync::Arc;

use serde_json::Value;

pub use error::{InterpretError, Operation, ParseError};
pub use expression::{CollectionSelector, Expression, Node};
pub use interpreter::invoke_expression;
pub use options::{Authorizer, ErrorHandler, FnAuthorizer, FnErrorHandler, InvokeOptions};
pub use parser::{parse_query, ParseOptions};
pub use target::{JsonTarget, Target, TargetValue};

/// Either stage can fail; this is what [`query`] (the parse-then-interpret
/// convenience wrapper) returns.
///
/// Not part of the core two-stage design — most callers either want to
/// compile a query once and interpret it many times (use [`parse_query`]
/// and [`invoke_expression`] directly) or don't care about the distinction
/// (use this).
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The query failed to compile.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The compiled expression failed to evaluate.
    #[error(transparent)]
    Interpret(#[from] InterpretError),
}

/// Compile `query` and evaluate it against `target` in one call.
///
/// Equivalent to `invoke_expression(target, &parse_query(query, parse_options)?, invoke_options)`.
/// Prefer calling [`parse_query`] once and reusing the [`Expression`] across
/// many [`invoke_expression`] calls when the same query runs repeatedly —
/// this wrapper recompiles it every time.
pub async fn query(
    target: Arc<dyn Target>,
    query: &Value,
    parse_options: &ParseOptions,
    invoke_options: &InvokeOptions,
) -> Result<Value, QueryError> {
    let expression = parse_query(query, parse_options)?;
    Ok(invoke_expression(target, &expression, invoke_options).await?)
}
