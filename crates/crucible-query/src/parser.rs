//! `Query → Expression` compilation (spec §4.1).
//!
//! Parsing is a pure structural recursion over `serde_json::Value` with no
//! access to any target graph. It either succeeds with a fully-formed
//! [`Expression`] or fails fast with a [`ParseError`] — there is no partial
//! result.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ParseError;
use crate::expression::{CollectionSelector, Expression, Node};
use crate::key::{is_default_built_in_key, parse_key, KeyFilter, KeyTarget};

const PARAMS_KEY: &str = "()";
const COLLECTION_KEY: &str = "[]";
const SOURCE_VALUE_KEY: &str = "<=";
const PARALLEL_KEY: &str = "||";

/// Options accepted by [`parse_query`] (spec §4.1, §6).
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Source keys matching this filter are dropped from the compiled
    /// expression, unless also matched by `accept_keys`.
    pub ignore_keys: KeyFilter,
    /// Source keys matching this filter are always kept, overriding
    /// `ignore_keys` and `ignore_built_in_keys`.
    pub accept_keys: KeyFilter,
    /// Drop source keys that coincide with the default built-in key set
    /// (spec §6). Default `true`.
    pub ignore_built_in_keys: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            ignore_keys: KeyFilter::none(),
            accept_keys: KeyFilter::none(),
            ignore_built_in_keys: true,
        }
    }
}

impl ParseOptions {
    fn should_drop(&self, source_key: &str) -> bool {
        if self.accept_keys.matches(source_key) {
            return false;
        }
        if self.ignore_keys.matches(source_key) {
            return true;
        }
        self.ignore_built_in_keys && is_default_built_in_key(source_key)
    }
}

/// Compile a `Query` (a `serde_json::Value` shaped per spec §3) into an
/// [`Expression`] ready for [`crate::interpreter::invoke_expression`].
pub fn parse_query(query: &Value, options: &ParseOptions) -> Result<Expression, ParseError> {
    parse_frame(query, "", false, options)
}

/// Parse `query` under an inherited `(sourceKey, isOptional)` frame — the
/// frame a sibling array or a user key's value is parsed with (spec §4.1
/// steps 1 and 4).
fn parse_frame(
    query: &Value,
    source_key: &str,
    is_optional: bool,
    options: &ParseOptions,
) -> Result<Expression, ParseError> {
    match query {
        Value::Array(items) => {
            let parsed = items
                .iter()
                .map(|item| parse_frame(item, source_key, is_optional, options))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expression::sequence(parsed))
        }
        Value::Bool(true) => Ok(Expression::node(Node::leaf(source_key, is_optional))),
        Value::Object(map) => {
            if let Some(parallel_value) = map.get(PARALLEL_KEY) {
                if map.len() != 1 {
                    return Err(ParseError::ParallelNotSole);
                }
                let items = parallel_value.as_array().ok_or_else(|| {
                    ParseError::ParallelNotArray {
                        found: describe(parallel_value),
                    }
                })?;
                let parsed = items
                    .iter()
                    .map(|item| parse_frame(item, source_key, is_optional, options))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Expression::parallel(parsed));
            }
            parse_object(map, source_key, is_optional, options)
        }
        other => Err(ParseError::InvalidShape {
            found: describe(other),
        }),
    }
}

fn parse_object(
    map: &serde_json::Map<String, Value>,
    source_key: &str,
    is_optional: bool,
    options: &ParseOptions,
) -> Result<Expression, ParseError> {
    let mut node = Node::leaf(source_key, is_optional);
    let mut nested: Option<IndexMap<String, Expression>> = None;

    for (key, value) in map.iter() {
        match key.as_str() {
            PARAMS_KEY => {
                if node.params.is_some() {
                    return Err(ParseError::DuplicateReservedKey { marker: PARAMS_KEY });
                }
                let params = value
                    .as_array()
                    .ok_or_else(|| ParseError::ParamsNotArray {
                        found: describe(value),
                    })?
                    .clone();
                node.params = Some(params);
            }
            COLLECTION_KEY => {
                if node.collection_selector.is_some() {
                    return Err(ParseError::DuplicateReservedKey {
                        marker: COLLECTION_KEY,
                    });
                }
                node.collection_selector = Some(parse_collection_selector(value)?);
            }
            SOURCE_VALUE_KEY => {
                if node.source_value.is_some() {
                    return Err(ParseError::DuplicateReservedKey {
                        marker: SOURCE_VALUE_KEY,
                    });
                }
                node.source_value = Some(value.clone());
            }
            raw_key => {
                let parsed = parse_key(raw_key)?;
                if options.should_drop(&parsed.source) {
                    continue;
                }
                let child = parse_frame(value, &parsed.source, parsed.is_optional, options)?;
                match parsed.target {
                    KeyTarget::Inline => {
                        if node.next.is_some() {
                            return Err(ParseError::DuplicateReservedKey { marker: "=>" });
                        }
                        if nested.is_some() {
                            return Err(ParseError::MixedTargets {
                                key: raw_key.to_string(),
                            });
                        }
                        node.next = Some(Box::new(child));
                    }
                    KeyTarget::Named(target_name) => {
                        if node.next.is_some() {
                            return Err(ParseError::MixedTargets {
                                key: raw_key.to_string(),
                            });
                        }
                        nested.get_or_insert_with(IndexMap::new).insert(target_name, child);
                    }
                }
            }
        }
    }

    node.nested = nested;
    Ok(Expression::node(node))
}

fn parse_collection_selector(value: &Value) -> Result<CollectionSelector, ParseError> {
    if let Some(n) = value.as_i64() {
        return Ok(CollectionSelector::Index(n));
    }
    if let Some(arr) = value.as_array() {
        let bounds = arr
            .iter()
            .map(|v| {
                v.as_i64().ok_or_else(|| ParseError::InvalidCollectionSelector {
                    found: describe(value),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        return match bounds.as_slice() {
            [] => Ok(CollectionSelector::Range { lo: None, hi: None }),
            [a] => Ok(CollectionSelector::Range {
                lo: Some(*a),
                hi: None,
            }),
            [a, b] => Ok(CollectionSelector::Range {
                lo: Some(*a),
                hi: Some(*b),
            }),
            _ => Err(ParseError::InvalidCollectionSelector {
                found: describe(value),
            }),
        };
    }
    Err(ParseError::InvalidCollectionSelector {
        found: describe(value),
    })
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean `{b}`"),
        Value::Number(n) => format!("number `{n}`"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}
