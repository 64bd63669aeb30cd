//! Async recursive evaluation of a compiled [`Expression`] against a
//! [`Target`] graph (spec §4.2).
//!
//! Evaluation walks the expression tree node by node. Each node's own
//! failure is caught and, if an `errorHandler` is configured and the error
//! is recoverable, replaced with the handler's substitute value before the
//! parent ever sees it — sibling nodes evaluated before or after a failing
//! one are unaffected (spec §7).

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::error::{InterpretError, Operation};
use crate::expression::{CollectionSelector, Expression, Node};
use crate::options::InvokeOptions;
use crate::target::{Target, TargetValue};

use std::sync::Arc;

/// Compile-and-walk entry point: evaluate `expression` against `target` and
/// collapse the result to plain JSON (spec §4.2, §6).
///
/// `Undefined` reaching the very top of the tree — the whole query resolved
/// to nothing — collapses to `null`, since JSON has no wire form for
/// `undefined`.
pub async fn invoke_expression(
    target: Arc<dyn Target>,
    expression: &Expression,
    options: &InvokeOptions,
) -> Result<Value, InterpretError> {
    let result = eval_expression(crate::target::root(target), expression, options).await?;
    Ok(result.materialize())
}

/// Evaluate `expression` against `target`, returning the unmaterialized
/// [`TargetValue`] so callers composing a result object can tell a present
/// `null` apart from a genuinely missing (`undefined`) child and omit it
/// (spec §4.2 step 4, mirroring how the reference host drops `undefined`
/// object properties on serialization).
fn eval_expression<'a>(
    target: TargetValue,
    expression: &'a Expression,
    options: &'a InvokeOptions,
) -> BoxFuture<'a, Result<TargetValue, InterpretError>> {
    async move {
        match expression {
            Expression::Node(node) => eval_node(target, node, options).await,
            Expression::Sequence { items, parallel } => {
                if *parallel {
                    tracing::trace!(count = items.len(), "evaluating parallel sibling sequence");
                    let futures = items
                        .iter()
                        .map(|item| eval_expression(target.clone(), item, options));
                    let results = futures::future::join_all(futures).await;
                    let values = results.into_iter().collect::<Result<Vec<_>, _>>()?;
                    Ok(TargetValue::Sequence(values))
                } else {
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        values.push(eval_expression(target.clone(), item, options).await?);
                    }
                    Ok(TargetValue::Sequence(values))
                }
            }
        }
    }
    .boxed()
}

/// Evaluate a single node, catching its own failure and consulting the
/// configured `errorHandler` before letting anything escape to the parent
/// (spec §7).
async fn eval_node(
    target: TargetValue,
    node: &Node,
    options: &InvokeOptions,
) -> Result<TargetValue, InterpretError> {
    match eval_node_inner(target, node, options).await {
        Ok(value) => Ok(value),
        Err(error) if error.is_recoverable() => match &options.error_handler {
            Some(handler) => {
                tracing::debug!(
                    source_key = %error.source_key(),
                    "errorHandler replacing node output after: {error}"
                );
                Ok(TargetValue::Scalar(handler.handle(&error).await))
            }
            None => Err(error),
        },
        Err(error) => {
            tracing::warn!(source_key = %error.source_key(), "{error}");
            Err(error)
        }
    }
}

/// The evaluation rules for a single node (spec §4.2 steps 1-6), before any
/// error-handler recovery is applied.
async fn eval_node_inner(
    target: TargetValue,
    node: &Node,
    options: &InvokeOptions,
) -> Result<TargetValue, InterpretError> {
    // Steps 1-2: target selection, then a literal `<=` override replaces
    // whatever was just read or called — the authorizer still saw the
    // original read/call before being discarded.
    let mut current = eval_target_selection(target, node, options).await?;
    if let Some(source_value) = &node.source_value {
        current = TargetValue::Scalar(source_value.clone());
    }

    // Step 3: leaf. A leaf returns its target as-is, undefined included —
    // only nodes that need to descend further require the target to exist.
    if node.is_leaf() && node.collection_selector.is_none() {
        return Ok(current);
    }

    // Step 4: optional miss.
    if current.is_undefined() {
        return if node.is_optional {
            Ok(TargetValue::Undefined)
        } else {
            Err(InterpretError::QueryOnUndefined {
                source_key: node.source_key.clone(),
            })
        };
    }

    // Step 5: collection selector.
    if let Some(selector) = &node.collection_selector {
        return eval_collection_selector(current, selector, node, options).await;
    }

    // Step 6: descent.
    eval_remainder(current, node, options).await
}

/// Step 1: resolve `node.source_key` against `target` — an attribute read,
/// or a method call when `()` is present — checking authorization and
/// method existence in the order spec §4.2 requires (existence before
/// authorization, so a missing method never reaches the authorizer).
async fn eval_target_selection(
    target: TargetValue,
    node: &Node,
    options: &InvokeOptions,
) -> Result<TargetValue, InterpretError> {
    if node.source_key.is_empty() {
        return Ok(target);
    }

    if let Some(params) = &node.params {
        let has_method = match &target {
            TargetValue::Node(t) => t.has_method(&node.source_key),
            _ => false,
        };
        if !has_method {
            return if node.is_optional {
                Ok(TargetValue::Undefined)
            } else {
                Err(InterpretError::MethodNotFound {
                    source_key: node.source_key.clone(),
                })
            };
        }
        if !options
            .authorize(&node.source_key, Operation::Call, Some(params.as_slice()))
            .await
        {
            return Err(InterpretError::AuthorizationDenied {
                source_key: node.source_key.clone(),
                operation: Operation::Call,
            });
        }
        let TargetValue::Node(t) = &target else {
            unreachable!("has_method only returns true for TargetValue::Node")
        };
        t.invoke(&node.source_key, params, options.context.as_ref())
            .await
            .map_err(|source| InterpretError::UserError {
                source_key: node.source_key.clone(),
                source,
            })
    } else {
        if !options.authorize(&node.source_key, Operation::Get, None).await {
            return Err(InterpretError::AuthorizationDenied {
                source_key: node.source_key.clone(),
                operation: Operation::Get,
            });
        }
        match &target {
            TargetValue::Node(t) => t.read(&node.source_key).await.map_err(|source| {
                InterpretError::UserError {
                    source_key: node.source_key.clone(),
                    source,
                }
            }),
            _ => Ok(TargetValue::Undefined),
        }
    }
}

/// Step 5: apply `[]` to a resolved collection.
async fn eval_collection_selector(
    current: TargetValue,
    selector: &CollectionSelector,
    node: &Node,
    options: &InvokeOptions,
) -> Result<TargetValue, InterpretError> {
    let TargetValue::Sequence(items) = &current else {
        return Err(InterpretError::CollectionSelectorOutOfRange {
            source_key: node.source_key.clone(),
            detail: "target is not a collection".to_string(),
        });
    };

    match selector {
        CollectionSelector::Index(i) => {
            let len = items.len() as i64;
            let idx = if *i < 0 { len + i } else { *i };
            let element = if idx >= 0 && (idx as usize) < items.len() {
                items[idx as usize].clone()
            } else {
                TargetValue::Undefined
            };
            if element.is_undefined() {
                return if node.is_optional {
                    Ok(TargetValue::Undefined)
                } else {
                    Err(InterpretError::QueryOnUndefined {
                        source_key: node.source_key.clone(),
                    })
                };
            }
            eval_remainder(element, node, options).await
        }
        CollectionSelector::Range { lo, hi } => {
            let len = items.len() as i64;
            let resolve_bound = |bound: Option<i64>, default: i64| -> i64 {
                match bound {
                    None => default,
                    Some(v) if v < 0 => (len + v).clamp(0, len),
                    Some(v) => v.clamp(0, len),
                }
            };
            let lo = resolve_bound(*lo, 0);
            let hi = resolve_bound(*hi, len).max(lo);

            // The remainder — next/nested only, sourceKey already spent on
            // the selector — is evaluated once per selected element,
            // sequentially.
            let mut results = Vec::with_capacity((hi - lo).max(0) as usize);
            for element in &items[lo as usize..hi as usize] {
                results.push(eval_remainder(element.clone(), node, options).await?);
            }
            Ok(TargetValue::Sequence(results))
        }
    }
}

/// Step 6: whatever is left of a node once its own target has been
/// resolved (and, for `[]`, an element selected) — descend through `=>`,
/// build the `nestedExpressions` object, or simply return the target
/// unchanged if neither is present.
fn eval_remainder<'a>(
    current: TargetValue,
    node: &'a Node,
    options: &'a InvokeOptions,
) -> BoxFuture<'a, Result<TargetValue, InterpretError>> {
    async move {
        if let Some(next) = &node.next {
            eval_expression(current, next, options).await
        } else if let Some(nested) = &node.nested {
            eval_nested(current, nested, options).await
        } else {
            Ok(current)
        }
    }
    .boxed()
}

/// Evaluate every `nestedExpressions` child against `target`, composing an
/// ordered JSON object. A child that resolves to `undefined` is omitted
/// entirely rather than written as `null` — this is the one place array and
/// object semantics diverge (spec §4.2 step 4's note on how the reference
/// host serializes a missing object property versus a missing array
/// element).
async fn eval_nested(
    target: TargetValue,
    nested: &indexmap::IndexMap<String, Expression>,
    options: &InvokeOptions,
) -> Result<TargetValue, InterpretError> {
    let mut object = serde_json::Map::new();
    for (name, child) in nested {
        let value = eval_expression(target.clone(), child, options).await?;
        if value.is_undefined() {
            continue;
        }
        object.insert(name.clone(), value.materialize());
    }
    Ok(TargetValue::Scalar(Value::Object(object)))
}
