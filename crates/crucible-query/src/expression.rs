//! The compiled intermediate representation a [`crate::parser::parse_query`]
//! produces and [`crate::interpreter::invoke_expression`] walks (spec §3
//! "Expression (intermediate)").

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// `[]`'s compiled form: either a scalar index or a two-sided range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CollectionSelector {
    /// A single element by position. Negative values count from the end.
    Index(i64),
    /// An end-exclusive slice. `None` bounds mean "from the start"/"to the
    /// end" respectively. `[]` compiles to `Range { lo: None, hi: None }`.
    Range {
        /// Inclusive lower bound, or `None` for the start of the collection.
        lo: Option<i64>,
        /// Exclusive upper bound, or `None` for the end of the collection.
        hi: Option<i64>,
    },
}

/// A single compiled query node (spec §3 "Expression").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Node {
    /// The attribute/method name to read on the current target. Empty
    /// means "use the current target as-is".
    pub source_key: String,
    /// Whether a missing `source_key` (or a missing method) yields
    /// `undefined` instead of an error.
    pub is_optional: bool,
    /// Present when this key is a method call (`()`), giving its ordered
    /// parameter list.
    pub params: Option<Vec<serde_json::Value>>,
    /// Present when this key carries a `[]` collection selector.
    pub collection_selector: Option<CollectionSelector>,
    /// Present when this key carries a `<=` literal source-value override.
    pub source_value: Option<serde_json::Value>,
    /// The single "empty-target" (`=>`) child, mutually exclusive with
    /// `nested`.
    pub next: Option<Box<Expression>>,
    /// Named children, keyed by the target name they nest their result
    /// under, in query insertion order.
    pub nested: Option<IndexMap<String, Expression>>,
}

impl Node {
    /// A bare leaf node: `{ sourceKey, isOptional }` with nothing else set.
    pub fn leaf(source_key: impl Into<String>, is_optional: bool) -> Self {
        Self {
            source_key: source_key.into(),
            is_optional,
            ..Default::default()
        }
    }

    /// Whether this node has neither a `next` nor any `nested` children,
    /// i.e. evaluating it stops at the resolved target (spec §4.2 step 3).
    pub fn is_leaf(&self) -> bool {
        self.next.is_none() && self.nested.is_none()
    }
}

/// A compiled expression tree (spec §3 "Expression (intermediate)").
///
/// An `Expression` is either a single node, or a sibling sequence — which
/// may additionally be tagged `parallel` (spec: "Tagging is an out-of-band
/// flag on the sequence, not an in-band marker node").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expression {
    /// A single compiled node.
    Node(Node),
    /// An ordered sibling fan-out, evaluated sequentially unless
    /// `parallel` is set.
    Sequence {
        /// The sibling expressions, in query order.
        items: Vec<Expression>,
        /// `true` for a `{"||": [...]}` query, `false` for a plain array.
        parallel: bool,
    },
}

impl Expression {
    /// Wrap a single [`Node`] as a node-shaped expression.
    pub fn node(node: Node) -> Self {
        Expression::Node(node)
    }

    /// Build a sequential sibling sequence.
    pub fn sequence(items: Vec<Expression>) -> Self {
        Expression::Sequence {
            items,
            parallel: false,
        }
    }

    /// Build a parallel (`||`) sibling sequence.
    pub fn parallel(items: Vec<Expression>) -> Self {
        Expression::Sequence {
            items,
            parallel: true,
        }
    }
}
