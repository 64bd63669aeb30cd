//! User key grammar (spec §3 "User key grammar", §4.1 "Key parsing") and the
//! `ignoreKeys`/`acceptKeys`/`ignoreBuiltInKeys` filtering options.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::error::ParseError;

/// Where a parsed key's result should be placed in the parent's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyTarget {
    /// `source=>target` or a bare `source` (in which case `target == source`):
    /// nest the child result under this name.
    Named(String),
    /// `source=>` with an empty target: replace the current output slot
    /// instead of nesting (becomes the node's `nextExpression`).
    Inline,
}

/// The three pieces a user key decomposes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    /// The attribute/method name to read or call on the current target.
    pub source: String,
    /// Whether `source` was suffixed with `?`.
    pub is_optional: bool,
    /// Where to place the result.
    pub target: KeyTarget,
}

/// Split a user key of the form `source[?][=>[target]]` into its parts.
///
/// - One part (no `=>`): the target is the (stripped-of-`?`) source name.
/// - Two parts: the first is the source, the second is the literal target,
///   which may be empty (the "inline" form).
/// - More than two parts: [`ParseError::MalformedKey`].
pub fn parse_key(raw: &str) -> Result<ParsedKey, ParseError> {
    let parts: Vec<&str> = raw.split("=>").collect();
    match parts.as_slice() {
        [source] => {
            let (source, is_optional) = strip_optional(source);
            Ok(ParsedKey {
                target: KeyTarget::Named(source.clone()),
                source,
                is_optional,
            })
        }
        [source, target] => {
            let (source, is_optional) = strip_optional(source);
            let target = if target.is_empty() {
                KeyTarget::Inline
            } else {
                KeyTarget::Named((*target).to_string())
            };
            Ok(ParsedKey {
                source,
                is_optional,
                target,
            })
        }
        _ => Err(ParseError::MalformedKey {
            key: raw.to_string(),
        }),
    }
}

fn strip_optional(source: &str) -> (String, bool) {
    match source.strip_suffix('?') {
        Some(stripped) => (stripped.to_string(), true),
        None => (source.to_string(), false),
    }
}

/// A single `ignoreKeys`/`acceptKeys` pattern: either an exact string match
/// or a regex (spec §4.1: "pattern or list of patterns (literal string
/// equality or regex)").
#[derive(Debug, Clone)]
pub enum KeyMatcher {
    /// Exact string equality.
    Literal(String),
    /// Regex match against the full source key.
    Regex(Regex),
}

impl KeyMatcher {
    fn matches(&self, key: &str) -> bool {
        match self {
            KeyMatcher::Literal(literal) => literal == key,
            KeyMatcher::Regex(regex) => regex.is_match(key),
        }
    }
}

impl From<&str> for KeyMatcher {
    fn from(value: &str) -> Self {
        KeyMatcher::Literal(value.to_string())
    }
}

impl From<String> for KeyMatcher {
    fn from(value: String) -> Self {
        KeyMatcher::Literal(value)
    }
}

impl From<Regex> for KeyMatcher {
    fn from(value: Regex) -> Self {
        KeyMatcher::Regex(value)
    }
}

/// A set of [`KeyMatcher`]s used for `ignoreKeys`/`acceptKeys`. An empty
/// filter matches nothing.
#[derive(Debug, Clone, Default)]
pub struct KeyFilter(Vec<KeyMatcher>);

impl KeyFilter {
    /// A filter that matches no keys.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Build a filter from any number of matchers (literals, regexes, or a
    /// mix of both).
    pub fn new(matchers: impl IntoIterator<Item = KeyMatcher>) -> Self {
        Self(matchers.into_iter().collect())
    }

    /// Whether any matcher in this filter matches `key`.
    pub fn matches(&self, key: &str) -> bool {
        self.0.iter().any(|m| m.matches(key))
    }

    /// Whether this filter has no matchers at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Into<KeyMatcher>> From<T> for KeyFilter {
    fn from(value: T) -> Self {
        Self(vec![value.into()])
    }
}

impl<T: Into<KeyMatcher>> FromIterator<T> for KeyFilter {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The default `ignoreBuiltInKeys` set (spec §6 "Built-in key set").
///
/// Rust has no universal prototype chain the way the reference host
/// language does, so this cannot be derived reflectively. The option is
/// still exposed for parity; the default set below keeps the same intent —
/// shielding the runtime from names that look like they're reaching for
/// generic object machinery rather than domain data — as a fixed list
/// rather than a reflected one.
static DEFAULT_BUILT_IN_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "__proto__",
        "constructor",
        "prototype",
        "hasOwnProperty",
        "toString",
        "valueOf",
        "isPrototypeOf",
        "propertyIsEnumerable",
        "toLocaleString",
    ]
    .into_iter()
    .collect()
});

/// Whether `key` is in the default built-in key set.
pub fn is_default_built_in_key(key: &str) -> bool {
    DEFAULT_BUILT_IN_KEYS.contains(key)
}
