//! End-to-end scenarios exercising the parser and interpreter together,
//! against small hand-written `Target` doubles.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crucible_query::options::{FnAuthorizer, FnErrorHandler, InvokeOptions};
use crucible_query::parser::ParseOptions;
use crucible_query::target::{JsonTarget, Target, TargetValue};
use crucible_query::{interpreter, key::KeyFilter, parser};

fn compile(query: Value, options: &ParseOptions) -> crucible_query::Expression {
    parser::parse_query(&query, options).unwrap()
}

async fn run(target: Arc<dyn Target>, query: Value, options: &InvokeOptions) -> Value {
    let expr = compile(query, &ParseOptions::default());
    interpreter::invoke_expression(target, &expr, options)
        .await
        .unwrap()
}

#[tokio::test]
async fn attribute_projection() {
    let target: Arc<dyn Target> = Arc::new(JsonTarget::new(json!({
        "movie": {"title": "Inception", "year": 2010, "country": "USA"}
    })));
    let result = run(
        target,
        json!({"movie": {"title": true, "year": true}}),
        &InvokeOptions::new(),
    )
    .await;
    assert_eq!(result, json!({"movie": {"title": "Inception", "year": 2010}}));
}

/// A catalog target whose `movies` method takes a `{filter: {genre}}`
/// parameter and returns matching titles.
struct Catalog;

#[async_trait]
impl Target for Catalog {
    async fn read(&self, _key: &str) -> Result<TargetValue, anyhow::Error> {
        Ok(TargetValue::Undefined)
    }

    fn has_method(&self, key: &str) -> bool {
        key == "movies"
    }

    async fn invoke(
        &self,
        key: &str,
        params: &[Value],
        _context: Option<&Value>,
    ) -> Result<TargetValue, anyhow::Error> {
        if key != "movies" {
            anyhow::bail!("no such method `{key}`");
        }
        let genre = params
            .first()
            .and_then(|p| p.get("filter"))
            .and_then(|f| f.get("genre"))
            .and_then(Value::as_str);
        let all = [("Inception", "action"), ("The Matrix", "action"), ("Amelie", "romance")];
        let matches: Vec<Value> = all
            .iter()
            .filter(|(_, g)| Some(*g) == genre)
            .map(|(title, _)| json!({"title": title}))
            .collect();
        Ok(TargetValue::Sequence(
            matches
                .into_iter()
                .map(|movie| TargetValue::Node(Arc::new(JsonTarget::new(movie))))
                .collect(),
        ))
    }

    fn to_output(&self) -> Value {
        json!({})
    }
}

#[tokio::test]
async fn rename_method_and_slice() {
    let target: Arc<dyn Target> = Arc::new(Catalog);
    let result = run(
        target,
        json!({
            "movies=>actionMovies": {
                "()": [{"filter": {"genre": "action"}}],
                "=>": {"[]": [], "title": true}
            }
        }),
        &InvokeOptions::new(),
    )
    .await;
    assert_eq!(
        result,
        json!({"actionMovies": [{"title": "Inception"}, {"title": "The Matrix"}]})
    );
}

#[tokio::test]
async fn negative_index() {
    let target: Arc<dyn Target> = Arc::new(JsonTarget::new(json!({
        "movies": [{"title": "A"}, {"title": "B"}]
    })));
    let result = run(
        target,
        json!({"movies=>movie": {"[]": -1, "title": true}}),
        &InvokeOptions::new(),
    )
    .await;
    assert_eq!(result, json!({"movie": {"title": "B"}}));
}

#[tokio::test]
async fn optional_miss_omits_the_key() {
    let target: Arc<dyn Target> =
        Arc::new(JsonTarget::new(json!({"movie": {"title": "Inception"}})));
    let result = run(
        target,
        json!({"movie": {"title": true, "director?": {"fullName": true}}}),
        &InvokeOptions::new(),
    )
    .await;
    assert_eq!(result, json!({"movie": {"title": "Inception"}}));
}

#[tokio::test]
async fn missing_without_optional_marker_fails() {
    let target: Arc<dyn Target> =
        Arc::new(JsonTarget::new(json!({"movie": {"title": "Inception"}})));
    let expr = compile(
        json!({"movie": {"director": {"fullName": true}}}),
        &ParseOptions::default(),
    );
    let err = interpreter::invoke_expression(target, &expr, &InvokeOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        crucible_query::InterpretError::QueryOnUndefined { .. }
    ));
}

/// A shared counter whose `increment` method reads, sleeps, then writes
/// back — built to make a lost update observable under parallel fan-out.
struct SlowCounter {
    value: AtomicI64,
}

#[async_trait]
impl Target for SlowCounter {
    async fn read(&self, key: &str) -> Result<TargetValue, anyhow::Error> {
        match key {
            "value" => Ok(TargetValue::Scalar(json!(self.value.load(Ordering::SeqCst)))),
            _ => Ok(TargetValue::Undefined),
        }
    }

    fn has_method(&self, key: &str) -> bool {
        key == "increment"
    }

    async fn invoke(
        &self,
        key: &str,
        _params: &[Value],
        _context: Option<&Value>,
    ) -> Result<TargetValue, anyhow::Error> {
        if key != "increment" {
            anyhow::bail!("no such method `{key}`");
        }
        let current = self.value.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.value.store(current + 1, Ordering::SeqCst);
        Ok(TargetValue::Scalar(json!(current + 1)))
    }

    fn to_output(&self) -> Value {
        json!({"value": self.value.load(Ordering::SeqCst)})
    }
}

#[tokio::test]
async fn parallel_siblings_can_observe_a_lost_update() {
    let target = Arc::new(SlowCounter {
        value: AtomicI64::new(0),
    });
    let expr = compile(
        json!({"||": [{"increment": {"()": []}}, {"increment": {"()": []}}]}),
        &ParseOptions::default(),
    );
    interpreter::invoke_expression(target.clone(), &expr, &InvokeOptions::new())
        .await
        .unwrap();
    assert_eq!(target.value.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sequential_siblings_do_not_lose_updates() {
    let target = Arc::new(SlowCounter {
        value: AtomicI64::new(0),
    });
    let expr = compile(
        json!([{"increment": {"()": []}}, {"increment": {"()": []}}]),
        &ParseOptions::default(),
    );
    interpreter::invoke_expression(target.clone(), &expr, &InvokeOptions::new())
        .await
        .unwrap();
    assert_eq!(target.value.load(Ordering::SeqCst), 2);
}

/// A target whose only method, `save`, echoes back a normalized subset of
/// whatever `sourceValue` substituted in for it.
struct Persistable;

#[async_trait]
impl Target for Persistable {
    async fn read(&self, _key: &str) -> Result<TargetValue, anyhow::Error> {
        Ok(TargetValue::Undefined)
    }

    fn has_method(&self, key: &str) -> bool {
        key == "save"
    }

    async fn invoke(
        &self,
        key: &str,
        _params: &[Value],
        _context: Option<&Value>,
    ) -> Result<TargetValue, anyhow::Error> {
        if key != "save" {
            anyhow::bail!("no such method `{key}`");
        }
        Ok(TargetValue::Node(Arc::new(JsonTarget::new(
            json!({"id": "X"}),
        ))))
    }

    fn to_output(&self) -> Value {
        json!({})
    }
}

#[tokio::test]
async fn source_value_then_method_call() {
    let target: Arc<dyn Target> = Arc::new(Persistable);
    let result = run(
        target,
        json!({
            "<=": {"_type": "Movie", "title": "Avatar", "country": "USA"},
            "save=>movie": {"()": [], "id": true}
        }),
        &InvokeOptions::new(),
    )
    .await;
    assert_eq!(result, json!({"movie": {"id": "X"}}));
}

#[tokio::test]
async fn authorizer_allows_and_denies_by_key() {
    let target: Arc<dyn Target> = Arc::new(JsonTarget::new(json!({
        "username": "alice",
        "password": "hunter2"
    })));
    let authorizer = FnAuthorizer::new(|key, op, _params| {
        matches!(
            (key, op),
            ("user", crucible_query::Operation::Get)
                | ("username", crucible_query::Operation::Get)
                | ("publicMethod", crucible_query::Operation::Call)
        )
    });
    let options = InvokeOptions::new().with_authorizer(Arc::new(authorizer));

    let denied = interpreter::invoke_expression(
        target.clone(),
        &compile(json!({"password": true}), &ParseOptions::default()),
        &options,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        denied,
        crucible_query::InterpretError::AuthorizationDenied { .. }
    ));

    let allowed = interpreter::invoke_expression(
        target,
        &compile(json!({"username": true}), &ParseOptions::default()),
        &options,
    )
    .await
    .unwrap();
    assert_eq!(allowed, json!({"username": "alice"}));
}

#[tokio::test]
async fn ignore_and_accept_keys_filter_at_parse_time() {
    let options = ParseOptions {
        ignore_keys: KeyFilter::from(regex::Regex::new("^_").unwrap()),
        accept_keys: KeyFilter::from("_id"),
        ignore_built_in_keys: true,
    };
    let expr = compile(
        json!({"_id": true, "_password": true, "name": true}),
        &options,
    );
    let target: Arc<dyn Target> = Arc::new(JsonTarget::new(json!({
        "_id": "abc",
        "_password": "shh",
        "name": "Alice"
    })));
    let result = interpreter::invoke_expression(target, &expr, &InvokeOptions::new())
        .await
        .unwrap();
    assert_eq!(result, json!({"_id": "abc", "name": "Alice"}));
}

struct Flaky;

#[async_trait]
impl Target for Flaky {
    async fn read(&self, _key: &str) -> Result<TargetValue, anyhow::Error> {
        Ok(TargetValue::Undefined)
    }

    fn has_method(&self, key: &str) -> bool {
        key == "risky"
    }

    async fn invoke(
        &self,
        key: &str,
        _params: &[Value],
        _context: Option<&Value>,
    ) -> Result<TargetValue, anyhow::Error> {
        if key != "risky" {
            anyhow::bail!("no such method `{key}`");
        }
        anyhow::bail!("boom")
    }

    fn to_output(&self) -> Value {
        json!({})
    }
}

#[tokio::test]
async fn error_handler_replaces_only_the_failing_slot() {
    let target = Arc::new(Flaky);
    let expr = compile(
        json!([
            {"risky": {"()": []}},
            {"risky": {"()": []}},
            {"risky": {"()": []}}
        ]),
        &ParseOptions::default(),
    );
    let handler = FnErrorHandler::new(|err| json!(format!("recovered: {err}")));
    let options = InvokeOptions::new().with_error_handler(Arc::new(handler));
    let result = interpreter::invoke_expression(target, &expr, &options)
        .await
        .unwrap();
    let items = result.as_array().unwrap();
    assert_eq!(items.len(), 3);
    for item in items {
        assert!(item.as_str().unwrap().starts_with("recovered:"));
    }
}
