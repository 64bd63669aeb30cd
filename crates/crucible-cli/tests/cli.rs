//! End-to-end exercise of the `cruq` binary against fixture files (spec.md
//! §6's "convenience wrapper", tested the way this workspace tests its
//! other CLI entry points: `assert_cmd` + `predicates`).

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn projects_attributes_from_file_arguments() {
    Command::cargo_bin("cruq")
        .unwrap()
        .arg("--target")
        .arg(fixture("target.json"))
        .arg("--query")
        .arg(fixture("query.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title":"Inception""#))
        .stdout(predicate::str::contains(r#""year":2010"#));
}

#[test]
fn pretty_flag_pretty_prints_the_result() {
    Command::cargo_bin("cruq")
        .unwrap()
        .arg("--target")
        .arg(fixture("target.json"))
        .arg("--query")
        .arg(fixture("query.json"))
        .arg("--pretty")
        .assert()
        .success()
        .stdout(predicate::str::contains("{\n"));
}

#[test]
fn query_can_be_read_from_stdin() {
    Command::cargo_bin("cruq")
        .unwrap()
        .arg("--target")
        .arg(fixture("target.json"))
        .arg("--query")
        .arg("-")
        .write_stdin(r#"{"movie": {"country": true}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""country":"USA""#));
}

#[test]
fn rejects_both_target_and_query_from_stdin() {
    Command::cargo_bin("cruq")
        .unwrap()
        .arg("--target")
        .arg("-")
        .arg("--query")
        .arg("-")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot both read from stdin"));
}

#[test]
fn invalid_json_target_fails_with_context() {
    Command::cargo_bin("cruq")
        .unwrap()
        .arg("--target")
        .arg("-")
        .arg("--query")
        .arg(fixture("query.json"))
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing target document as JSON"));
}

#[test]
fn missing_optional_attribute_is_omitted_not_errored() {
    Command::cargo_bin("cruq")
        .unwrap()
        .arg("--target")
        .arg(fixture("target.json"))
        .arg("--query")
        .arg("-")
        .write_stdin(r#"{"movie": {"title": true, "director?": {"fullName": true}}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"movie":{"title":"Inception"}}"#));
}
