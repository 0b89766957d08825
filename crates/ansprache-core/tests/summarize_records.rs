//! Integrationstest für das Beispiel `summarize_records.rs`.
//!
//! Erwartung: eine Zeile pro Fähigkeit, Annahmequote zwischen 0.0 und 1.0.

use assert_cmd::Command;
use predicates::prelude::*;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../tests/fixtures/interactions/kitchen.jsonl"
);

#[test]
fn example_summarizes_fixture_per_ability() {
    let mut cmd = Command::new("cargo");
    cmd.args([
        "run",
        "--package",
        "ansprache-core",
        "--example",
        "summarize_records",
        "--",
        FIXTURE,
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1.00\twipe\t1/1"))
        .stdout(predicate::str::contains("0.00\tsweep\t0/1"));
}

#[test]
fn example_accepts_stdin() {
    let input = r#"{"location":"living","activity":"rest_relax","ability":"small_talk","accepted":true}
{"location":"living","activity":"rest_relax","ability":"small_talk","accepted":false}"#;

    let mut cmd = Command::new("cargo");
    cmd.args([
        "run",
        "--package",
        "ansprache-core",
        "--example",
        "summarize_records",
    ]);
    cmd.write_stdin(input);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0.50\tsmall_talk\t1/2"));
}
