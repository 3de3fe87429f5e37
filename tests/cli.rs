//! Integration tests for the `orgchart` command line.
//!
//! These tests run the binary against documents in a temp directory and check
//! the written output, the status lines and the exit codes.

#![allow(missing_docs)]

use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE_XML: &str = r#"<?xml version="1.0"?>
<employees>
    <employee>
        <field id="email">a@example.com</field>
        <field id="manager"></field>
    </employee>
    <employee>
        <field id="email">b@example.com</field>
        <field id="manager">a@example.com</field>
    </employee>
    <employee>
        <field id="email">c@example.com</field>
        <field id="manager">a@example.com</field>
    </employee>
    <employee>
        <field id="email">d@example.com</field>
        <field id="manager">b@example.com</field>
    </employee>
</employees>
"#;

/// Get a Command for the orgchart binary, running in a temp directory.
fn orgchart_in(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_orgchart"));
    cmd.current_dir(dir.path());
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).unwrap();
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn missing_input_is_a_usage_error() {
    let temp = TempDir::new().unwrap();

    orgchart_in(&temp)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn extra_argument_is_a_usage_error() {
    let temp = TempDir::new().unwrap();

    orgchart_in(&temp)
        .args(["one.xml", "two.xml"])
        .assert()
        .code(2);
}

#[test]
fn writes_output_json_by_default() {
    let temp = TempDir::new().unwrap();
    write(&temp, "people.xml", SAMPLE_XML);

    orgchart_in(&temp)
        .arg("people.xml")
        .assert()
        .success()
        .stderr(predicate::str::contains("1 tree(s), 4 employee(s)"));

    let output = temp.path().join("output.json");
    assert_eq!(
        read_json(&output),
        serde_json::json!([{
            "employee": {
                "id": "a@example.com",
                "direct_reports": [
                    {
                        "employee": {
                            "id": "b@example.com",
                            "direct_reports": [
                                { "employee": { "id": "d@example.com", "direct_reports": [] } }
                            ]
                        }
                    },
                    { "employee": { "id": "c@example.com", "direct_reports": [] } }
                ]
            }
        }])
    );

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("[\n   {\n      \"employee\": {"));
}

#[test]
fn stdout_with_identifier_key() {
    let temp = TempDir::new().unwrap();
    write(&temp, "people.xml", SAMPLE_XML);

    orgchart_in(&temp)
        .args(["people.xml", "--stdout", "--identifier-key", "email"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"email\": \"d@example.com\""));

    assert!(!temp.path().join("output.json").exists());
}

#[test]
fn yaml_output_with_custom_name() {
    let temp = TempDir::new().unwrap();
    write(&temp, "people.xml", SAMPLE_XML);

    orgchart_in(&temp)
        .args(["people.xml", "--format", "yaml", "-o", "org"])
        .assert()
        .success();

    let text = fs::read_to_string(temp.path().join("org.yaml")).unwrap();
    assert!(text.contains("id: a@example.com"));
}

#[test]
fn json_input_is_detected_from_extension() {
    let temp = TempDir::new().unwrap();
    write(
        &temp,
        "people.json",
        r#"[{"id": "x"}, {"id": "y"}, {"id": "z", "manager": "y"}]"#,
    );

    orgchart_in(&temp)
        .args(["people.json", "--stdout"])
        .assert()
        .success()
        .stderr(predicate::str::contains("2 tree(s), 3 employee(s)"));
}

#[test]
fn dangling_manager_is_reported_and_dropped() {
    let temp = TempDir::new().unwrap();
    write(&temp, "people.json", r#"[{"id": "m", "manager": "ghost"}]"#);

    orgchart_in(&temp)
        .arg("people.json")
        .assert()
        .success()
        .stderr(predicate::str::contains("not attached to any tree: m"));

    assert_eq!(
        read_json(&temp.path().join("output.json")),
        serde_json::json!([])
    );
}

#[test]
fn dangling_manager_can_fail() {
    let temp = TempDir::new().unwrap();
    write(&temp, "people.json", r#"[{"id": "m", "manager": "ghost"}]"#);

    orgchart_in(&temp)
        .args(["people.json", "--orphans", "fail"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown manager ghost"));

    assert!(!temp.path().join("output.json").exists());
}

#[test]
fn dangling_manager_can_be_promoted_via_config() {
    let temp = TempDir::new().unwrap();
    write(&temp, "people.json", r#"[{"id": "m", "manager": "ghost"}]"#);
    write(&temp, "orgchart.toml", "_version = \"1\"\norphans = \"promote\"\n");

    orgchart_in(&temp)
        .args(["people.json", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"m\""));
}

#[test]
fn cycle_fails() {
    let temp = TempDir::new().unwrap();
    write(
        &temp,
        "people.yaml",
        "- id: a\n  manager: b\n- id: b\n  manager: a\n",
    );

    orgchart_in(&temp)
        .arg("people.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("reporting cycle: a -> b -> a"));
}

#[test]
fn unknown_policy_is_rejected() {
    let temp = TempDir::new().unwrap();
    write(&temp, "people.xml", SAMPLE_XML);

    orgchart_in(&temp)
        .args(["people.xml", "--orphans", "ignore"])
        .assert()
        .code(2);
}

#[test]
fn missing_input_file_fails() {
    let temp = TempDir::new().unwrap();

    orgchart_in(&temp)
        .arg("nope.xml")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load nope.xml"));
}

/// A JSON document for a single reporting chain `depth` levels deep.
fn chain_json(depth: usize) -> String {
    let records: Vec<_> = (0..depth)
        .map(|level| match level {
            0 => serde_json::json!({ "id": "e0" }),
            _ => serde_json::json!({
                "id": format!("e{level}"),
                "manager": format!("e{}", level - 1),
            }),
        })
        .collect();
    serde_json::Value::Array(records).to_string()
}

#[test]
fn too_deep_forest_fails_without_writing() {
    let temp = TempDir::new().unwrap();
    write(&temp, "chain.json", &chain_json(100_000));
    write(&temp, "output.json", "[]\n");

    orgchart_in(&temp)
        .arg("chain.json")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "forest is 100000 levels deep; output is limited to 512 levels",
        ));

    assert_eq!(
        fs::read_to_string(temp.path().join("output.json")).unwrap(),
        "[]\n"
    );
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
}

#[test]
fn too_deep_forest_writes_nothing_to_stdout() {
    let temp = TempDir::new().unwrap();
    write(&temp, "chain.json", &chain_json(100_000));

    orgchart_in(&temp)
        .args(["chain.json", "--stdout"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("levels deep"));
}

#[test]
fn depth_limit_is_configurable() {
    let temp = TempDir::new().unwrap();
    write(&temp, "chain.json", &chain_json(600));
    write(&temp, "orgchart.toml", "_version = \"1\"\nmax_depth = 1000\n");

    orgchart_in(&temp).arg("chain.json").assert().success();

    let output = read_json(&temp.path().join("output.json"));
    assert_eq!(output[0]["employee"]["id"], "e0");
}

#[test]
fn logs_are_plain_when_stderr_is_not_a_terminal() {
    let temp = TempDir::new().unwrap();
    write(&temp, "people.json", r#"[{"id": "m", "manager": "ghost"}]"#);

    orgchart_in(&temp)
        .arg("people.json")
        .env_remove("FORCE_COLOR")
        .env_remove("CLICOLOR_FORCE")
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("dropping employee m"))
        .stderr(predicate::str::contains("\u{1b}[").not());
}
