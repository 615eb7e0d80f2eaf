//! CLI integration tests for all subcommands.
//!
//! Uses `assert_cmd` to spawn the `chainkit` binary and verify exit codes,
//! stdout content, and stderr content. Fixtures are written to temporary
//! directories per test.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper: create a Command for the `chainkit` binary.
fn chainkit() -> Command {
    let mut cmd = cargo_bin_cmd!("chainkit");
    cmd.env_remove("CHAINKIT_LOG");
    cmd
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn chain(id: &str, x: i64) -> Value {
    json!({
        "id": id,
        "name": "Orders",
        "elements": [
            {"id": "e1", "type": "T1", "properties": {"x": x}},
            {"id": "e2", "type": "log"}
        ],
        "connections": [
            {"id": "c1", "source": "e1", "target": "e2"}
        ]
    })
}

const RULES: &str = r#"
[[element]]
type = "Old"
deprecated = true

[[element]]
type = "Ghost"
deprecated = true

[[element]]
type = "New"

[[rule]]
from = "Old"
to = "New"
"#;

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout must be valid JSON")
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    chainkit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Chain graph diff and migration toolkit"));
}

#[test]
fn version_exits_0() {
    chainkit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chainkit"));
}

// ──────────────────────────────────────────────
// 2. Diff subcommand
// ──────────────────────────────────────────────

#[test]
fn diff_identical_files_exits_0() {
    let tmp = TempDir::new().unwrap();
    let a = write_json(tmp.path(), "a.json", &chain("c", 1));
    chainkit()
        .args(["diff"])
        .arg(&a)
        .arg(&a)
        .assert()
        .success()
        .stdout(predicate::str::contains("no differences"));
}

#[test]
fn diff_modified_property_exits_1_with_path() {
    let tmp = TempDir::new().unwrap();
    let a = write_json(tmp.path(), "a.json", &chain("c", 1));
    let b = write_json(tmp.path(), "b.json", &chain("c", 2));
    chainkit()
        .args(["diff"])
        .arg(&a)
        .arg(&b)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("~ Element e1"))
        .stdout(predicate::str::contains("x: 1 -> 2"));
}

#[test]
fn diff_json_output() {
    let tmp = TempDir::new().unwrap();
    let a = write_json(tmp.path(), "a.json", &chain("c", 1));
    let b = write_json(tmp.path(), "b.json", &chain("c", 2));
    let output = chainkit()
        .args(["--output", "json", "diff"])
        .arg(&a)
        .arg(&b)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let v = stdout_json(&output);
    assert_eq!(v["summary"]["modified"], 1);
    assert_eq!(v["entities"][0]["left_id"], "e1");
    assert_eq!(v["entities"][0]["changes"][0]["path"], "x");
}

#[test]
fn diff_reports_dangling_reference() {
    let tmp = TempDir::new().unwrap();
    let mut broken = chain("c", 1);
    broken["connections"] = json!([{"id": "c1", "source": "e1", "target": "e9"}]);
    let a = write_json(tmp.path(), "a.json", &broken);
    chainkit()
        .args(["diff"])
        .arg(&a)
        .arg(&a)
        .assert()
        .success()
        .stdout(predicate::str::contains("e9"));
}

#[test]
fn diff_needs_two_files_or_repo() {
    let tmp = TempDir::new().unwrap();
    let a = write_json(tmp.path(), "a.json", &chain("c", 1));
    chainkit()
        .args(["diff"])
        .arg(&a)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("two chain files"));
}

#[test]
fn diff_nonexistent_file_exits_1() {
    chainkit()
        .args(["diff", "does/not/exist.json", "also/missing.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error reading"));
}

#[test]
fn diff_duplicate_ids_rejected() {
    let tmp = TempDir::new().unwrap();
    let bad = json!({
        "id": "c",
        "elements": [{"id": "e1", "type": "T"}, {"id": "e1", "type": "T"}]
    });
    let a = write_json(tmp.path(), "a.json", &bad);
    chainkit()
        .args(["diff"])
        .arg(&a)
        .arg(&a)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate element id"));
}

#[test]
fn diff_against_repository_snapshot() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("chains")).unwrap();
    fs::create_dir_all(tmp.path().join("snapshots")).unwrap();
    write_json(&tmp.path().join("chains"), "c1.json", &chain("c1", 2));
    write_json(&tmp.path().join("snapshots"), "s1.json", &chain("c1", 1));

    chainkit()
        .args(["diff", "--repo"])
        .arg(tmp.path())
        .args(["--left-snapshot", "s1", "--right-chain", "c1"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("x: 1 -> 2"));

    chainkit()
        .args(["diff", "--repo"])
        .arg(tmp.path())
        .args(["--left-snapshot", "s1", "--right-chain", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid diff request"));
}

// ──────────────────────────────────────────────
// 3. Migrate and inspect subcommands
// ──────────────────────────────────────────────

#[test]
fn migrate_writes_migrated_chain() {
    let tmp = TempDir::new().unwrap();
    let input = write_json(
        tmp.path(),
        "chain.json",
        &json!({
            "id": "c",
            "elements": [
                {"id": "e1", "type": "Old", "properties": {"value": 7}},
                {"id": "e2", "type": "Ghost"}
            ]
        }),
    );
    let rules = tmp.path().join("rules.toml");
    fs::write(&rules, RULES).unwrap();
    let out = tmp.path().join("out.json");

    chainkit()
        .args(["migrate"])
        .arg(&input)
        .arg("--rules")
        .arg(&rules)
        .arg("--write")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("~ e1 Old -> New"))
        .stdout(predicate::str::contains("1 migrated, 1 unsupported, 0 unchanged"));

    let migrated: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let e1 = migrated["elements"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["id"] == "e1")
        .unwrap();
    assert_eq!(e1["type"], "New");
    assert_eq!(e1["properties"]["value"], 7);
}

#[test]
fn migrate_rule_cycle_exits_1() {
    let tmp = TempDir::new().unwrap();
    let input = write_json(
        tmp.path(),
        "chain.json",
        &json!({"id": "c", "elements": [{"id": "e1", "type": "A"}]}),
    );
    let rules = tmp.path().join("rules.toml");
    fs::write(
        &rules,
        "[[rule]]\nfrom = \"A\"\nto = \"B\"\n\n[[rule]]\nfrom = \"B\"\nto = \"A\"\n",
    )
    .unwrap();

    chainkit()
        .args(["migrate"])
        .arg(&input)
        .arg("--rules")
        .arg(&rules)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cycle"));
}

#[test]
fn migrate_missing_rules_file_exits_1() {
    let tmp = TempDir::new().unwrap();
    let input = write_json(tmp.path(), "chain.json", &chain("c", 1));
    chainkit()
        .args(["--output", "json", "migrate"])
        .arg(&input)
        .args(["--rules", "missing.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""));
}

#[test]
fn inspect_json_flags() {
    let tmp = TempDir::new().unwrap();
    let input = write_json(
        tmp.path(),
        "chain.json",
        &json!({"id": "c", "elements": [{"id": "e1", "type": "Ghost"}]}),
    );
    let rules = tmp.path().join("rules.toml");
    fs::write(&rules, RULES).unwrap();

    let output = chainkit()
        .args(["--output", "json", "inspect"])
        .arg(&input)
        .arg("--rules")
        .arg(&rules)
        .output()
        .unwrap();
    assert!(output.status.success());
    let v = stdout_json(&output);
    assert_eq!(v["contains_deprecated_elements"], true);
    assert_eq!(v["contains_unsupported_elements"], true);
    assert_eq!(v["contains_deprecated_containers"], false);
}

// ──────────────────────────────────────────────
// 4. Bulk delete subcommand
// ──────────────────────────────────────────────

#[test]
fn bulk_delete_continues_past_failures() {
    let tmp = TempDir::new().unwrap();
    let chains = tmp.path().join("chains");
    fs::create_dir_all(&chains).unwrap();
    write_json(&chains, "a.json", &chain("a", 1));
    write_json(&chains, "b.json", &chain("b", 1));

    chainkit()
        .args(["bulk-delete", "--repo"])
        .arg(tmp.path())
        .args(["a", "missing", "b"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("2 deleted, 1 failed"));

    assert!(!chains.join("a.json").exists());
    assert!(!chains.join("b.json").exists());
}

#[test]
fn bulk_delete_missing_repo_exits_1() {
    chainkit()
        .args(["bulk-delete", "--repo", "no/such/dir", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("repository directory not found"));
}
