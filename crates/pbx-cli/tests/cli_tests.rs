//! Integration tests for the pbx CLI binary.
//!
//! These tests exercise the compiled binary using assert_cmd against a
//! temporary engine directory. The command-line reload backend is `true` or
//! `false`, so no engine is needed.

use assert_cmd::Command;
use pbx_test_utils::pbx::TestPbx;
use pbx_test_utils::{ADMIN_DIALPLAN, ADMIN_ENDPOINTS};
use predicates::prelude::*;

/// Get a Command for the pbx binary
fn pbx_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pbx"));
    cmd.env_remove("PBX_RECONCILER_CONFIG")
        .env_remove("RUST_LOG")
        .env("CLICOLOR", "0")
        .env("NO_COLOR", "1");
    cmd
}

/// A directory with admin files, a config and one extension in the inventory.
fn setup(executable: &str) -> TestPbx {
    let pbx = TestPbx::with_admin_files();
    pbx.write_config(executable);
    std::fs::write(
        pbx.inventory_path(),
        "[[extensions]]\nnumber = \"1001\"\nname = \"Ann\"\n",
    )
    .unwrap();
    pbx
}

fn run(pbx: &TestPbx, args: &[&str]) -> assert_cmd::assert::Assert {
    pbx_cmd()
        .arg("--config")
        .arg(pbx.config_path())
        .args(args)
        .assert()
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_output() {
    pbx_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("PBX Reconciler"))
        .stdout(predicate::str::contains("reconcile"));
}

#[test]
fn test_version_output() {
    pbx_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pbx"));
}

#[test]
fn test_no_command_shows_help_hint() {
    pbx_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("pbx --help"));
}

#[test]
fn test_missing_config_fails() {
    let pbx = TestPbx::new();
    run(&pbx, &["diff"])
        .failure()
        .stderr(predicate::str::contains("Configuration not found"));
}

#[test]
fn test_config_from_environment() {
    let pbx = setup("true");
    pbx_cmd()
        .env("PBX_RECONCILER_CONFIG", pbx.config_path())
        .args(["render", "extension", "1001"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[1001]\ntype=endpoint\n"));
}

// ============================================================================
// Diff
// ============================================================================

#[test]
fn test_diff_reports_database_only() {
    let pbx = setup("true");
    run(&pbx, &["diff"])
        .success()
        .stdout(predicate::str::contains("extension 1001"))
        .stdout(predicate::str::contains("database only"));
}

#[test]
fn test_diff_json() {
    let pbx = setup("true");
    let output = run(&pbx, &["diff", "--json"]).success().get_output().stdout.clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["extensions"][0]["key"], "1001");
    assert_eq!(value["extensions"][0]["classification"], "database_only");
}

// ============================================================================
// Push
// ============================================================================

#[test]
fn test_push_all_writes_blocks_and_reloads() {
    let pbx = setup("true");

    run(&pbx, &["push", "--all"])
        .success()
        .stdout(predicate::str::contains("reloaded"));

    assert!(pbx.endpoints().contains("; BEGIN MANAGED - Extension 1001\n[1001]\n"));
    assert!(pbx.endpoints().contains("[transport-udp]"));
    assert!(pbx.dialplan().contains("exten => 1001,1,Dial(PJSIP/1001,30)"));
    assert_eq!(pbx.backup_count(), 2);

    run(&pbx, &["diff"])
        .success()
        .stdout(predicate::str::contains("agree"));
}

#[test]
fn test_push_dry_run_leaves_files_alone() {
    let pbx = setup("true");

    run(&pbx, &["push", "--extension", "1001", "--dry-run"])
        .success()
        .stdout(predicate::str::contains("+; BEGIN MANAGED - Extension 1001"));

    assert_eq!(pbx.endpoints(), ADMIN_ENDPOINTS);
    assert_eq!(pbx.dialplan(), ADMIN_DIALPLAN);
}

#[test]
fn test_push_with_failing_reload_keeps_files() {
    let pbx = setup("false");

    run(&pbx, &["push", "--extension", "1001"])
        .failure()
        .stderr(predicate::str::contains("reload failed"));

    assert!(pbx.endpoints().contains("[1001]"));
}

#[test]
fn test_push_requires_target() {
    let pbx = setup("true");
    run(&pbx, &["push"]).failure();
}

// ============================================================================
// Pull and reconcile
// ============================================================================

const HAND_WRITTEN_2002: &str = "\n[2002]\ntype=endpoint\ncallerid=\"Bob\" <2002>\n";

#[test]
fn test_pull_imports_into_inventory() {
    let pbx = setup("true");
    pbx.write_endpoints(&format!("{}{}", ADMIN_ENDPOINTS, HAND_WRITTEN_2002));

    run(&pbx, &["pull", "--extension", "2002"])
        .success()
        .stdout(predicate::str::contains("Imported extension 2002"));

    let inventory = std::fs::read_to_string(pbx.inventory_path()).unwrap();
    assert!(inventory.contains("number = \"2002\""));
    assert!(inventory.contains("name = \"Bob\""));
}

#[test]
fn test_pull_dialplan_is_refused() {
    let pbx = setup("true");
    run(&pbx, &["pull", "--dialplan", "from-internal"])
        .failure()
        .stdout(predicate::str::contains("never imported"));
}

#[test]
fn test_reconcile_json() {
    let pbx = setup("true");
    pbx.write_endpoints(&format!("{}{}", ADMIN_ENDPOINTS, HAND_WRITTEN_2002));

    let output = run(&pbx, &["reconcile", "--json"])
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["ran"], true);
    assert_eq!(value["imported"][0], "extension 2002");
    assert_eq!(value["exported"][0], "extension 1001");
    assert!(pbx.endpoints().contains("; BEGIN MANAGED - Extension 1001"));
}

#[test]
fn test_reconcile_reports_conflict() {
    let pbx = setup("true");
    run(&pbx, &["push", "--all"]).success();
    pbx.write_endpoints(&pbx.endpoints().replace("max_contacts=1", "max_contacts=4"));

    run(&pbx, &["reconcile"])
        .success()
        .stdout(predicate::str::contains("conflict on extension 1001"))
        .stdout(predicate::str::contains("max_contacts: db=1, external=4"));
}

// ============================================================================
// Render, reload, status
// ============================================================================

#[test]
fn test_render_unknown_trunk_fails() {
    let pbx = setup("true");
    run(&pbx, &["render", "trunk", "carrier"])
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_render_dialplan_without_rules_fails() {
    let pbx = setup("true");
    run(&pbx, &["render", "dialplan"])
        .failure()
        .stderr(predicate::str::contains("no dialplan rules"));
}

#[test]
fn test_reload_through_command_line() {
    let pbx = setup("true");
    run(&pbx, &["reload", "dialplan"])
        .success()
        .stdout(predicate::str::contains("via cli"));
}

#[test]
fn test_reload_failure_exits_nonzero() {
    let pbx = setup("false");
    run(&pbx, &["reload"])
        .failure()
        .stderr(predicate::str::contains("reload full failed"));
}

#[test]
fn test_status_without_management_interface() {
    let pbx = setup("true");
    run(&pbx, &["status"])
        .success()
        .stdout(predicate::str::contains("unreachable"))
        .stdout(predicate::str::contains("1 extensions"));
}
