//! CLI end-to-end tests that invoke the compiled `pairsync` binary.

use assert_cmd::Command;
use pairsync_core::{SyncPair, SyncOutcome};
use pairsync_test_utils::PairFixture;
use predicates::prelude::*;
use tempfile::TempDir;

fn pairsync() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pairsync"));
    cmd.env_remove("PAIRSYNC_HOME").env("RUST_LOG", "warn");
    cmd
}

/// `pairsync --home <fixture home> <args>`
fn pairsync_in(fixture: &PairFixture, args: &[&str]) -> Command {
    let mut cmd = pairsync();
    cmd.arg("--home").arg(fixture.layout().home().as_str()).args(args);
    cmd
}

fn configured(fixture: &PairFixture) -> SyncPair {
    let pair = fixture.pair("notes", "notes.md");
    fixture.write_config(&[pair.clone()], None);
    pair
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn help_lists_commands() {
    pairsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve").and(predicate::str::contains("merge")));
}

#[test]
fn merge_prints_clean_result() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("base"), "L1\nL2\nL3\n").unwrap();
    std::fs::write(dir.path().join("source"), "L1x\nL2\nL3\n").unwrap();
    std::fs::write(dir.path().join("target"), "L1\nL2\nL3y\n").unwrap();

    pairsync()
        .current_dir(dir.path())
        .args(["merge", "base", "source", "target"])
        .assert()
        .success()
        .stdout("L1x\nL2\nL3y\n");
}

#[test]
fn merge_conflict_exits_one() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("base"), "A\n").unwrap();
    std::fs::write(dir.path().join("source"), "B\n").unwrap();
    std::fs::write(dir.path().join("target"), "C\n").unwrap();

    pairsync()
        .current_dir(dir.path())
        .args(["merge", "base", "source", "target", "-o", "out"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("1 conflict(s) at line(s) 1"));

    let out = std::fs::read_to_string(dir.path().join("out")).unwrap();
    assert_eq!(out, "<<<<<<< SOURCE\nB\n=======\nC\n>>>>>>> TARGET\n");
}

#[test]
fn merge_of_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();

    pairsync()
        .current_dir(dir.path())
        .args(["merge", "base", "source", "target"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read base"));
}

#[test]
fn sync_creates_the_missing_side() {
    let fixture = PairFixture::new();
    let pair = configured(&fixture);
    fixture.write(&pair.source, "hello\n");

    pairsync_in(&fixture, &["sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("notes"));

    fixture.assert_content(&pair.target, "hello\n");
}

#[test]
fn sync_json_reports_outcomes() {
    let fixture = PairFixture::new();
    let pair = configured(&fixture);
    fixture.write(&pair.source, "hello\n");

    let report = json_output(&mut pairsync_in(&fixture, &["sync", "--json"]));

    assert_eq!(report[0]["pair"], "notes");
    assert_eq!(report[0]["outcome"], "created");
}

#[test]
fn sync_without_config_says_so() {
    let fixture = PairFixture::new();

    pairsync_in(&fixture, &["sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No pairs configured"));
}

#[test]
fn status_json_reports_state_and_base() {
    let fixture = PairFixture::new();
    let pair = configured(&fixture);
    fixture.write(&pair.source, "same\n");
    fixture.write(&pair.target, "same\n");

    let before = json_output(&mut pairsync_in(&fixture, &["status", "--json"]));
    assert_eq!(before[0]["state"], "in_sync");
    assert_eq!(before[0]["has_base"], false);

    pairsync_in(&fixture, &["sync"]).assert().success();

    let after = json_output(&mut pairsync_in(&fixture, &["status", "--json"]));
    assert_eq!(after[0]["has_base"], true);
}

#[test]
fn conflicts_empty_ledger() {
    let fixture = PairFixture::new();
    configured(&fixture);

    pairsync_in(&fixture, &["conflicts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No unresolved conflicts"));
}

#[test]
fn conflict_can_be_listed_and_resolved() {
    let fixture = PairFixture::new();
    let pair = configured(&fixture);
    let h = fixture.harness(vec![pair.clone()]);
    h.coordinator.snapshots().save(&pair.key(), "A\n").unwrap();
    fixture.write(&pair.source, "B\n");
    fixture.write(&pair.target, "C\n");
    assert_eq!(
        h.coordinator.on_change(&pair.source).unwrap(),
        SyncOutcome::Conflicted { count: 1 }
    );

    let listed = json_output(&mut pairsync_in(&fixture, &["conflicts", "--json"]));
    assert_eq!(listed[0]["pair"], "notes");
    assert_eq!(listed[0]["conflict_count"], 1);

    pairsync_in(&fixture, &["conflicts", "--details"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Line 1:").and(predicate::str::contains("Target:")));

    pairsync_in(&fixture, &["resolve", "notes", "--take", "source"])
        .assert()
        .success()
        .stdout(predicate::str::contains("took source"));

    fixture.assert_content(&pair.source, "B\n");
    fixture.assert_content(&pair.target, "B\n");
    pairsync_in(&fixture, &["conflicts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No unresolved conflicts"));
}

#[test]
fn resolve_unknown_pair_fails() {
    let fixture = PairFixture::new();
    configured(&fixture);

    pairsync_in(&fixture, &["resolve", "nope", "--take", "target"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No pair named or containing 'nope'"));
}

#[test]
fn resolve_pair_without_conflict_fails() {
    let fixture = PairFixture::new();
    configured(&fixture);

    pairsync_in(&fixture, &["resolve", "notes", "--take", "target"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not in conflict"));
}
