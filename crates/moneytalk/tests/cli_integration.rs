//! CLI integration tests for the moneytalk command-line interface.
//!
//! Every test runs against its own temporary database and config directory.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A scratch journal: database, config dir and working directory.
struct Journal {
    dir: TempDir,
}

impl Journal {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("journal.db")
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("moneytalk").unwrap();
        cmd.current_dir(self.dir.path())
            .env("MONEYTALK_CONFIG_DIR", self.dir.path().join("config"))
            .env_remove("MONEYTALK_DB_PATH")
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(self.db());
        cmd
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.cmd().arg("--json").args(args).output().unwrap();
        assert!(
            output.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn seed(&self) {
        self.cmd()
            .args(["contact", "add", "Dana", "--relationship", "Partner"])
            .assert()
            .success();
        self.cmd()
            .args(["category", "add", "Rent", "--color", "#ff8800"])
            .assert()
            .success();
        self.cmd()
            .args([
                "conversation",
                "add",
                "Split the rent",
                "--date",
                "2025-03-01 18:30",
                "--rating",
                "8",
                "--contact",
                "Dana",
                "--category",
                "Rent",
                "--goal",
                "Agree on a split",
            ])
            .assert()
            .success();
        self.cmd()
            .args([
                "conversation",
                "add",
                "Card balance",
                "--date",
                "2025-07-09",
                "--rating",
                "3",
            ])
            .assert()
            .success();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("moneytalk")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("conversation"))
        .stdout(predicate::str::contains("contact"))
        .stdout(predicate::str::contains("category"))
        .stdout(predicate::str::contains("phrase"))
        .stdout(predicate::str::contains("timeline"))
        .stdout(predicate::str::contains("insights"))
        .stdout(predicate::str::contains("calendar"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("reset"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("remote"));
}

#[test]
fn test_version_displays() {
    Command::cargo_bin("moneytalk")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("moneytalk"));
}

#[test]
fn test_unknown_subcommand_rejected() {
    Command::cargo_bin("moneytalk")
        .unwrap()
        .arg("budget")
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Journal Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_record_and_list_conversations() {
    let journal = Journal::new();
    journal.seed();

    let page = journal.json(&["conversation", "list"]);
    let conversations = page["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 2);
    // Newest first
    assert_eq!(conversations[0]["title"], "Card balance");
    assert_eq!(conversations[1]["title"], "Split the rent");
    assert_eq!(conversations[1]["emotional_rating"], 8);
    assert_eq!(conversations[1]["contact_ids"].as_array().unwrap().len(), 1);
    assert_eq!(page["pages"], 1);
}

#[test]
fn test_validation_errors_are_reported() {
    let journal = Journal::new();
    journal
        .cmd()
        .args(["conversation", "add", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("title cannot be empty"));

    journal
        .cmd()
        .args(["conversation", "add", "Rent", "--rating", "11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 1 and 10"));

    journal
        .cmd()
        .args(["category", "add", "Rent", "--color", "orange"])
        .assert()
        .failure();

    let page = journal.json(&["conversation", "list"]);
    assert!(page["conversations"].as_array().unwrap().is_empty());
}

#[test]
fn test_delete_contact_keeps_conversation() {
    let journal = Journal::new();
    journal.seed();

    journal
        .cmd()
        .args(["contact", "delete", "Dana"])
        .assert()
        .success();

    let conversation = journal.json(&["conversation", "show", "Split the rent"]);
    assert!(conversation["contact_ids"].as_array().unwrap().is_empty());
}

#[test]
fn test_timeline_filters() {
    let journal = Journal::new();
    journal.seed();

    let successful = journal.json(&["timeline", "--outcome", "successful"]);
    assert_eq!(successful.as_array().unwrap().len(), 1);
    assert_eq!(successful[0]["title"], "Split the rent");

    let with_dana = journal.json(&["timeline", "--contact", "dana"]);
    assert_eq!(with_dana.as_array().unwrap().len(), 1);

    journal
        .cmd()
        .args(["timeline", "--outcome", "amazing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown outcome"));
}

#[test]
fn test_insights() {
    let journal = Journal::new();
    journal.seed();

    let insights = journal.json(&["insights"]);
    assert_eq!(insights["total"], 2);
    assert_eq!(insights["average_rating"], 5.5);
    assert_eq!(insights["success_rate"], 50.0);
    assert_eq!(insights["mostDiscussedContact"], "Dana");
    assert_eq!(insights["perMonth"].as_array().unwrap().len(), 2);
}

#[test]
fn test_phrases_cascade_with_category() {
    let journal = Journal::new();
    journal.seed();
    journal
        .cmd()
        .args(["phrase", "add", "Can we revisit the split?", "--category", "Rent"])
        .assert()
        .success();
    assert_eq!(journal.json(&["phrase", "list"]).as_array().unwrap().len(), 1);

    journal
        .cmd()
        .args(["category", "delete", "Rent"])
        .assert()
        .success();
    assert!(journal.json(&["phrase", "list"]).as_array().unwrap().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Backup and Report Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_export_then_import_into_new_journal() {
    let journal = Journal::new();
    journal.seed();
    let backup = journal.path().join("backup.json");
    journal
        .cmd()
        .args(["export", "--file"])
        .arg(&backup)
        .assert()
        .success();

    let restored = Journal::new();
    let report = restored.json(&["import", backup.to_str().unwrap()]);
    assert_eq!(report["conversations"]["created"], 2);
    assert_eq!(report["contacts"]["created"], 1);
    assert_eq!(report["categories"]["created"], 1);
    assert!(report["failures"].as_array().unwrap().is_empty());

    let conversation = restored.json(&["conversation", "show", "Split the rent"]);
    assert_eq!(conversation["contact_ids"].as_array().unwrap().len(), 1);
    assert!(conversation["category_id"].is_string());
}

#[test]
fn test_import_rejects_garbage() {
    let journal = Journal::new();
    let bogus = journal.path().join("bogus.json");
    std::fs::write(&bogus, "not json at all").unwrap();

    journal
        .cmd()
        .arg("import")
        .arg(&bogus)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid backup file"));
}

#[test]
fn test_report_text_and_pdf() {
    let journal = Journal::new();
    journal.seed();

    journal
        .cmd()
        .args(["report", "--year", "2025", "--text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("My Money Conversations 2025"))
        .stdout(predicate::str::contains("Goal: Agree on a split"))
        .stdout(predicate::str::contains("Emotional Rating: 3/10"));

    let out = journal.path().join("reports");
    let written = journal.json(&["report", "--year", "2025", "--dir", out.to_str().unwrap()]);
    let path = PathBuf::from(written["path"].as_str().unwrap());
    assert!(path.starts_with(&out));
    assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));

    journal
        .cmd()
        .args(["report", "--year", "2019", "--text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "No conversations to export for selected year",
        ));
}

#[test]
fn test_reset_requires_confirmation() {
    let journal = Journal::new();
    journal.seed();

    journal.cmd().arg("reset").assert().failure();
    assert_eq!(
        journal.json(&["conversation", "list"])["conversations"]
            .as_array()
            .unwrap()
            .len(),
        2
    );

    journal.cmd().args(["reset", "--yes"]).assert().success();
    assert!(journal.json(&["contact", "list"]).as_array().unwrap().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_set_and_get() {
    let journal = Journal::new();
    journal
        .cmd()
        .args(["config", "set", "report.author", "Dana"])
        .assert()
        .success();

    journal
        .cmd()
        .args(["config", "get", "report.author"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dana"));

    assert!(journal.path().join("config").join("config.toml").is_file());

    journal
        .cmd()
        .args(["config", "set", "report.colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn test_remote_check_without_endpoint() {
    let journal = Journal::new();
    let status = journal.json(&["remote", "check"]);
    assert_eq!(status["enabled"], false);
}
