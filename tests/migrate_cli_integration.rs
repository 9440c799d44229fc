use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

struct Store {
    dir: TempDir,
}

impl Store {
    fn new() -> Self {
        let store = Self {
            dir: tempdir().unwrap(),
        };
        fs::create_dir_all(store.root()).unwrap();
        store
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("workspaces")
    }

    fn backups(&self) -> PathBuf {
        self.dir.path().join("backups")
    }

    fn todos_probe(&self) -> PathBuf {
        self.dir.path().join("todos.ts")
    }

    fn write(&self, user: &str, workspace: &str, contents: &str) -> PathBuf {
        let dir = self.root().join(user);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{workspace}.json"));
        fs::write(&path, contents).unwrap();
        path
    }

    fn base_args(&self) -> Vec<String> {
        vec![
            "--workspaces-dir".into(),
            self.root().display().to_string(),
            "--todos-path".into(),
            self.todos_probe().display().to_string(),
            "--backup-dir".into(),
            self.backups().display().to_string(),
        ]
    }
}

fn run_migrate(store: &Store, extra: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ext-migrate"))
        .env("NO_COLOR", "1")
        .args(store.base_args())
        .args(extra)
        .output()
        .expect("command should run")
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn dry_run_reports_and_leaves_files_untouched() {
    let store = Store::new();
    let original = r#"{"memoryEnabled": true}"#;
    let path = store.write("alice", "main", original);

    let output = run_migrate(&store, &["--include-todos", "always"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("== Workspace Extension Migration (DRY RUN) =="));
    assert!(stdout.contains("- alice/main (main)"));
    assert!(stdout.contains("extensions: [] -> [\"memory\", \"todos\"]"));
    assert!(stdout.contains("Dry run only. Re-run with --apply to write changes."));

    assert_eq!(fs::read_to_string(&path).unwrap(), original);
    assert!(!store.backups().exists());
}

#[test]
fn apply_end_to_end_with_todos_probe_present() {
    let store = Store::new();
    fs::write(store.todos_probe(), "export default {}").unwrap();
    let original = r#"{"memoryEnabled": true}"#;
    let path = store.write("alice", "main", original);

    let output = run_migrate(&store, &["--apply"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("include_todos=true"));
    assert!(stdout.contains("Applied: 1 workspace file(s)"));

    assert_eq!(
        read_json(&path),
        json!({"memoryEnabled": true, "extensionMode": "explicit", "extensions": ["memory", "todos"]})
    );
    assert_eq!(
        fs::read_to_string(store.backups().join("alice").join("main.json")).unwrap(),
        original
    );
}

#[test]
fn already_explicit_file_is_skipped_without_backup() {
    let store = Store::new();
    let contents = r#"{"extensionMode": "explicit", "extensions": ["x"]}"#;
    let path = store.write("alice", "done", contents);

    AssertCommand::cargo_bin("ext-migrate")
        .unwrap()
        .env("NO_COLOR", "1")
        .args(store.base_args())
        .arg("--apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("[skip: already-explicit]"))
        .stdout(predicate::str::contains("No changes to apply."));

    assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    assert!(!store.backups().exists());
}

#[test]
fn malformed_file_yields_exit_code_two() {
    let store = Store::new();
    let broken = store.write("alice", "broken", "{\"memoryEnabled\": ");
    let good = store.write("bob", "good", r#"{"memoryEnabled": true}"#);

    AssertCommand::cargo_bin("ext-migrate")
        .unwrap()
        .env("NO_COLOR", "1")
        .args(store.base_args())
        .args(["--apply", "--include-todos", "never"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("[skip: parse-error]"))
        .stdout(predicate::str::contains("errors=1"));

    assert_eq!(fs::read_to_string(&broken).unwrap(), "{\"memoryEnabled\": ");
    assert_eq!(read_json(&good)["extensions"], json!(["memory"]));
    assert!(!store.backups().join("alice").exists());
}

#[test]
fn user_filter_limits_migration() {
    let store = Store::new();
    let alice = store.write("alice", "a", r#"{"memoryEnabled": true}"#);
    let bob_original = r#"{"memoryEnabled": true}"#;
    let bob = store.write("bob", "b", bob_original);

    let output = run_migrate(&store, &["--apply", "--user-id", "alice", "--user-id", "ghost"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(read_json(&alice)["extensionMode"], json!("explicit"));
    assert_eq!(fs::read_to_string(&bob).unwrap(), bob_original);
}

#[test]
fn rerun_after_apply_changes_nothing() {
    let store = Store::new();
    let path = store.write("alice", "main", r#"{"memoryEnabled": true, "name": "Main"}"#);

    assert_eq!(run_migrate(&store, &["--apply"]).status.code(), Some(0));
    let migrated = fs::read(&path).unwrap();

    let output = run_migrate(&store, &["--apply", "--format", "json"]);
    assert_eq!(output.status.code(), Some(0));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["plans"][0]["reason"], json!("already-explicit"));
    assert_eq!(report["summary"]["migrate"], json!(0));
    assert!(report.get("apply").is_none());
    assert_eq!(fs::read(&path).unwrap(), migrated);
}

#[test]
fn force_recomputes_explicit_workspace() {
    let store = Store::new();
    let path = store.write(
        "alice",
        "main",
        r#"{"extensionMode": "explicit", "extensions": ["web"], "memoryEnabled": true}"#,
    );

    let output = run_migrate(&store, &["--apply", "--force", "--include-todos", "never"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(read_json(&path)["extensions"], json!(["web", "memory"]));
}

#[test]
fn missing_workspaces_dir_is_nothing_to_do() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");

    AssertCommand::cargo_bin("ext-migrate")
        .unwrap()
        .env("NO_COLOR", "1")
        .args(["--workspaces-dir", missing.to_str().unwrap()])
        .args(["--todos-path", dir.path().join("todos.ts").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("No workspace files found under:"));
}

#[test]
fn held_lock_is_a_run_level_error() {
    use fs2::FileExt;

    let store = Store::new();
    let path = store.write("alice", "main", r#"{"memoryEnabled": true}"#);

    let lock = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(store.dir.path().join("workspaces.ext-migrate.lock"))
        .unwrap();
    lock.try_lock_exclusive().unwrap();

    let output = run_migrate(&store, &["--apply", "--format", "json"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    let error: Value = serde_json::from_str(stderr.lines().last().unwrap()).unwrap();
    assert_eq!(error["error"], json!("locked"));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        r#"{"memoryEnabled": true}"#
    );
}
