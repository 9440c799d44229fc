use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::{MigrateError, Result};
use crate::model::{EXPLICIT_MODE, Plan};
use crate::plan::{before_state, memory_flag};
use crate::store::files::{
    backup_file, backup_path_for, read_workspace_object, to_pretty_json, write_atomic,
};
use crate::store::lock::RunLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedFile {
    pub path: PathBuf,
    pub backup: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub backup_dir: PathBuf,
    pub applied: Vec<AppliedFile>,
    pub failures: Vec<WriteFailure>,
}

/// Write every pending plan: back up the original bytes, then atomically
/// replace the file with its explicit-mode contents.
///
/// A failure on one file is recorded and the loop moves on; only run-level
/// problems (lock held, backup root not creatable) return `Err`.
pub fn apply_plans(
    plans: &[Plan],
    workspaces_dir: &Path,
    backup_dir: &Path,
) -> Result<ApplyReport> {
    let _lock = RunLock::acquire(workspaces_dir)?;
    fs::create_dir_all(backup_dir)?;

    let outcomes: Vec<(&Plan, Result<PathBuf>)> = plans
        .iter()
        .filter(|plan| plan.is_pending_write())
        .map(|plan| (plan, apply_plan(plan, workspaces_dir, backup_dir)))
        .collect();

    let mut report = ApplyReport {
        backup_dir: backup_dir.to_path_buf(),
        applied: Vec::new(),
        failures: Vec::new(),
    };

    for (plan, outcome) in outcomes {
        match outcome {
            Ok(backup) => {
                tracing::info!(path = %plan.path.display(), backup = %backup.display(), "migrated workspace");
                report.applied.push(AppliedFile {
                    path: plan.path.clone(),
                    backup,
                });
            }
            Err(err) => {
                tracing::warn!(path = %plan.path.display(), error = %err, "failed to update workspace");
                report.failures.push(WriteFailure {
                    path: plan.path.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Migrate one file, returning where its backup was written.
fn apply_plan(plan: &Plan, workspaces_dir: &Path, backup_dir: &Path) -> Result<PathBuf> {
    let mut object = read_workspace_object(&plan.path)?;
    if before_state(&object) != plan.before || memory_flag(&object) != plan.memory_enabled {
        return Err(MigrateError::StalePlan(plan.path.clone()));
    }

    let backup = backup_path_for(&plan.path, workspaces_dir, backup_dir)?;
    backup_file(&plan.path, &backup)?;

    object.insert(
        "extensionMode".to_string(),
        Value::String(EXPLICIT_MODE.to_string()),
    );
    object.insert("extensions".to_string(), plan.after.extensions.to_json());

    write_atomic(&plan.path, to_pretty_json(&object)?.as_bytes())?;
    Ok(backup)
}
