use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{MigrateError, Result};
use crate::policy::IncludeTodos;

/// Default workspace store, relative to `$HOME`.
pub const DEFAULT_WORKSPACES_DIR: &str = ".config/pi-remote/workspaces";
/// Default todos extension probe, relative to `$HOME`.
pub const DEFAULT_TODOS_PATH: &str = ".pi/agent/extensions/todos.ts";

/// Everything one migration run needs to know. Built once by the CLI and
/// passed down; library code never consults the environment on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateConfig {
    pub workspaces_dir: PathBuf,
    pub user_ids: Vec<String>,
    pub include_todos: IncludeTodos,
    pub todos_path: PathBuf,
    pub force: bool,
    pub apply: bool,
    pub backup_dir: Option<PathBuf>,
}

impl MigrateConfig {
    /// Dry-run config over `workspaces_dir` with every other option at its default.
    pub fn new(workspaces_dir: impl Into<PathBuf>, todos_path: impl Into<PathBuf>) -> Self {
        Self {
            workspaces_dir: workspaces_dir.into(),
            user_ids: Vec::new(),
            include_todos: IncludeTodos::default(),
            todos_path: todos_path.into(),
            force: false,
            apply: false,
            backup_dir: None,
        }
    }

    /// Backup root for this run: the explicit override, or a timestamped
    /// sibling of the workspaces directory.
    pub fn backup_root(&self, now: DateTime<Local>) -> PathBuf {
        if let Some(dir) = &self.backup_dir {
            return dir.clone();
        }

        let name = format!("workspaces.backup-{}", now.format("%Y%m%d-%H%M%S"));
        match self.workspaces_dir.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }
}

/// `$HOME`, ignoring an empty value.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Resolve a path flag: expand a leading `~`, fall back to `$HOME/<default_rel>`
/// when absent, and make the result absolute.
pub fn resolve_path(
    raw: Option<PathBuf>,
    home: Option<&Path>,
    default_rel: Option<&str>,
) -> Result<Option<PathBuf>> {
    let path = match (raw, default_rel) {
        (Some(raw), _) => expand_home(&raw, home)?,
        (None, Some(rel)) => home.ok_or(MigrateError::HomeNotSet)?.join(rel),
        (None, None) => return Ok(None),
    };

    Ok(Some(std::path::absolute(&path)?))
}

fn expand_home(path: &Path, home: Option<&Path>) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home = home.ok_or(MigrateError::HomeNotSet)?;
            Ok(home.join(components.as_path()))
        }
        _ => Ok(path.to_path_buf()),
    }
}
