use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{MigrateError, Result};

pub type WorkspaceObject = Map<String, Value>;

/// Read a workspace file and require a JSON object root.
pub fn read_workspace_object(path: &Path) -> Result<WorkspaceObject> {
    let data = fs::read_to_string(path)?;
    match serde_json::from_str(&data)? {
        Value::Object(object) => Ok(object),
        _ => Err(MigrateError::NotJsonObject(path.to_path_buf())),
    }
}

/// Pretty JSON with two-space indent and a trailing newline.
pub fn to_pretty_json(object: &WorkspaceObject) -> Result<String> {
    let mut out = serde_json::to_string_pretty(object)?;
    out.push('\n');
    Ok(out)
}

/// Mirror `path`'s position under `root` into `backup_root`.
pub fn backup_path_for(path: &Path, root: &Path, backup_root: &Path) -> Result<PathBuf> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| MigrateError::OutsideWorkspaces(path.to_path_buf(), root.to_path_buf()))?;
    Ok(backup_root.join(relative))
}

/// Copy the untouched bytes of `source` to `destination`, creating parents.
pub fn backup_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, destination)?;
    Ok(())
}

/// Write `contents` to a temp sibling of `path`, then rename it over `path`
/// so readers only ever see the old or the new file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = temp_sibling(path);

    if let Err(err) = write_then_rename(&tmp_path, path, contents) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }

    Ok(())
}

fn write_then_rename(tmp_path: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp_path, path)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{file_name}.{}.tmp", Uuid::new_v4().simple()))
}
