use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Enumerate `<root>/<userId>/<workspaceId>.json` files.
///
/// With `user_ids`, only those user directories are scanned, in the given
/// order; missing ones are skipped. Without, every user directory under
/// `root` is scanned in name order. File names within a user directory are
/// always sorted. A missing root yields no files.
pub fn discover_workspace_files(root: &Path, user_ids: &[String]) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();

    if user_ids.is_empty() {
        let mut user_dirs = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if path.is_dir() {
                user_dirs.push(path);
            }
        }
        user_dirs.sort();

        for user_dir in user_dirs {
            files.extend(workspace_json_paths(&user_dir)?);
        }
    } else {
        for user_id in user_ids {
            let user_dir = root.join(user_id);
            if !user_dir.is_dir() {
                continue;
            }
            files.extend(workspace_json_paths(&user_dir)?);
        }
    }

    tracing::debug!(root = %root.display(), count = files.len(), "discovered workspace files");
    Ok(files)
}

fn workspace_json_paths(user_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in fs::read_dir(user_dir)? {
        let path = entry?.path();

        if !path.is_file() {
            continue;
        }

        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}
