use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{MigrateError, Result};

const LOCK_SUFFIX: &str = ".ext-migrate.lock";

/// Exclusive hold on a workspaces tree for the duration of an apply.
///
/// The lock file lives next to the tree (`<parent>/<name>.ext-migrate.lock`)
/// so the workspaces directory itself only ever contains workspace files.
/// Dropping the guard releases the lock; the file is left for the next run.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    _file: File,
}

impl RunLock {
    pub fn path_for(workspaces_dir: &Path) -> PathBuf {
        match (workspaces_dir.parent(), workspaces_dir.file_name()) {
            (Some(parent), Some(name)) => {
                let mut file_name = OsString::from(name);
                file_name.push(LOCK_SUFFIX);
                parent.join(file_name)
            }
            _ => workspaces_dir.join(LOCK_SUFFIX),
        }
    }

    /// Take the lock without waiting; a concurrent holder yields `Locked`.
    pub fn acquire(workspaces_dir: &Path) -> Result<Self> {
        let path = Self::path_for(workspaces_dir);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(MigrateError::Locked(path));
        }

        tracing::debug!(path = %path.display(), "holding run lock");
        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
