use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("workspace file root must be a JSON object: {}", .0.display())]
    NotJsonObject(PathBuf),

    #[error("workspace file {} is not under {}", .0.display(), .1.display())]
    OutsideWorkspaces(PathBuf, PathBuf),

    #[error("stale plan: {} changed on disk since it was planned", .0.display())]
    StalePlan(PathBuf),

    #[error("locked by another process: {}", .0.display())]
    Locked(PathBuf),

    #[error("HOME is not set; pass explicit paths instead")]
    HomeNotSet,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotJsonObject(_) => "invalid_json_root",
            Self::OutsideWorkspaces(_, _) => "outside_workspaces",
            Self::StalePlan(_) => "stale_plan",
            Self::Locked(_) => "locked",
            Self::HomeNotSet => "home_not_set",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
