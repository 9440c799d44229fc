use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

/// When the `todos` extension is added to migrated workspaces.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[clap(rename_all = "snake_case")]
pub enum IncludeTodos {
    /// Include when the todos extension file is installed.
    #[default]
    Auto,
    Always,
    Never,
}

impl IncludeTodos {
    /// Resolve the policy against the todos extension probe path.
    ///
    /// Called once per run so every workspace gets the same decision.
    pub fn resolve(self, todos_path: &Path) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => todos_path.exists(),
        }
    }
}

impl std::fmt::Display for IncludeTodos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Always => write!(f, "always"),
            Self::Never => write!(f, "never"),
        }
    }
}
