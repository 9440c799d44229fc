use std::path::PathBuf;

use clap::Parser;
use ext_migrate::config::{
    DEFAULT_TODOS_PATH, DEFAULT_WORKSPACES_DIR, MigrateConfig, home_dir, resolve_path,
};
use ext_migrate::error::{MigrateError, Result};
use ext_migrate::output::Format;
use ext_migrate::policy::IncludeTodos;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Migrate legacy workspaces to explicit extension config.
///
/// Safe by default: nothing is written unless --apply is given, and every
/// changed file is backed up first.
#[derive(Parser)]
#[command(name = "ext-migrate", version)]
struct Cli {
    /// Workspace directory (default: ~/.config/pi-remote/workspaces)
    #[arg(long)]
    workspaces_dir: Option<PathBuf>,
    /// Restrict migration to one or more user IDs (repeatable)
    #[arg(long = "user-id")]
    user_id: Vec<String>,
    /// How to include the todos extension
    #[arg(long, value_enum, default_value = "auto")]
    include_todos: IncludeTodos,
    /// Todos extension file probed by --include-todos auto
    /// (default: ~/.pi/agent/extensions/todos.ts)
    #[arg(long)]
    todos_path: Option<PathBuf>,
    /// Recompute extension list even for already-explicit workspaces
    #[arg(long)]
    force: bool,
    /// Write changes (default is dry run)
    ///
    /// While writing, an exclusive lock is held on `<workspaces-dir>.ext-migrate.lock`
    /// next to the workspaces directory. The file is kept for later runs.
    #[arg(long)]
    apply: bool,
    /// Backup directory for changed files (auto-generated if omitted)
    #[arg(long)]
    backup_dir: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, hide = true)]
    pretty: bool,
}

fn build_config(cli: Cli) -> Result<MigrateConfig> {
    let home = home_dir();
    let home = home.as_deref();

    let workspaces_dir = resolve_path(cli.workspaces_dir, home, Some(DEFAULT_WORKSPACES_DIR))?
        .ok_or(MigrateError::HomeNotSet)?;
    let todos_path = resolve_path(cli.todos_path, home, Some(DEFAULT_TODOS_PATH))?
        .ok_or(MigrateError::HomeNotSet)?;

    let mut config = MigrateConfig::new(workspaces_dir, todos_path);
    config.user_ids = cli.user_id;
    config.include_todos = cli.include_todos;
    config.force = cli.force;
    config.apply = cli.apply;
    config.backup_dir = resolve_path(cli.backup_dir, home, None)?;
    Ok(config)
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "ext_migrate=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };

    let outcome = build_config(cli)
        .and_then(|config| ext_migrate::commands::migrate::run(&config, format));

    match outcome {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            match format {
                Format::Json => {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "error": e.code(),
                            "message": e.to_string()
                        })
                    );
                }
                _ => eprintln!("error: {e}"),
            }
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_dry_run_auto_pretty() {
        let cli = Cli::try_parse_from(["ext-migrate", "--workspaces-dir", "/srv/ws"]).unwrap();
        assert!(!cli.apply);
        assert!(!cli.force);
        assert_eq!(cli.include_todos, IncludeTodos::Auto);
        assert_eq!(cli.format, Format::Pretty);

        let mut with_probe = Cli::try_parse_from([
            "ext-migrate",
            "--workspaces-dir",
            "/srv/ws",
            "--todos-path",
            "/srv/todos.ts",
            "--user-id",
            "a",
            "--user-id",
            "b",
            "--include-todos",
            "never",
            "--apply",
        ])
        .unwrap();
        with_probe.backup_dir = Some(PathBuf::from("/srv/backup"));

        let config = build_config(with_probe).unwrap();
        assert_eq!(config.workspaces_dir, PathBuf::from("/srv/ws"));
        assert_eq!(config.todos_path, PathBuf::from("/srv/todos.ts"));
        assert_eq!(config.user_ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(config.include_todos, IncludeTodos::Never);
        assert!(config.apply);
        assert_eq!(config.backup_dir, Some(PathBuf::from("/srv/backup")));
    }

    #[test]
    fn rejects_unknown_include_todos_mode() {
        let parsed = Cli::try_parse_from(["ext-migrate", "--include-todos", "sometimes"]);
        assert!(parsed.is_err());
    }
}
