use std::io::{self, Write};

use chrono::{DateTime, Local};
use colored::Colorize;

use crate::apply::{ApplyReport, apply_plans};
use crate::config::MigrateConfig;
use crate::error::Result;
use crate::model::Plan;
use crate::output::{
    Format, MigrationReport, PlanRecord, Summary, write_json_report, write_plans, write_summary,
};
use crate::plan::build_plan;
use crate::store::discovery::discover_workspace_files;

/// Overall result of a run that got far enough to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Clean,
    /// At least one file could not be planned or written.
    Failed,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::Failed => 2,
        }
    }
}

pub fn run(config: &MigrateConfig, format: Format) -> Result<RunStatus> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    run_with(
        config,
        format,
        &mut stdout.lock(),
        &mut stderr.lock(),
        Local::now(),
    )
}

/// Discover, plan, report and (when `config.apply` is set) write.
pub fn run_with<W: Write, E: Write>(
    config: &MigrateConfig,
    format: Format,
    out: &mut W,
    err: &mut E,
    now: DateTime<Local>,
) -> Result<RunStatus> {
    let dry_run = !config.apply;
    let include_todos = config.include_todos.resolve(&config.todos_path);
    let files = discover_workspace_files(&config.workspaces_dir, &config.user_ids)?;

    if files.is_empty() && format != Format::Json {
        writeln!(
            out,
            "No workspace files found under: {}",
            config.workspaces_dir.display()
        )?;
        return Ok(RunStatus::Clean);
    }

    let plans: Vec<Plan> = files
        .iter()
        .map(|path| build_plan(path, include_todos, config.force))
        .collect();
    let summary = Summary::from_plans(&plans, include_todos);

    write_plans(out, &plans, dry_run, format)?;
    write_summary(out, &summary, format)?;

    let apply = if dry_run || summary.migrate == 0 {
        None
    } else {
        let backup_root = config.backup_root(now);
        Some(apply_plans(&plans, &config.workspaces_dir, &backup_root)?)
    };

    if let Some(report) = &apply {
        for failure in &report.failures {
            writeln!(
                err,
                "[error] failed to update {}: {}",
                failure.path.display(),
                failure.error
            )?;
        }
    }

    match format {
        Format::Json => write_json_report(
            out,
            &MigrationReport {
                dry_run,
                workspaces_dir: &config.workspaces_dir,
                plans: plans.iter().map(PlanRecord::from).collect(),
                summary,
                apply: apply.as_ref(),
            },
        )?,
        Format::Pretty | Format::Minimal => {
            write_closing(out, err, dry_run, apply.as_ref())?;
        }
    }

    let failures = apply.as_ref().map_or(0, |report| report.failures.len());
    if summary.errors > 0 || failures > 0 {
        Ok(RunStatus::Failed)
    } else {
        Ok(RunStatus::Clean)
    }
}

fn write_closing<W: Write, E: Write>(
    out: &mut W,
    err: &mut E,
    dry_run: bool,
    apply: Option<&ApplyReport>,
) -> Result<()> {
    if dry_run {
        writeln!(
            out,
            "\n{}",
            "Dry run only. Re-run with --apply to write changes.".dimmed()
        )?;
        return Ok(());
    }

    let Some(report) = apply else {
        writeln!(out, "\nNo changes to apply.")?;
        return Ok(());
    };

    writeln!(
        out,
        "\n{} {} workspace file(s)",
        "Applied:".green().bold(),
        report.applied.len()
    )?;
    writeln!(out, "{} {}", "Backups:".dimmed(), report.backup_dir.display())?;

    if !report.failures.is_empty() {
        writeln!(err, "{} {}", "Failures:".red().bold(), report.failures.len())?;
    }
    Ok(())
}
