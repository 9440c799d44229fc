use std::io::Write;
use std::path::Path;

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use crate::apply::ApplyReport;
use crate::error::Result;
use crate::model::{ExtensionState, Plan, PlanStatus, SkipReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

/// Aggregate counts over one run's plans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub migrate: usize,
    pub skipped: usize,
    pub errors: usize,
    pub include_todos: bool,
}

impl Summary {
    pub fn from_plans(plans: &[Plan], include_todos: bool) -> Self {
        let mut summary = Self {
            total: plans.len(),
            include_todos,
            ..Self::default()
        };

        for plan in plans {
            match plan.status {
                PlanStatus::Error { .. } => summary.errors += 1,
                PlanStatus::AlreadyExplicit => summary.skipped += 1,
                PlanStatus::Migrate => summary.migrate += 1,
                PlanStatus::NoOp => {}
            }
        }

        summary
    }
}

/// Serialized shape of a plan in JSON reports.
#[derive(Debug, Serialize)]
pub struct PlanRecord<'a> {
    pub path: &'a Path,
    pub user_id: &'a str,
    pub workspace_id: &'a str,
    pub name: &'a str,
    pub status: &'static str,
    pub changed: bool,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    pub before: &'a ExtensionState,
    pub after: &'a ExtensionState,
}

impl<'a> From<&'a Plan> for PlanRecord<'a> {
    fn from(plan: &'a Plan) -> Self {
        Self {
            path: &plan.path,
            user_id: &plan.user_id,
            workspace_id: &plan.workspace_id,
            name: &plan.name,
            status: status_label(&plan.status),
            changed: plan.changed(),
            skipped: plan.skipped(),
            reason: plan.reason(),
            error: plan.error(),
            before: &plan.before,
            after: &plan.after,
        }
    }
}

/// Whole-run report, emitted as one document in JSON format.
#[derive(Debug, Serialize)]
pub struct MigrationReport<'a> {
    pub dry_run: bool,
    pub workspaces_dir: &'a Path,
    pub plans: Vec<PlanRecord<'a>>,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply: Option<&'a ApplyReport>,
}

fn status_label(status: &PlanStatus) -> &'static str {
    match status {
        PlanStatus::Migrate => "migrate",
        PlanStatus::NoOp => "no-op",
        PlanStatus::AlreadyExplicit => "skipped",
        PlanStatus::Error { .. } => "error",
    }
}

fn mode_label(mode: Option<&str>) -> String {
    match mode {
        Some(mode) => format!("{mode:?}"),
        None => "<none>".to_string(),
    }
}

/// Per-plan listing, in discovery order, under a dry-run/apply heading.
pub fn write_plans<W: Write>(
    out: &mut W,
    plans: &[Plan],
    dry_run: bool,
    format: Format,
) -> Result<()> {
    match format {
        Format::Json => {}
        Format::Pretty => {
            let mode = if dry_run { "DRY RUN" } else { "APPLY" };
            writeln!(
                out,
                "\n{}",
                format!("== Workspace Extension Migration ({mode}) ==").bold()
            )?;
            for plan in plans {
                write_pretty_plan(out, plan)?;
            }
        }
        Format::Minimal => {
            for plan in plans {
                let detail = match plan.reason() {
                    Some(reason) => reason.to_string(),
                    None => plan.after.extensions.as_slice().join(","),
                };
                writeln!(
                    out,
                    "{:8} {}/{} {}",
                    status_label(&plan.status),
                    plan.user_id,
                    plan.workspace_id,
                    detail
                )?;
            }
        }
    }
    Ok(())
}

fn write_pretty_plan<W: Write>(out: &mut W, plan: &Plan) -> Result<()> {
    let header = format!("- {}/{} ({})", plan.user_id, plan.workspace_id, plan.name);

    match &plan.status {
        PlanStatus::Error { kind, message } => {
            let reason = SkipReason::from(*kind);
            writeln!(out, "{header}  {}", format!("[skip: {reason}]").red())?;
            writeln!(out, "    {} {}", "error:".red(), message)?;
        }
        PlanStatus::AlreadyExplicit => {
            let reason = SkipReason::AlreadyExplicit;
            writeln!(out, "{header}  {}", format!("[skip: {reason}]").yellow())?;
        }
        PlanStatus::Migrate => {
            writeln!(out, "{header}")?;
            writeln!(
                out,
                "    {} {} -> {}",
                "mode:".dimmed(),
                mode_label(plan.before.mode.as_deref()),
                mode_label(plan.after.mode.as_deref()).green()
            )?;
            writeln!(
                out,
                "    {} {} -> {}",
                "extensions:".dimmed(),
                plan.before.extensions,
                plan.after.extensions.to_string().green()
            )?;
        }
        PlanStatus::NoOp => {
            writeln!(out, "{header}  {}", "[no-op]".dimmed())?;
            writeln!(
                out,
                "    {} {}",
                "mode:".dimmed(),
                mode_label(plan.before.mode.as_deref())
            )?;
            writeln!(out, "    {} {}", "extensions:".dimmed(), plan.before.extensions)?;
        }
    }
    Ok(())
}

pub fn write_summary<W: Write>(out: &mut W, summary: &Summary, format: Format) -> Result<()> {
    let counts = format!(
        "total={}, migrate={}, skipped={}, errors={}, include_todos={}",
        summary.total, summary.migrate, summary.skipped, summary.errors, summary.include_todos
    );
    match format {
        Format::Json => {}
        Format::Pretty => writeln!(out, "\n{} {}", "Summary:".bold(), counts)?,
        Format::Minimal => writeln!(out, "{}", counts.replace(", ", " "))?,
    }
    Ok(())
}

pub fn write_json_report<W: Write>(out: &mut W, report: &MigrationReport<'_>) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string(report)?)?;
    Ok(())
}
