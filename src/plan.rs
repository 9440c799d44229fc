use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::model::{
    ExtensionSet, ExtensionState, MEMORY_EXTENSION, Plan, PlanError, PlanStatus, TODOS_EXTENSION,
    is_truthy,
};
use crate::store::files::WorkspaceObject;

/// Identity of a workspace file: `<root>/<userId>/<workspaceId>.json`.
fn workspace_identity(path: &Path) -> (String, String) {
    let user_id = path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());
    let workspace_id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    (user_id, workspace_id)
}

/// Plan the migration of one workspace file.
///
/// Never fails: unreadable or malformed files produce a skipped plan that
/// carries the error text.
pub fn build_plan(path: &Path, include_todos: bool, force: bool) -> Plan {
    let (user_id, workspace_id) = workspace_identity(path);

    let failed = |kind: PlanError, message: String| Plan {
        path: path.to_path_buf(),
        user_id: user_id.clone(),
        workspace_id: workspace_id.clone(),
        name: workspace_id.clone(),
        before: ExtensionState::default(),
        after: ExtensionState::explicit(ExtensionSet::new()),
        memory_enabled: false,
        status: PlanStatus::Error { kind, message },
    };

    let data = match fs::read_to_string(path)
        .map_err(|err| err.to_string())
        .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|err| err.to_string()))
    {
        Ok(data) => data,
        Err(message) => return failed(PlanError::ParseError, message),
    };

    let Value::Object(object) = data else {
        return failed(
            PlanError::InvalidJsonRoot,
            "workspace file root must be a JSON object".to_string(),
        );
    };

    let name = display_name(&object, &workspace_id);
    let before = before_state(&object);
    let memory_enabled = memory_flag(&object);

    if before.is_explicit() && !force {
        return Plan {
            path: path.to_path_buf(),
            user_id,
            workspace_id,
            name,
            after: before.clone(),
            before,
            memory_enabled,
            status: PlanStatus::AlreadyExplicit,
        };
    }

    let extensions = planned_extensions(&before, memory_enabled, include_todos, force);
    let after = ExtensionState::explicit(extensions);
    let status = if !before.is_explicit() || before.extensions != after.extensions {
        PlanStatus::Migrate
    } else {
        PlanStatus::NoOp
    };

    Plan {
        path: path.to_path_buf(),
        user_id,
        workspace_id,
        name,
        before,
        after,
        memory_enabled,
        status,
    }
}

/// Current `extensionMode` (strings only) and normalized `extensions`.
pub fn before_state(object: &WorkspaceObject) -> ExtensionState {
    ExtensionState {
        mode: object
            .get("extensionMode")
            .and_then(Value::as_str)
            .map(str::to_string),
        extensions: ExtensionSet::normalize(object.get("extensions")),
    }
}

/// Legacy `memoryEnabled` flag under loose truthiness; absent means off.
pub fn memory_flag(object: &WorkspaceObject) -> bool {
    object.get("memoryEnabled").is_some_and(is_truthy)
}

fn display_name(object: &WorkspaceObject, workspace_id: &str) -> String {
    match object.get("name") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        Some(value) if is_truthy(value) => value.to_string(),
        _ => workspace_id.to_string(),
    }
}

fn planned_extensions(
    before: &ExtensionState,
    memory_enabled: bool,
    include_todos: bool,
    force: bool,
) -> ExtensionSet {
    // First migration discards any stale partial list; --force recomputes on top of it.
    let mut extensions = if force {
        before.extensions.clone()
    } else {
        ExtensionSet::new()
    };

    if memory_enabled {
        extensions.insert(MEMORY_EXTENSION);
    }

    if include_todos {
        extensions.insert(TODOS_EXTENSION);
    }

    extensions
}
