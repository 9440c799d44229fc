use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

/// `extensionMode` value marking a workspace whose `extensions` list is authoritative.
pub const EXPLICIT_MODE: &str = "explicit";
pub const MEMORY_EXTENSION: &str = "memory";
pub const TODOS_EXTENSION: &str = "todos";

/// Ordered, duplicate-free list of extension names.
///
/// Order is significant: it is the order extensions are enabled downstream,
/// so the first occurrence of a name wins and keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtensionSet(Vec<String>);

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce an arbitrary JSON value to a canonical extension set.
    ///
    /// Anything that is not an array yields the empty set. Non-string items
    /// are dropped, strings are trimmed, and blanks and repeats are skipped.
    pub fn normalize(value: Option<&Value>) -> Self {
        let Some(Value::Array(items)) = value else {
            return Self::new();
        };

        let mut set = Self::new();
        for item in items {
            if let Value::String(name) = item {
                set.insert(name);
            }
        }
        set
    }

    /// Append `name` (trimmed) unless it is blank or already present.
    /// Returns whether the set grew.
    pub fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|existing| existing == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.0.iter().cloned().map(Value::String).collect())
    }
}

impl std::fmt::Display for ExtensionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Why a workspace file was left out of the apply phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    ParseError,
    InvalidJsonRoot,
    AlreadyExplicit,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "parse-error",
            Self::InvalidJsonRoot => "invalid-json-root",
            Self::AlreadyExplicit => "already-explicit",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a workspace file could not be planned at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    ParseError,
    InvalidJsonRoot,
}

impl From<PlanError> for SkipReason {
    fn from(kind: PlanError) -> Self {
        match kind {
            PlanError::ParseError => Self::ParseError,
            PlanError::InvalidJsonRoot => Self::InvalidJsonRoot,
        }
    }
}

/// Classification of a single plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStatus {
    /// The file must be rewritten.
    Migrate,
    /// Recomputed state matches what is already on disk.
    NoOp,
    /// Already migrated and not forced.
    AlreadyExplicit,
    /// The file could not be read as a workspace object.
    Error { kind: PlanError, message: String },
}

/// `extensionMode` + `extensions` pair on either side of a migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionState {
    pub mode: Option<String>,
    pub extensions: ExtensionSet,
}

impl ExtensionState {
    pub fn explicit(extensions: ExtensionSet) -> Self {
        Self {
            mode: Some(EXPLICIT_MODE.to_string()),
            extensions,
        }
    }

    pub fn is_explicit(&self) -> bool {
        self.mode.as_deref() == Some(EXPLICIT_MODE)
    }
}

/// Computed before/after transformation for one workspace file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub path: PathBuf,
    pub user_id: String,
    pub workspace_id: String,
    pub name: String,
    pub before: ExtensionState,
    pub after: ExtensionState,
    /// Legacy `memoryEnabled` flag as read when planning.
    pub memory_enabled: bool,
    pub status: PlanStatus,
}

impl Plan {
    pub fn changed(&self) -> bool {
        self.status == PlanStatus::Migrate
    }

    pub fn skipped(&self) -> bool {
        matches!(
            self.status,
            PlanStatus::AlreadyExplicit | PlanStatus::Error { .. }
        )
    }

    pub fn reason(&self) -> Option<SkipReason> {
        match &self.status {
            PlanStatus::AlreadyExplicit => Some(SkipReason::AlreadyExplicit),
            PlanStatus::Error { kind, .. } => Some((*kind).into()),
            PlanStatus::Migrate | PlanStatus::NoOp => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            PlanStatus::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Plans that the apply engine will write.
    pub fn is_pending_write(&self) -> bool {
        self.changed() && !self.skipped()
    }
}

/// Truthiness of a decoded JSON value, as used for legacy flags.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
