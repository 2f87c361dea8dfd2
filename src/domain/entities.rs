//! Domain entities: core data structures

use std::fmt;
use std::path::{Component, Path, PathBuf};

use itertools::Itertools;

/// Top-level taxonomy directories that hold content files.
pub const TAXONOMY_FOLDERS: [&str; 2] = ["compositional_skills", "knowledge"];

/// Extension every taxonomy content file must carry (lowercase, exact).
pub const TAXONOMY_EXTENSION: &str = "yaml";

/// How serious a rule violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single schema or lint finding for a taxonomy file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    /// Rule identifier, e.g. `line-length` or `schema`
    pub rule: String,
    /// 1-based line number, when the rule is line-oriented
    pub line: Option<usize>,
    pub message: String,
    pub severity: Severity,
}

impl RuleViolation {
    pub fn error(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            line: None,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(rule, message)
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "{}: [{}] {} ({})",
                line, self.severity, self.message, self.rule
            ),
            None => write!(f, "[{}] {} ({})", self.severity, self.message, self.rule),
        }
    }
}

/// Kind of taxonomy content, derived from where a file lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyKind {
    /// `compositional_skills/**`
    Skill,
    /// `knowledge/**`
    Knowledge,
}

impl TaxonomyKind {
    /// Files below any `knowledge` directory are knowledge, everything else a skill.
    pub fn from_path(path: &Path) -> Self {
        let in_knowledge = path
            .components()
            .any(|c| matches!(c, Component::Normal(name) if name == "knowledge"));
        if in_knowledge {
            TaxonomyKind::Knowledge
        } else {
            TaxonomyKind::Skill
        }
    }
}

/// Outcome of validating one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Valid,
    /// Not usable but not an error (wrong extension, empty document)
    Skipped,
    Invalid,
}

/// A validated unit of taxonomy content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyEntry {
    /// Repository-relative path (e.g. `compositional_skills/writing/qna.yaml`)
    pub path: PathBuf,
    pub kind: TaxonomyKind,
    /// Schema version declared by the document (1 when absent)
    pub version: u64,
    /// Number of seed examples read from the document
    pub seed_examples: usize,
    pub skipped: bool,
    pub violations: Vec<RuleViolation>,
}

impl TaxonomyEntry {
    pub fn new(path: PathBuf) -> Self {
        let kind = TaxonomyKind::from_path(&path);
        Self {
            path,
            kind,
            version: 1,
            seed_examples: 0,
            skipped: false,
            violations: Vec::new(),
        }
    }

    /// Mark the entry as skipped, recording why as a warning.
    pub fn skip(mut self, rule: &str, message: impl Into<String>) -> Self {
        self.skipped = true;
        self.violations.push(RuleViolation::warning(rule, message));
        self
    }

    pub fn warnings(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
            .count()
    }

    pub fn errors(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count()
    }

    pub fn status(&self) -> EntryStatus {
        if self.errors() > 0 {
            EntryStatus::Invalid
        } else if self.skipped {
            EntryStatus::Skipped
        } else {
            EntryStatus::Valid
        }
    }
}

/// Taxonomy files changed relative to a base ref.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Base git reference the diff was computed against
    pub base: String,
    /// Repository-relative paths, sorted and de-duplicated
    pub files: Vec<PathBuf>,
}

impl DiffResult {
    pub fn new(base: impl Into<String>, files: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            base: base.into(),
            files: files.into_iter().sorted().dedup().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

/// All entries read during one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub entries: Vec<TaxonomyEntry>,
}

impl ValidationReport {
    pub fn total_warnings(&self) -> usize {
        self.entries.iter().map(TaxonomyEntry::warnings).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.entries.iter().map(TaxonomyEntry::errors).sum()
    }

    /// Number of entries carrying at least one error.
    pub fn invalid_entries(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status() == EntryStatus::Invalid)
            .count()
    }

    pub fn seed_examples(&self) -> usize {
        self.entries.iter().map(|e| e.seed_examples).sum()
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_entries() == 0
    }
}

/// Check whether a repository-relative path is taxonomy content.
///
/// Content lives below one of [`TAXONOMY_FOLDERS`] and ends in `.yaml`.
pub fn is_taxonomy_file(relative: &Path) -> bool {
    let top_level = match relative.components().next() {
        Some(Component::Normal(name)) => name.to_string_lossy(),
        _ => return false,
    };
    TAXONOMY_FOLDERS.contains(&&*top_level)
        && relative
            .extension()
            .is_some_and(|ext| ext == TAXONOMY_EXTENSION)
}

/// Path of a taxonomy file relative to its taxonomy root.
///
/// Searches from the end for the last component naming a taxonomy folder;
/// falls back to the file name when the file is outside any taxonomy tree.
pub fn taxonomy_relative_path(path: &Path) -> PathBuf {
    let components: Vec<Component> = path.components().collect();
    let root = components.iter().rposition(|c| {
        matches!(c, Component::Normal(name)
            if TAXONOMY_FOLDERS.iter().any(|folder| name == folder))
    });
    match root {
        Some(idx) => components[idx..].iter().collect(),
        None => path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf()),
    }
}

/// Expand environment variables in a path string.
///
/// Supports:
/// - `$VAR` syntax
/// - `${VAR}` syntax
/// - `~` for home directory
///
/// Uses shellexpand crate for robust expansion.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Expand `~`/`$VAR` and make the result absolute against `cwd`.
///
/// `.` and `..` components are resolved lexically; the path need not exist.
pub fn expand_path(path: &str, cwd: &Path) -> PathBuf {
    let expanded = PathBuf::from(expand_env_vars(path));
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };
    normalize(&absolute)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
