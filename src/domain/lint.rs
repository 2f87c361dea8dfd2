//! YAML lint rules for taxonomy files
//!
//! Rules files use the yamllint layout:
//!
//! ```yaml
//! extends: relaxed
//! rules:
//!   line-length:
//!     max: 100
//!   trailing-spaces: disable
//! ```
//!
//! Unlisted rules keep their defaults. Violations are errors unless a rule
//! sets `level: warning`.

use serde_yaml::Value;

use crate::domain::entities::{RuleViolation, Severity};
use crate::domain::DomainError;

pub const LINE_LENGTH: &str = "line-length";
pub const TRAILING_SPACES: &str = "trailing-spaces";
pub const NEW_LINE_AT_END_OF_FILE: &str = "new-line-at-end-of-file";
pub const EMPTY_LINES: &str = "empty-lines";

const DEFAULT_MAX_LINE_LENGTH: usize = 120;
const DEFAULT_MAX_EMPTY_LINES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineLength {
    pub max: usize,
    /// Lines whose only content is one unbreakable word (e.g. a URL) pass
    pub allow_non_breakable_words: bool,
    pub level: Severity,
}

impl Default for LineLength {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX_LINE_LENGTH,
            allow_non_breakable_words: true,
            level: Severity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyLines {
    pub max: usize,
    pub level: Severity,
}

impl Default for EmptyLines {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX_EMPTY_LINES,
            level: Severity::Error,
        }
    }
}

/// Active lint configuration. `None` disables a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintRules {
    pub line_length: Option<LineLength>,
    pub trailing_spaces: Option<Severity>,
    pub new_line_at_end_of_file: Option<Severity>,
    pub empty_lines: Option<EmptyLines>,
    /// Rule names present in the rules file that this linter does not know
    pub unknown: Vec<String>,
}

impl Default for LintRules {
    fn default() -> Self {
        Self {
            line_length: Some(LineLength::default()),
            trailing_spaces: Some(Severity::Error),
            new_line_at_end_of_file: Some(Severity::Error),
            empty_lines: Some(EmptyLines::default()),
            unknown: Vec::new(),
        }
    }
}

/// Parsed value of one `rules:` entry.
enum RuleSetting<'a> {
    Disabled,
    Enabled,
    Options(&'a serde_yaml::Mapping),
}

fn rule_setting<'a>(name: &str, value: &'a Value) -> Result<RuleSetting<'a>, DomainError> {
    match value {
        Value::String(s) if s == "disable" => Ok(RuleSetting::Disabled),
        Value::String(s) if s == "enable" => Ok(RuleSetting::Enabled),
        Value::Bool(false) => Ok(RuleSetting::Disabled),
        Value::Bool(true) | Value::Null => Ok(RuleSetting::Enabled),
        Value::Mapping(m) => Ok(RuleSetting::Options(m)),
        other => Err(DomainError::InvalidLintRules {
            message: format!("rule '{name}' has unsupported value: {other:?}"),
        }),
    }
}

fn option_usize(
    rule: &str,
    options: &serde_yaml::Mapping,
    key: &str,
) -> Result<Option<usize>, DomainError> {
    match options.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|v| Some(v as usize))
            .ok_or_else(|| DomainError::InvalidLintRules {
                message: format!("{rule}.{key} must be a non-negative integer"),
            }),
        Some(other) => Err(DomainError::InvalidLintRules {
            message: format!("{rule}.{key} must be an integer, got {other:?}"),
        }),
    }
}

fn option_bool(
    rule: &str,
    options: &serde_yaml::Mapping,
    key: &str,
) -> Result<Option<bool>, DomainError> {
    match options.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(DomainError::InvalidLintRules {
            message: format!("{rule}.{key} must be a boolean, got {other:?}"),
        }),
    }
}

fn option_level(
    rule: &str,
    options: &serde_yaml::Mapping,
    default: Severity,
) -> Result<Severity, DomainError> {
    match options.get("level") {
        None => Ok(default),
        Some(Value::String(s)) if s == "error" => Ok(Severity::Error),
        Some(Value::String(s)) if s == "warning" => Ok(Severity::Warning),
        Some(other) => Err(DomainError::InvalidLintRules {
            message: format!("{rule}.level must be 'error' or 'warning', got {other:?}"),
        }),
    }
}

impl LintRules {
    /// Build rules from a yamllint-style rules document, starting from defaults.
    pub fn from_yaml(content: &str) -> Result<Self, DomainError> {
        let doc: Value =
            serde_yaml::from_str(content).map_err(|e| DomainError::InvalidLintRules {
                message: e.to_string(),
            })?;

        let mut rules = Self::default();
        let entries = match doc.get("rules") {
            None | Some(Value::Null) => return Ok(rules),
            Some(Value::Mapping(m)) => m,
            Some(_) => {
                return Err(DomainError::InvalidLintRules {
                    message: "'rules' must be a mapping".to_string(),
                })
            }
        };

        for (key, value) in entries {
            let name = key.as_str().ok_or_else(|| DomainError::InvalidLintRules {
                message: format!("rule name must be a string, got {key:?}"),
            })?;
            let setting = rule_setting(name, value)?;
            match name {
                LINE_LENGTH => rules.line_length = Self::line_length(setting)?,
                TRAILING_SPACES => {
                    rules.trailing_spaces = Self::level_only(name, setting)?;
                }
                NEW_LINE_AT_END_OF_FILE => {
                    rules.new_line_at_end_of_file = Self::level_only(name, setting)?;
                }
                EMPTY_LINES => rules.empty_lines = Self::empty_lines(setting)?,
                other => rules.unknown.push(other.to_string()),
            }
        }
        Ok(rules)
    }

    fn line_length(setting: RuleSetting<'_>) -> Result<Option<LineLength>, DomainError> {
        let default = LineLength::default();
        match setting {
            RuleSetting::Disabled => Ok(None),
            RuleSetting::Enabled => Ok(Some(default)),
            RuleSetting::Options(opts) => Ok(Some(LineLength {
                max: option_usize(LINE_LENGTH, opts, "max")?.unwrap_or(default.max),
                allow_non_breakable_words: option_bool(
                    LINE_LENGTH,
                    opts,
                    "allow-non-breakable-words",
                )?
                .unwrap_or(default.allow_non_breakable_words),
                level: option_level(LINE_LENGTH, opts, default.level)?,
            })),
        }
    }

    fn empty_lines(setting: RuleSetting<'_>) -> Result<Option<EmptyLines>, DomainError> {
        let default = EmptyLines::default();
        match setting {
            RuleSetting::Disabled => Ok(None),
            RuleSetting::Enabled => Ok(Some(default)),
            RuleSetting::Options(opts) => Ok(Some(EmptyLines {
                max: option_usize(EMPTY_LINES, opts, "max")?.unwrap_or(default.max),
                level: option_level(EMPTY_LINES, opts, default.level)?,
            })),
        }
    }

    fn level_only(name: &str, setting: RuleSetting<'_>) -> Result<Option<Severity>, DomainError> {
        match setting {
            RuleSetting::Disabled => Ok(None),
            RuleSetting::Enabled => Ok(Some(Severity::Error)),
            RuleSetting::Options(opts) => Ok(Some(option_level(name, opts, Severity::Error)?)),
        }
    }

    /// Lint raw file content, returning violations in line order.
    pub fn lint(&self, content: &str) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        let mut blank_run = 0usize;

        for (idx, line) in content.lines().enumerate() {
            let lineno = idx + 1;

            if let Some(rule) = &self.line_length {
                let len = line.chars().count();
                if len > rule.max
                    && !(rule.allow_non_breakable_words && is_non_breakable(line))
                {
                    violations.push(
                        RuleViolation::error(
                            LINE_LENGTH,
                            format!("line too long ({} > {} characters)", len, rule.max),
                        )
                        .at_line(lineno)
                        .with_severity(rule.level),
                    );
                }
            }

            if let Some(level) = self.trailing_spaces {
                if line.ends_with(' ') || line.ends_with('\t') {
                    violations.push(
                        RuleViolation::error(TRAILING_SPACES, "trailing spaces")
                            .at_line(lineno)
                            .with_severity(level),
                    );
                }
            }

            if line.trim().is_empty() {
                blank_run += 1;
            } else {
                self.check_blank_run(blank_run, lineno - 1, &mut violations);
                blank_run = 0;
            }
        }

        let last_line = content.lines().count();
        self.check_blank_run(blank_run, last_line, &mut violations);

        if let Some(level) = self.new_line_at_end_of_file {
            if !content.is_empty() && !content.ends_with('\n') {
                violations.push(
                    RuleViolation::error(
                        NEW_LINE_AT_END_OF_FILE,
                        "no new line character at the end of file",
                    )
                    .at_line(last_line)
                    .with_severity(level),
                );
            }
        }

        violations
    }

    fn check_blank_run(&self, run: usize, end_line: usize, out: &mut Vec<RuleViolation>) {
        if let Some(rule) = &self.empty_lines {
            if run > rule.max {
                out.push(
                    RuleViolation::error(
                        EMPTY_LINES,
                        format!("too many blank lines ({} > {})", run, rule.max),
                    )
                    .at_line(end_line)
                    .with_severity(rule.level),
                );
            }
        }
    }
}

/// A line holding a single word after indentation, list dash or comment marker.
fn is_non_breakable(line: &str) -> bool {
    let rest = line.trim_start();
    let rest = rest
        .strip_prefix("- ")
        .or_else(|| rest.strip_prefix("# "))
        .unwrap_or(rest)
        .trim_start();
    !rest.is_empty() && !rest.contains(' ')
}
