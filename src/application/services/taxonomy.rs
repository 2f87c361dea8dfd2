//! Taxonomy service
//!
//! Lists changed taxonomy files and validates them (lint + schema).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_yaml::Value;
use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    schema, taxonomy_relative_path, DiffResult, EntryStatus, LintRules, RuleViolation,
    TaxonomyEntry, ValidationReport, TAXONOMY_EXTENSION,
};
use crate::infrastructure::git::TaxonomyDiffer;
use crate::infrastructure::traits::FileSystem;

/// Service for diffing and validating a taxonomy tree or single file.
pub struct TaxonomyService {
    fs: Arc<dyn FileSystem>,
    differ: Arc<dyn TaxonomyDiffer>,
}

impl TaxonomyService {
    pub fn new(fs: Arc<dyn FileSystem>, differ: Arc<dyn TaxonomyDiffer>) -> Self {
        Self { fs, differ }
    }

    /// True if `path` names a single taxonomy file rather than a repository.
    pub fn is_single_file(&self, path: &Path) -> bool {
        self.fs.is_file(path)
    }

    /// Taxonomy files changed in the repository at `path` since `base`.
    #[instrument(level = "debug", skip(self))]
    pub fn diff(&self, path: &Path, base: &str) -> ApplicationResult<DiffResult> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::TaxonomyNotFound(path.to_path_buf()));
        }
        let diff = self.differ.changed_files(path, base)?;
        debug!("diff: {} changed taxonomy files", diff.len());
        Ok(diff)
    }

    /// Lint rules from a yamllint-style file, or the defaults.
    ///
    /// A rules file that does not exist falls back to the defaults.
    pub fn load_rules(&self, rules_file: Option<&Path>) -> ApplicationResult<LintRules> {
        let Some(rules_file) = rules_file else {
            return Ok(LintRules::default());
        };
        if !self.fs.exists(rules_file) {
            debug!(
                "load_rules: {} not found, using default rules",
                rules_file.display()
            );
            return Ok(LintRules::default());
        }

        let content = self
            .fs
            .read_to_string(rules_file)
            .with_path_context("read yaml rules", rules_file)?;
        let rules = LintRules::from_yaml(&content)?;
        for name in &rules.unknown {
            debug!("load_rules: ignoring unsupported rule '{}'", name);
        }
        Ok(rules)
    }

    /// Validate the taxonomy at `path`.
    ///
    /// A single file is validated directly. A directory is treated as a git
    /// repository and only files changed since `base` are validated.
    #[instrument(level = "debug", skip(self, rules))]
    pub fn validate(
        &self,
        path: &Path,
        base: &str,
        rules: &LintRules,
    ) -> ApplicationResult<ValidationReport> {
        let single = self.is_single_file(path);
        let entries = if single {
            vec![self.read_file(path, &taxonomy_relative_path(path), rules)]
        } else {
            self.diff(path, base)?
                .files
                .iter()
                .map(|relative| self.read_file(&path.join(relative), relative, rules))
                .collect()
        };

        let report = ValidationReport { entries };
        for entry in &report.entries {
            for violation in &entry.violations {
                if entry.status() == EntryStatus::Skipped {
                    warn!("{}: {}", entry.path.display(), violation.message);
                } else {
                    debug!("{}: {}", entry.path.display(), violation);
                }
            }
        }
        debug!(
            "validate: {} files, {} warnings, {} errors, {} seed examples",
            report.entries.len(),
            report.total_warnings(),
            report.total_errors(),
            report.seed_examples()
        );

        if report.is_valid() {
            return Ok(report);
        }
        let message = if single {
            "Taxonomy file with errors! Exiting.".to_string()
        } else {
            format!(
                "{} taxonomy files with errors! Exiting.",
                report.invalid_entries()
            )
        };
        Err(ApplicationError::InvalidTaxonomy {
            message,
            report: Box::new(report),
        })
    }

    /// Read and check one file; problems are recorded on the entry.
    pub fn read_file(&self, file: &Path, relative: &Path, rules: &LintRules) -> TaxonomyEntry {
        let mut entry = TaxonomyEntry::new(relative.to_path_buf());

        if file.extension().map_or(true, |ext| ext != TAXONOMY_EXTENSION) {
            let name = file_name(file);
            return entry.skip(
                "extension",
                format!("skipping {name}! Use lowercase '.{TAXONOMY_EXTENSION}' extension instead."),
            );
        }

        let content = match self.fs.read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                entry.violations.push(RuleViolation::error(
                    "read",
                    format!("cannot read {}: {e}", file.display()),
                ));
                return entry;
            }
        };
        if content.trim().is_empty() {
            return entry.skip("empty", format!("skipping empty file {}", file_name(file)));
        }

        let doc: Value = match serde_yaml::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                let violation = RuleViolation::error("syntax", e.to_string());
                entry.violations.push(match e.location() {
                    Some(location) => violation.at_line(location.line()),
                    None => violation,
                });
                return entry;
            }
        };
        if doc.is_null() {
            return entry.skip("empty", format!("skipping empty file {}", file_name(file)));
        }

        entry.version = match schema::document_version(&doc) {
            Ok(version) => version,
            Err(violation) => {
                entry.violations.push(violation);
                return entry;
            }
        };
        entry.seed_examples = schema::seed_example_count(&doc);

        if entry.version > 1 {
            entry.violations.extend(rules.lint(&content));
        }
        entry
            .violations
            .extend(schema::validate(&doc, entry.kind, entry.version));
        entry
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
