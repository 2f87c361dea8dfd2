//! Structural validation of taxonomy documents
//!
//! Version 1 documents only need usable seed examples. Version 2 documents
//! are checked against a closed schema per taxonomy kind.

use std::sync::OnceLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::domain::entities::{RuleViolation, TaxonomyKind};

pub const SCHEMA: &str = "schema";

/// Highest schema version this validator understands.
pub const MAX_VERSION: u64 = 2;

/// Seed examples a version 2 document must carry.
pub const MIN_SEED_EXAMPLES: usize = 5;

const SKILL_KEYS: &[&str] = &["version", "task_description", "created_by", "seed_examples"];
const KNOWLEDGE_KEYS: &[&str] = &[
    "version",
    "task_description",
    "created_by",
    "domain",
    "seed_examples",
    "document",
];
const SEED_EXAMPLE_KEYS: &[&str] = &["question", "answer", "context"];
const DOCUMENT_KEYS: &[&str] = &["repo", "commit", "patterns"];

fn commit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{7,40}$").expect("valid commit regex"))
}

/// Read the declared schema version; absent means version 1.
pub fn document_version(doc: &Value) -> Result<u64, RuleViolation> {
    match doc.get("version") {
        None => Ok(1),
        Some(Value::Number(n)) => n.as_u64().filter(|v| *v >= 1).ok_or_else(|| {
            RuleViolation::error(SCHEMA, format!("version must be a positive integer, got {n}"))
        }),
        Some(other) => Err(RuleViolation::error(
            SCHEMA,
            format!("version must be an integer, got {}", describe(other)),
        )),
    }
}

/// Count seed examples without validating them.
pub fn seed_example_count(doc: &Value) -> usize {
    doc.get("seed_examples")
        .and_then(Value::as_sequence)
        .map(Vec::len)
        .unwrap_or(0)
}

/// Validate a parsed document for the given kind and version.
pub fn validate(doc: &Value, kind: TaxonomyKind, version: u64) -> Vec<RuleViolation> {
    let mut violations = Vec::new();
    let Some(map) = doc.as_mapping() else {
        violations.push(RuleViolation::error(
            SCHEMA,
            format!("document must be a mapping, got {}", describe(doc)),
        ));
        return violations;
    };

    if version > MAX_VERSION {
        violations.push(RuleViolation::error(
            SCHEMA,
            format!("unsupported version {version} (max {MAX_VERSION})"),
        ));
        return violations;
    }

    if version == 1 {
        check_seed_examples(map, 1, false, &mut violations);
        return violations;
    }

    let allowed = match kind {
        TaxonomyKind::Skill => SKILL_KEYS,
        TaxonomyKind::Knowledge => KNOWLEDGE_KEYS,
    };
    check_keys(map, allowed, "", &mut violations);

    for key in allowed
        .iter()
        .filter(|k| !matches!(**k, "version" | "seed_examples" | "document"))
    {
        check_required_string(map, key, "", &mut violations);
    }
    check_seed_examples(map, MIN_SEED_EXAMPLES, true, &mut violations);

    if kind == TaxonomyKind::Knowledge {
        check_document(map, &mut violations);
    }

    violations
}

fn check_keys(map: &Mapping, allowed: &[&str], prefix: &str, out: &mut Vec<RuleViolation>) {
    for key in map.keys() {
        match key.as_str() {
            Some(name) if allowed.contains(&name) => {}
            Some(name) => out.push(RuleViolation::error(
                SCHEMA,
                format!("unexpected property '{prefix}{name}'"),
            )),
            None => out.push(RuleViolation::error(
                SCHEMA,
                format!("property names must be strings, got {}", describe(key)),
            )),
        }
    }
}

fn check_required_string(map: &Mapping, key: &str, prefix: &str, out: &mut Vec<RuleViolation>) {
    match map.get(key) {
        None | Some(Value::Null) => out.push(RuleViolation::error(
            SCHEMA,
            format!("'{prefix}{key}' is a required property"),
        )),
        Some(Value::String(s)) if s.trim().is_empty() => out.push(RuleViolation::error(
            SCHEMA,
            format!("'{prefix}{key}' must not be empty"),
        )),
        Some(Value::String(_)) => {}
        Some(other) => out.push(RuleViolation::error(
            SCHEMA,
            format!("'{prefix}{key}' must be a string, got {}", describe(other)),
        )),
    }
}

fn check_seed_examples(map: &Mapping, min: usize, closed: bool, out: &mut Vec<RuleViolation>) {
    let examples = match map.get("seed_examples") {
        None | Some(Value::Null) => {
            out.push(RuleViolation::error(
                SCHEMA,
                "'seed_examples' is a required property",
            ));
            return;
        }
        Some(Value::Sequence(seq)) => seq,
        Some(other) => {
            out.push(RuleViolation::error(
                SCHEMA,
                format!("'seed_examples' must be a list, got {}", describe(other)),
            ));
            return;
        }
    };

    if examples.len() < min {
        out.push(RuleViolation::error(
            SCHEMA,
            format!(
                "'seed_examples' needs at least {min} items, found {}",
                examples.len()
            ),
        ));
    }

    for (idx, example) in examples.iter().enumerate() {
        let prefix = format!("seed_examples[{idx}].");
        let Some(example) = example.as_mapping() else {
            out.push(RuleViolation::error(
                SCHEMA,
                format!("'seed_examples[{idx}]' must be a mapping"),
            ));
            continue;
        };
        if closed {
            check_keys(example, SEED_EXAMPLE_KEYS, &prefix, out);
        }
        check_required_string(example, "question", &prefix, out);
        check_required_string(example, "answer", &prefix, out);
        if let Some(context) = example.get("context") {
            if !context.is_string() {
                out.push(RuleViolation::error(
                    SCHEMA,
                    format!("'{prefix}context' must be a string, got {}", describe(context)),
                ));
            }
        }
    }
}

fn check_document(map: &Mapping, out: &mut Vec<RuleViolation>) {
    let document = match map.get("document") {
        None | Some(Value::Null) => {
            out.push(RuleViolation::error(SCHEMA, "'document' is a required property"));
            return;
        }
        Some(Value::Mapping(m)) => m,
        Some(other) => {
            out.push(RuleViolation::error(
                SCHEMA,
                format!("'document' must be a mapping, got {}", describe(other)),
            ));
            return;
        }
    };

    check_keys(document, DOCUMENT_KEYS, "document.", out);
    check_required_string(document, "repo", "document.", out);
    check_required_string(document, "commit", "document.", out);
    if let Some(Value::String(commit)) = document.get("commit") {
        if !commit.trim().is_empty() && !commit_pattern().is_match(commit) {
            out.push(RuleViolation::error(
                SCHEMA,
                format!("'document.commit' is not a commit SHA: {commit}"),
            ));
        }
    }

    match document.get("patterns") {
        None | Some(Value::Null) => out.push(RuleViolation::error(
            SCHEMA,
            "'document.patterns' is a required property",
        )),
        Some(Value::Sequence(patterns)) => {
            if patterns.is_empty() {
                out.push(RuleViolation::error(
                    SCHEMA,
                    "'document.patterns' needs at least 1 item",
                ));
            }
            if patterns.iter().any(|p| !p.is_string()) {
                out.push(RuleViolation::error(
                    SCHEMA,
                    "'document.patterns' items must be strings",
                ));
            }
        }
        Some(other) => out.push(RuleViolation::error(
            SCHEMA,
            format!("'document.patterns' must be a list, got {}", describe(other)),
        )),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
