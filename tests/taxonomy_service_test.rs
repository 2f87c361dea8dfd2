//! Tests for TaxonomyService (diff + validation against real git repositories)

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use common::{skill_yaml, write_file, TaxonomyRepo};
use ilab::application::services::TaxonomyService;
use ilab::application::ApplicationError;
use ilab::domain::{EntryStatus, LintRules};
use ilab::infrastructure::git::{Git2Differ, GitError};
use ilab::infrastructure::traits::RealFileSystem;

fn service() -> TaxonomyService {
    ilab::util::testing::init_test_setup();
    TaxonomyService::new(Arc::new(RealFileSystem), Arc::new(Git2Differ))
}

#[test]
fn given_clean_checkout_when_diffing_then_no_changes() {
    let repo = TaxonomyRepo::new();

    let diff = service().diff(repo.path(), "origin/main").unwrap();

    assert!(diff.is_empty());
    assert_eq!(diff.base, "origin/main");
}

#[test]
fn given_untracked_and_modified_files_when_diffing_then_lists_taxonomy_files_sorted() {
    // Arrange
    let repo = TaxonomyRepo::new();
    repo.write("knowledge/history/qna.yaml", &skill_yaml(5));
    repo.write("compositional_skills/new/deep/qna.yaml", &skill_yaml(5));
    repo.write(
        "compositional_skills/base/qna.yaml",
        &skill_yaml(6),
    );
    repo.write("compositional_skills/new/notes.txt", "not taxonomy\n");
    repo.write("docs/qna.yaml", &skill_yaml(5));

    // Act
    let diff = service().diff(repo.path(), "origin/main").unwrap();

    // Assert
    assert_eq!(
        diff.files,
        vec![
            PathBuf::from("compositional_skills/base/qna.yaml"),
            PathBuf::from("compositional_skills/new/deep/qna.yaml"),
            PathBuf::from("knowledge/history/qna.yaml"),
        ]
    );
}

#[test]
fn given_committed_change_on_top_of_base_when_diffing_then_listed() {
    let repo = TaxonomyRepo::new();
    repo.write("compositional_skills/extra/qna.yaml", &skill_yaml(5));
    repo.commit_all("add extra skill");

    let diff = service().diff(repo.path(), "origin/main").unwrap();

    assert_eq!(
        diff.files,
        vec![PathBuf::from("compositional_skills/extra/qna.yaml")]
    );
}

#[test]
fn given_upstream_merged_into_branch_when_diffing_then_only_own_changes_listed() {
    // Arrange: origin/main moves ahead, then gets merged into the feature branch
    let repo = TaxonomyRepo::new();
    let fork_point = repo.repo.head().unwrap().target().unwrap();
    repo.write("compositional_skills/upstream/qna.yaml", &skill_yaml(5));
    let upstream = repo.commit_all("upstream skill");
    repo.set_origin_main(upstream);

    repo.reset_hard(fork_point);
    repo.write("compositional_skills/mine/qna.yaml", &skill_yaml(5));
    repo.commit_all("my skill");
    repo.write("compositional_skills/upstream/qna.yaml", &skill_yaml(5));
    repo.commit_all_merging("merge origin/main", &[upstream]);

    // Act
    let diff = service().diff(repo.path(), "origin/main").unwrap();

    // Assert
    assert_eq!(
        diff.files,
        vec![PathBuf::from("compositional_skills/mine/qna.yaml")]
    );
}

#[test]
fn given_deleted_taxonomy_file_when_diffing_then_not_listed() {
    let repo = TaxonomyRepo::new();
    std::fs::remove_file(repo.path().join("compositional_skills/base/qna.yaml")).unwrap();

    let diff = service().diff(repo.path(), "origin/main").unwrap();

    assert!(diff.is_empty());
}

#[rstest]
#[case("main")]
#[case("HEAD")]
fn given_local_branch_or_commitish_base_when_diffing_then_resolves(#[case] base: &str) {
    let repo = TaxonomyRepo::new();
    repo.write("knowledge/new/qna.yaml", &skill_yaml(5));

    let diff = service().diff(repo.path(), base).unwrap();

    assert_eq!(diff.files, vec![PathBuf::from("knowledge/new/qna.yaml")]);
}

#[test]
fn given_unknown_base_when_diffing_then_base_not_found() {
    let repo = TaxonomyRepo::new();

    let err = service().diff(repo.path(), "upstream/nope").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Git(GitError::BaseNotFound { .. })
    ));
    assert_eq!(
        err.to_string(),
        "couldn't find the taxonomy git ref \"upstream/nope\" from the current HEAD"
    );
}

#[test]
fn given_missing_path_when_diffing_then_taxonomy_not_found() {
    let temp = TempDir::new().unwrap();

    let err = service()
        .diff(&temp.path().join("missing"), "origin/main")
        .unwrap_err();

    assert!(matches!(err, ApplicationError::TaxonomyNotFound(_)));
}

#[test]
fn given_valid_changes_when_validating_then_report_counts_seed_examples() {
    let repo = TaxonomyRepo::new();
    repo.write("compositional_skills/new/qna.yaml", &skill_yaml(7));

    let report = service()
        .validate(repo.path(), "origin/main", &LintRules::default())
        .unwrap();

    assert!(report.is_valid());
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.seed_examples(), 7);
}

#[test]
fn given_two_invalid_files_when_validating_directory_then_counts_files_with_errors() {
    // Arrange
    let repo = TaxonomyRepo::new();
    repo.write("compositional_skills/few/qna.yaml", &skill_yaml(2));
    repo.write(
        "compositional_skills/nocreator/qna.yaml",
        &skill_yaml(5).replace("created_by: tester\n", ""),
    );
    repo.write("compositional_skills/ok/qna.yaml", &skill_yaml(5));

    // Act
    let err = service()
        .validate(repo.path(), "origin/main", &LintRules::default())
        .unwrap_err();

    // Assert
    let ApplicationError::InvalidTaxonomy { message, report } = err else {
        panic!("expected invalid taxonomy, got {err:?}");
    };
    assert_eq!(message, "2 taxonomy files with errors! Exiting.");
    assert_eq!(report.invalid_entries(), 2);
    assert_eq!(report.entries.len(), 3);
}

#[test]
fn given_unresolvable_base_when_validating_directory_then_fails() {
    let repo = TaxonomyRepo::new();

    let err = service()
        .validate(repo.path(), "origin/missing", &LintRules::default())
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Git(GitError::BaseNotFound { .. })));
}

#[test]
fn given_single_invalid_file_when_validating_then_single_file_message() {
    let temp = TempDir::new().unwrap();
    let file = write_file(temp.path(), "qna.yaml", &skill_yaml(1));

    let err = service()
        .validate(&file, "ignored", &LintRules::default())
        .unwrap_err();

    assert_eq!(err.to_string(), "Taxonomy file with errors! Exiting.");
}

#[test]
fn given_single_file_outside_repo_when_validating_then_base_is_ignored() {
    let temp = TempDir::new().unwrap();
    let file = write_file(temp.path(), "compositional_skills/a/qna.yaml", &skill_yaml(5));

    let report = service()
        .validate(&file, "no/such/ref", &LintRules::default())
        .unwrap();

    assert_eq!(
        report.entries[0].path,
        PathBuf::from("compositional_skills/a/qna.yaml")
    );
}

#[rstest]
#[case("qna.yml")]
#[case("qna.YAML")]
fn given_wrong_extension_when_reading_then_skipped_with_warning(#[case] name: &str) {
    let temp = TempDir::new().unwrap();
    let file = write_file(temp.path(), name, &skill_yaml(5));

    let entry = service().read_file(&file, Path::new(name), &LintRules::default());

    assert_eq!(entry.status(), EntryStatus::Skipped);
    assert_eq!(entry.warnings(), 1);
    assert!(entry.violations[0].message.contains("lowercase '.yaml'"));
}

#[rstest]
#[case("")]
#[case("\n\n")]
#[case("# only a comment\n")]
fn given_empty_document_when_reading_then_skipped(#[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let file = write_file(temp.path(), "qna.yaml", content);

    let entry = service().read_file(&file, Path::new("qna.yaml"), &LintRules::default());

    assert_eq!(entry.status(), EntryStatus::Skipped);
}

#[test]
fn given_malformed_yaml_when_reading_then_syntax_error_with_line() {
    let temp = TempDir::new().unwrap();
    let file = write_file(
        temp.path(),
        "qna.yaml",
        "version: 2\nseed_examples:\n  - question: [unclosed\n",
    );

    let entry = service().read_file(&file, Path::new("qna.yaml"), &LintRules::default());

    assert_eq!(entry.status(), EntryStatus::Invalid);
    assert_eq!(entry.violations[0].rule, "syntax");
    assert!(entry.violations[0].line.is_some());
}

#[test]
fn given_duplicate_keys_when_reading_then_syntax_error() {
    let temp = TempDir::new().unwrap();
    let file = write_file(
        temp.path(),
        "qna.yaml",
        &format!("created_by: someone\n{}", skill_yaml(5)),
    );

    let entry = service().read_file(&file, Path::new("qna.yaml"), &LintRules::default());

    assert_eq!(entry.status(), EntryStatus::Invalid);
    assert_eq!(entry.violations[0].rule, "syntax");
}

#[test]
fn given_version_two_with_trailing_spaces_when_reading_then_lint_error() {
    let temp = TempDir::new().unwrap();
    let content = skill_yaml(5).replace("created_by: tester\n", "created_by: tester   \n");
    let file = write_file(temp.path(), "qna.yaml", &content);

    let entry = service().read_file(&file, Path::new("qna.yaml"), &LintRules::default());

    assert_eq!(entry.errors(), 1);
    assert_eq!(entry.violations[0].rule, "trailing-spaces");
    assert_eq!(entry.violations[0].line, Some(3));
}

#[test]
fn given_version_one_when_reading_then_not_linted() {
    let temp = TempDir::new().unwrap();
    let file = write_file(
        temp.path(),
        "qna.yaml",
        "task_description: legacy   \nseed_examples:\n  - question: q\n    answer: a\n",
    );

    let entry = service().read_file(&file, Path::new("qna.yaml"), &LintRules::default());

    assert_eq!(entry.version, 1);
    assert_eq!(entry.status(), EntryStatus::Valid);
}

#[test]
fn given_no_rules_file_when_loading_rules_then_defaults() {
    let temp = TempDir::new().unwrap();
    let svc = service();

    assert_eq!(svc.load_rules(None).unwrap(), LintRules::default());
    assert_eq!(
        svc.load_rules(Some(&temp.path().join("missing.yaml")))
            .unwrap(),
        LintRules::default()
    );
}

#[test]
fn given_rules_file_disabling_trailing_spaces_when_validating_then_passes() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let rules_file = write_file(
        temp.path(),
        "rules.yaml",
        "extends: relaxed\nrules:\n  trailing-spaces: disable\n  line-length:\n    max: 200\n",
    );
    let content = skill_yaml(5).replace("created_by: tester\n", "created_by: tester  \n");
    let file = write_file(temp.path(), "qna.yaml", &content);
    let svc = service();

    // Act
    let rules = svc.load_rules(Some(&rules_file)).unwrap();
    let report = svc.validate(&file, "origin/main", &rules).unwrap();

    // Assert
    assert!(rules.trailing_spaces.is_none());
    assert!(report.is_valid());
}

#[test]
fn given_unparseable_rules_file_when_loading_rules_then_error() {
    let temp = TempDir::new().unwrap();
    let rules_file = write_file(temp.path(), "rules.yaml", "rules: [not, a, mapping]\n");

    let err = service().load_rules(Some(&rules_file)).unwrap_err();

    assert!(matches!(err, ApplicationError::Domain(_)));
}
