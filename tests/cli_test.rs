//! Binary-level tests: exit codes and stdout of the `ilab` commands

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use common::{skill_yaml, write_file, TaxonomyRepo};

fn ilab(cwd: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("ilab").expect("binary built");
    cmd.current_dir(cwd)
        .env("NO_COLOR", "1")
        .env_remove("ILAB_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn given_sysinfo_when_run_then_prints_one_line_per_key_in_order() {
    let temp = TempDir::new().unwrap();

    let output = ilab(temp.path()).arg("sysinfo").assert().success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let keys: Vec<&str> = stdout
        .lines()
        .map(|line| line.split(": ").next().unwrap_or_default())
        .collect();
    assert_eq!(
        keys,
        vec![
            "platform.node",
            "platform.system",
            "platform.family",
            "platform.release",
            "platform.machine",
            "platform.cpu_count",
            "ilab.version",
            "git.version",
            "gpu.nvidia",
        ]
    );
}

#[test]
fn given_malformed_config_when_sysinfo_then_still_succeeds() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "config.yaml", "generate: [unclosed\n");

    ilab(temp.path()).arg("sysinfo").assert().success();
}

#[test]
fn given_malformed_config_when_diff_then_config_exit_code() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "config.yaml", "generate: [unclosed\n");

    ilab(temp.path())
        .arg("diff")
        .assert()
        .code(78)
        .stderr(predicate::str::contains("config error"));
}

#[test]
fn given_changed_taxonomy_when_diff_then_lists_files_and_reports_valid() {
    let repo = TaxonomyRepo::new();
    repo.write("compositional_skills/new/qna.yaml", &skill_yaml(5));

    ilab(repo.path())
        .args(["diff", "--taxonomy-path", "."])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "compositional_skills/new/qna.yaml\n",
        ))
        .stdout(predicate::str::contains("Taxonomy in /./ is valid :)"));
}

#[test]
fn given_invalid_taxonomy_when_diff_quiet_then_exit_one_and_no_stdout() {
    let repo = TaxonomyRepo::new();
    repo.write("compositional_skills/bad/qna.yaml", &skill_yaml(2));

    ilab(repo.path())
        .args(["diff", "--quiet", "--taxonomy-path", "."])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn given_valid_taxonomy_when_diff_quiet_then_exit_zero_and_no_stdout() {
    let repo = TaxonomyRepo::new();
    repo.write("compositional_skills/good/qna.yaml", &skill_yaml(5));

    ilab(repo.path())
        .args(["diff", "--quiet", "--taxonomy-path", "."])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn given_invalid_taxonomy_when_diff_then_reports_error_count() {
    let repo = TaxonomyRepo::new();
    repo.write("compositional_skills/bad/qna.yaml", &skill_yaml(2));

    ilab(repo.path())
        .args(["diff", "--taxonomy-path", "."])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "Reading taxonomy failed with the following error: 1 taxonomy files with errors! Exiting.",
        ))
        .stdout(predicate::str::contains("needs at least 5 items"));
}

#[test]
fn given_single_file_when_diff_then_echoes_path_and_validates() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "qna.yaml", &skill_yaml(5));

    ilab(temp.path())
        .args(["diff", "--taxonomy-path", "qna.yaml"])
        .assert()
        .success()
        .stdout("qna.yaml\nTaxonomy in /qna.yaml/ is valid :)\n");
}

#[test]
fn given_invalid_single_file_when_diff_then_echoes_path_and_fails() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "qna.yaml", &skill_yaml(1));

    ilab(temp.path())
        .args(["diff", "--taxonomy-path", "qna.yaml"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("qna.yaml\n"))
        .stdout(predicate::str::contains("Taxonomy file with errors! Exiting."));
}

#[test]
fn given_unknown_base_when_diff_then_fails_before_validation() {
    let repo = TaxonomyRepo::new();

    ilab(repo.path())
        .args(["diff", "--taxonomy-path", ".", "--taxonomy-base", "origin/gone"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "couldn't find the taxonomy git ref \"origin/gone\" from the current HEAD",
        ))
        .stdout(predicate::str::contains("is valid").not());
}

#[test]
fn given_taxonomy_path_from_env_when_diff_then_used() {
    let repo = TaxonomyRepo::new();
    repo.write("knowledge/env/qna.yaml", &skill_yaml(1));
    let elsewhere = TempDir::new().unwrap();

    ilab(elsewhere.path())
        .args(["diff", "--quiet"])
        .env("ILAB_GENERATE__TAXONOMY_PATH", repo.path())
        .assert()
        .code(1);
}

#[test]
fn given_check_alias_when_invalid_then_quiet_failure_with_deprecation() {
    let repo = TaxonomyRepo::new();
    repo.write("compositional_skills/bad/qna.yaml", &skill_yaml(2));

    ilab(repo.path())
        .args(["check", "--taxonomy-path", "."])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("deprecated"));
}

#[test]
fn given_list_alias_when_run_then_behaves_like_diff() {
    let repo = TaxonomyRepo::new();
    repo.write("compositional_skills/new/qna.yaml", &skill_yaml(5));

    ilab(repo.path())
        .args(["list", "--taxonomy-path", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("compositional_skills/new/qna.yaml"))
        .stderr(predicate::str::contains("deprecated"));
}

#[test]
fn given_populated_taxonomy_when_init_non_interactive_then_writes_config() {
    // Arrange
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "tax/README.md", "# taxonomy\n");
    let model = temp.path().join("models/m");

    // Act
    ilab(temp.path())
        .args(["init", "--non-interactive", "--taxonomy-path", "tax"])
        .arg("--model-path")
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Initialization completed successfully",
        ));

    // Assert
    let settings = ilab::config::Settings::load(&temp.path().join("config.yaml")).unwrap();
    assert_eq!(settings.serve.model_path, model);
    assert!(settings.generate.taxonomy_path.is_absolute());
    assert!(settings.generate.taxonomy_path.ends_with("tax"));
}

#[test]
fn given_unreachable_repository_when_init_then_prints_manual_clone_hint() {
    let temp = TempDir::new().unwrap();

    ilab(temp.path())
        .args([
            "init",
            "--non-interactive",
            "--taxonomy-path",
            "tax",
            "--repository",
            "file:///nonexistent",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Failed to clone taxonomy repo:"))
        .stdout(predicate::str::contains(
            "Please make sure to manually run `git clone file:///nonexistent`",
        ));

    assert!(!temp.path().join("config.yaml").exists());
}

#[test]
fn given_config_flag_when_init_then_writes_there() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "tax/README.md", "# taxonomy\n");

    ilab(temp.path())
        .args([
            "--config",
            "conf/ilab.yaml",
            "init",
            "--non-interactive",
            "--taxonomy-path",
            "tax",
        ])
        .assert()
        .success();

    assert!(temp.path().join("conf/ilab.yaml").is_file());
    assert!(!temp.path().join("config.yaml").exists());
}

#[test]
fn given_completion_when_run_then_prints_script() {
    let temp = TempDir::new().unwrap();

    ilab(temp.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ilab"));
}
