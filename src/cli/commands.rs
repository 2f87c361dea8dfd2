//! Command handlers
//!
//! Each handler takes the service container explicitly and maps service
//! results to terminal output and exit codes.

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{InitOptions, InitOutcome};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, InitArgs, TaxonomyArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::domain::{EntryStatus, ValidationReport};
use crate::exitcode;
use crate::infrastructure::di::ServiceContainer;

/// Dispatch the parsed command.
pub fn execute_command(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    match &cli.command {
        Commands::Init(args) => cmd_init(container, args),
        Commands::Diff(args) => run_diff(container, &args.taxonomy, args.quiet),
        Commands::List(args) => {
            output::warning("`ilab list` is deprecated, use `ilab diff` instead");
            run_diff(container, &args.taxonomy, args.quiet)
        }
        Commands::Check(args) => {
            output::warning("`ilab check` is deprecated, use `ilab diff --quiet` instead");
            run_diff(container, args, true)
        }
        Commands::Sysinfo => cmd_sysinfo(container),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_init(container: &ServiceContainer, args: &InitArgs) -> CliResult<()> {
    let options = InitOptions {
        interactive: args.is_interactive(),
        model_path: args.model_path.clone(),
        taxonomy_path: args.taxonomy_path.clone(),
        taxonomy_base: args.taxonomy_base.clone(),
        repository: args.repository.clone(),
        min_taxonomy: args.min_taxonomy,
        config_path: container.config_path().to_path_buf(),
    };

    match container.init_service().run(&options) {
        Ok(InitOutcome::Aborted) => Ok(()),
        Ok(InitOutcome::Initialized { cloned, .. }) => {
            debug!("cmd_init: done, cloned={}", cloned);
            Ok(())
        }
        Err(ApplicationError::Clone { repository, source }) => {
            output::failure(&format!("Failed to clone taxonomy repo: {source}"));
            output::info(&format!(
                "Please make sure to manually run `git clone {repository}`"
            ));
            Err(CliError::Exit(exitcode::FAILURE))
        }
        Err(e) => Err(e.into()),
    }
}

/// Shared handler of `diff`, `list` and `check`.
///
/// Lists changed files (unless quiet), then validates. Failures are
/// reported here so the caller only sees the exit status.
#[instrument(level = "debug", skip(container))]
pub fn run_diff(container: &ServiceContainer, args: &TaxonomyArgs, quiet: bool) -> CliResult<()> {
    let generate = &container.settings.generate;
    let path = args
        .taxonomy_path
        .clone()
        .unwrap_or_else(|| generate.taxonomy_path.clone());
    let base = args
        .taxonomy_base
        .clone()
        .unwrap_or_else(|| generate.taxonomy_base.clone());
    let service = container.taxonomy_service();

    let fail = |e: &dyn std::fmt::Display| {
        if !quiet {
            output::failure(&format!(
                "Reading taxonomy failed with the following error: {e}"
            ));
        }
        CliError::Exit(exitcode::FAILURE)
    };

    if !quiet {
        if service.is_single_file(&path) {
            output::info(&path.display());
        } else {
            let diff = service.diff(&path, &base).map_err(|e| fail(&e))?;
            for file in &diff.files {
                output::info(&file.display());
            }
        }
    }

    let rules = service
        .load_rules(args.yaml_rules.as_deref())
        .map_err(|e| fail(&e))?;
    match service.validate(&path, &base, &rules) {
        Ok(report) => {
            if !quiet {
                print_findings(&report);
                output::success(&format!("Taxonomy in /{}/ is valid :)", path.display()));
            }
            Ok(())
        }
        Err(e) => {
            if !quiet {
                if let ApplicationError::InvalidTaxonomy { report, .. } = &e {
                    print_findings(report);
                }
            }
            Err(fail(&e))
        }
    }
}

/// Print lint/schema findings of entries that were actually checked.
fn print_findings(report: &ValidationReport) {
    for entry in report
        .entries
        .iter()
        .filter(|e| e.status() != EntryStatus::Skipped && !e.violations.is_empty())
    {
        output::header(&entry.path.display());
        for violation in &entry.violations {
            output::detail(violation);
        }
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_sysinfo(container: &ServiceContainer) -> CliResult<()> {
    for (key, value) in container.probe.collect() {
        output::info(&format!("{key}: {value}"));
    }
    Ok(())
}
