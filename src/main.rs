use std::process;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use ilab::cli::args::Cli;
use ilab::cli::commands::execute_command;
use ilab::cli::output;
use ilab::config::Settings;
use ilab::exitcode;
use ilab::infrastructure::di::ServiceContainer;

fn main() {
    let cli = Cli::parse();

    let settings = match Settings::load(&cli.config) {
        Ok(settings) => settings,
        Err(e) if cli.command.needs_config() => {
            output::error(&e);
            process::exit(exitcode::CONFIG);
        }
        Err(e) => {
            output::warning(&format!("ignoring {}: {e}", cli.config.display()));
            Settings::default()
        }
    };

    setup_logging(cli.debug, &settings.general.log_level);

    let container = ServiceContainer::new(settings, cli.config.clone());
    if let Err(e) = execute_command(&cli, &container) {
        if !e.is_reported() {
            output::error(&e);
        }
        process::exit(e.exit_code());
    }
}

/// `-d` count wins; without it the configured `general.log_level` applies.
fn setup_logging(verbosity: u8, configured: &str) {
    let filter = match verbosity {
        0 => configured_level(configured),
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}

/// Map a config log level to a filter.
///
/// Without `-d` only warnings and errors reach the terminal; `INFO` in the
/// config is the default and does not make the CLI chatty.
fn configured_level(level: &str) -> LevelFilter {
    match level.to_ascii_uppercase().as_str() {
        "DEBUG" => LevelFilter::DEBUG,
        "TRACE" => LevelFilter::TRACE,
        "ERROR" | "CRITICAL" => LevelFilter::ERROR,
        "OFF" => LevelFilter::OFF,
        _ => LevelFilter::WARN,
    }
}
