//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

use crate::config::{
    DEFAULT_CONFIG_FILE, DEFAULT_MODEL_PATH, DEFAULT_TAXONOMY_BASE, DEFAULT_TAXONOMY_PATH,
    DEFAULT_TAXONOMY_REPO,
};

/// CLI for interacting with InstructLab.
///
/// If this is your first time running InstructLab, it's best to start with
/// `ilab init` to create the environment.
#[derive(Parser, Debug)]
#[command(name = "ilab")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a configuration file
    #[arg(
        long,
        global = true,
        env = "ILAB_CONFIG",
        default_value = DEFAULT_CONFIG_FILE,
        value_hint = ValueHint::FilePath
    )]
    pub config: PathBuf,

    /// Debug output (repeat for more: -d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initializes environment for InstructLab
    Init(InitArgs),

    /// Lists taxonomy files that have changed since <taxonomy-base> and checks that taxonomy is valid
    Diff(DiffArgs),

    /// Deprecated alias of `diff`
    #[command(hide = true)]
    List(DiffArgs),

    /// Deprecated alias of `diff --quiet`
    #[command(hide = true)]
    Check(TaxonomyArgs),

    /// Print system information
    Sysinfo,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    /// Commands that must fail on an unreadable config file.
    ///
    /// `init` writes the file and `sysinfo` never reads it.
    pub fn needs_config(&self) -> bool {
        matches!(self, Commands::Diff(_) | Commands::List(_) | Commands::Check(_))
    }
}

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Prompt for values (default)
    #[arg(long, overrides_with = "non_interactive")]
    pub interactive: bool,

    /// Initialize the environment assuming defaults
    #[arg(long, overrides_with = "interactive")]
    pub non_interactive: bool,

    /// Path to the model used during generation
    #[arg(long, default_value = DEFAULT_MODEL_PATH, value_hint = ValueHint::FilePath)]
    pub model_path: String,

    /// Base git-ref to use when listing/generating new taxonomy
    #[arg(long, default_value = DEFAULT_TAXONOMY_BASE)]
    pub taxonomy_base: String,

    /// Path to the taxonomy repository clone
    #[arg(long, default_value = DEFAULT_TAXONOMY_PATH, value_hint = ValueHint::DirPath)]
    pub taxonomy_path: String,

    /// Taxonomy repository location
    #[arg(long, default_value = DEFAULT_TAXONOMY_REPO, value_hint = ValueHint::Url)]
    pub repository: String,

    /// Shallow clone the taxonomy repository with minimum size. Do not use
    /// this if you plan to contribute back from the same clone.
    #[arg(long)]
    pub min_taxonomy: bool,
}

impl InitArgs {
    pub fn is_interactive(&self) -> bool {
        !self.non_interactive
    }
}

/// Options shared by `diff` and its aliases.
#[derive(Args, Debug, Clone, Default)]
pub struct TaxonomyArgs {
    /// Path to the taxonomy clone or a single taxonomy file [default: from config]
    #[arg(long, value_hint = ValueHint::AnyPath)]
    pub taxonomy_path: Option<PathBuf>,

    /// Base git-ref to use for taxonomy [default: from config]
    #[arg(long)]
    pub taxonomy_base: Option<String>,

    /// Custom rules file for YAML linting
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub yaml_rules: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DiffArgs {
    #[command(flatten)]
    pub taxonomy: TaxonomyArgs,

    /// Suppress all output. Call returns 0 if check passes, 1 otherwise.
    #[arg(long)]
    pub quiet: bool,
}
