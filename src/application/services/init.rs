//! Init service
//!
//! Bootstraps a working environment: taxonomy checkout plus config file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::{
    Settings, DEFAULT_CONFIG_FILE, DEFAULT_MODEL_PATH, DEFAULT_TAXONOMY_BASE,
    DEFAULT_TAXONOMY_PATH, DEFAULT_TAXONOMY_REPO,
};
use crate::domain::expand_path;
use crate::infrastructure::git::{CloneRequest, RepoCloner};
use crate::infrastructure::traits::{FileSystem, Prompter};

/// Inputs to `init`, as given on the command line.
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub interactive: bool,
    pub model_path: String,
    pub taxonomy_path: String,
    pub taxonomy_base: String,
    pub repository: String,
    /// Shallow clone (depth 1)
    pub min_taxonomy: bool,
    /// Where the generated config is written
    pub config_path: PathBuf,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            interactive: true,
            model_path: DEFAULT_MODEL_PATH.to_string(),
            taxonomy_path: DEFAULT_TAXONOMY_PATH.to_string(),
            taxonomy_base: DEFAULT_TAXONOMY_BASE.to_string(),
            repository: DEFAULT_TAXONOMY_REPO.to_string(),
            min_taxonomy: false,
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }
}

/// What `init` ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum InitOutcome {
    /// User declined to overwrite an existing config; nothing was touched
    Aborted,
    Initialized {
        settings: Box<Settings>,
        /// Whether the taxonomy repository was cloned
        cloned: bool,
    },
}

/// Service driving the `init` flow.
pub struct InitService {
    fs: Arc<dyn FileSystem>,
    cloner: Arc<dyn RepoCloner>,
    prompter: Arc<dyn Prompter>,
}

impl InitService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cloner: Arc<dyn RepoCloner>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            fs,
            cloner,
            prompter,
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn run(&self, options: &InitOptions) -> ApplicationResult<InitOutcome> {
        let cwd = self
            .fs
            .current_dir()
            .with_path_context("resolve current directory", Path::new("."))?;
        let config_name = options.config_path.display().to_string();

        let mut taxonomy_path = expand_path(&options.taxonomy_path, &cwd);
        if options.interactive {
            if self.fs.exists(&options.config_path) {
                let proceed = self
                    .ask_confirm(
                        &format!(
                            "Found {config_name} in the current directory, do you still want to continue?"
                        ),
                        false,
                    )?;
                if !proceed {
                    debug!("run: keeping existing {}", config_name);
                    return Ok(InitOutcome::Aborted);
                }
            }
            self.prompter.say(
                "Welcome to InstructLab ilab. This guide will help you to setup your environment.",
            );
            self.prompter.say(
                "Please provide the following values to initiate the environment [press Enter for defaults]:",
            );
            let answer = self.ask_input(
                "Path to taxonomy repo",
                &taxonomy_path.display().to_string(),
            )?;
            taxonomy_path = expand_path(&answer, &cwd);
        }

        let cloned = self.ensure_taxonomy(&taxonomy_path, options)?;

        let mut model_path = expand_path(&options.model_path, &cwd);
        let models_dir = model_path.parent().map(Path::to_path_buf);
        if options.interactive && models_dir.is_some_and(|dir| self.fs.is_dir(&dir)) {
            let answer =
                self.ask_input("Path to your model", &model_path.display().to_string())?;
            model_path = expand_path(&answer, &cwd);
        }

        self.prompter
            .say(&format!("Generating `{config_name}` in the current directory..."));
        let settings = Settings::for_init(&model_path, &taxonomy_path, &options.taxonomy_base);
        settings.write(self.fs.as_ref(), &options.config_path)?;
        info!("wrote {}", options.config_path.display());

        self.prompter.say(
            "Initialization completed successfully, you're ready to start using `ilab`. Enjoy!",
        );
        Ok(InitOutcome::Initialized {
            settings: Box::new(settings),
            cloned,
        })
    }

    /// Clone the taxonomy unless it is already present; returns whether it cloned.
    fn ensure_taxonomy(&self, taxonomy_path: &Path, options: &InitOptions) -> ApplicationResult<bool> {
        let has_contents = self.fs.is_dir(taxonomy_path)
            && self
                .fs
                .read_dir(taxonomy_path)
                .map(|entries| !entries.is_empty())
                .unwrap_or(false);
        if has_contents {
            debug!("ensure_taxonomy: {} is populated", taxonomy_path.display());
            return Ok(false);
        }

        let clone = !options.interactive
            || self.ask_confirm(
                &format!(
                    "`{}` seems to not exist or is empty. Should I clone {} for you?",
                    taxonomy_path.display(),
                    options.repository
                ),
                true,
            )?;
        if !clone {
            return Ok(false);
        }

        self.prompter
            .say(&format!("Cloning {}...", options.repository));
        let request =
            CloneRequest::taxonomy(&options.repository, taxonomy_path, options.min_taxonomy);
        self.cloner
            .clone_repo(&request)
            .map_err(|source| ApplicationError::Clone {
                repository: options.repository.clone(),
                source,
            })?;
        Ok(true)
    }

    fn ask_confirm(&self, message: &str, default: bool) -> ApplicationResult<bool> {
        self.prompter
            .confirm(message, default)
            .map_err(|e| prompt_failed(message, e))
    }

    fn ask_input(&self, message: &str, default: &str) -> ApplicationResult<String> {
        self.prompter
            .input(message, default)
            .map_err(|e| prompt_failed(message, e))
    }
}

fn prompt_failed(message: &str, source: std::io::Error) -> ApplicationError {
    ApplicationError::OperationFailed {
        context: format!("prompt '{message}'"),
        source: Box::new(source),
    }
}
