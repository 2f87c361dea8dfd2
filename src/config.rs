//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: `config.yaml` in the current directory, or `--config`
//! 3. Environment variables: `ILAB_*` prefix, `__` between section and key
//!    (e.g. `ILAB_GENERATE__TAXONOMY_BASE`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, IoResultExt};
use crate::domain::expand_env_vars;
use crate::infrastructure::traits::FileSystem;

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_MODEL: &str = "merlinite-7b-lab-Q4_K_M";
pub const DEFAULT_MODEL_PATH: &str = "models/merlinite-7b-lab-Q4_K_M.gguf";
pub const DEFAULT_TAXONOMY_REPO: &str = "https://github.com/instructlab/taxonomy.git";
pub const DEFAULT_TAXONOMY_PATH: &str = "taxonomy";
pub const DEFAULT_TAXONOMY_BASE: &str = "origin/main";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "ILAB";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level used when no `-d` flag is given
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".into(),
        }
    }
}

/// Chat session settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChatConfig {
    pub model: String,
    pub vi_mode: bool,
    pub visible_overflow: bool,
    pub context: String,
    pub session: Option<PathBuf>,
    pub logs_dir: PathBuf,
    pub greedy_mode: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            vi_mode: false,
            visible_overflow: true,
            context: "default".into(),
            session: None,
            logs_dir: PathBuf::from("data/chatlogs"),
            greedy_mode: false,
        }
    }
}

/// Synthetic data generation settings, including the taxonomy location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GenerateConfig {
    pub model: String,
    pub num_cpus: u32,
    pub num_instructions: u32,
    pub taxonomy_path: PathBuf,
    /// Base git ref taxonomy diffs are computed against
    pub taxonomy_base: String,
    pub output_dir: PathBuf,
    pub prompt_file: PathBuf,
    pub seed_file: PathBuf,
    pub chunk_word_count: u32,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            num_cpus: 10,
            num_instructions: 100,
            taxonomy_path: PathBuf::from(DEFAULT_TAXONOMY_PATH),
            taxonomy_base: DEFAULT_TAXONOMY_BASE.into(),
            output_dir: PathBuf::from("generated"),
            prompt_file: PathBuf::from("prompt.txt"),
            seed_file: PathBuf::from("seed_tasks.json"),
            chunk_word_count: 1000,
        }
    }
}

/// Model server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServeConfig {
    pub model_path: PathBuf,
    /// `-1` offloads every layer
    pub gpu_layers: i32,
    pub host_port: String,
    pub max_ctx_size: u32,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            gpu_layers: -1,
            host_port: "127.0.0.1:8000".into(),
            max_ctx_size: 4096,
        }
    }
}

/// Unified configuration for ilab.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralConfig,
    pub chat: ChatConfig,
    pub generate: GenerateConfig,
    pub serve: ServeConfig,
}

impl Settings {
    /// Defaults with the values `init` collects filled in.
    ///
    /// The model path is used for all three model fields.
    pub fn for_init(model_path: &Path, taxonomy_path: &Path, taxonomy_base: &str) -> Self {
        let mut settings = Self::default();
        settings.chat.model = model_path.display().to_string();
        settings.generate.model = model_path.display().to_string();
        settings.serve.model_path = model_path.to_path_buf();
        settings.generate.taxonomy_path = taxonomy_path.to_path_buf();
        settings.generate.taxonomy_base = taxonomy_base.to_string();
        settings
    }

    /// Load settings with layered precedence.
    ///
    /// A missing file yields the defaults (plus environment overrides); a
    /// file that exists but does not parse is a config error.
    pub fn load(path: &Path) -> Result<Self, ApplicationError> {
        let mut builder = Config::builder();
        if path.is_file() {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        // Expand ~ and $VAR in path-like fields
        settings.expand_paths();

        Ok(settings)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        fn expand(path: &mut PathBuf) {
            *path = PathBuf::from(expand_env_vars(&path.to_string_lossy()));
        }
        expand(&mut self.chat.logs_dir);
        if let Some(session) = self.chat.session.as_mut() {
            expand(session);
        }
        expand(&mut self.generate.taxonomy_path);
        expand(&mut self.generate.output_dir);
        expand(&mut self.generate.prompt_file);
        expand(&mut self.generate.seed_file);
        expand(&mut self.serve.model_path);
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, ApplicationError> {
        serde_yaml::to_string(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Write the configuration file, creating parent directories.
    pub fn write(&self, fs: &dyn FileSystem, path: &Path) -> Result<(), ApplicationError> {
        let yaml = self.to_yaml()?;
        fs.ensure_parent(path)
            .with_path_context("create config directory", path)?;
        fs.write(path, &yaml).with_path_context("write config", path)
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
