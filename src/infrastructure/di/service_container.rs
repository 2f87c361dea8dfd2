//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::services::{InitService, TaxonomyService};
use crate::config::Settings;
use crate::infrastructure::git::{Git2Cloner, Git2Differ, RepoCloner, TaxonomyDiffer};
use crate::infrastructure::traits::{
    CommandRunner, FileSystem, Prompter, RealCommandRunner, RealFileSystem, RealSystemProbe,
    StdioPrompter, SystemProbe,
};

/// Container holding settings and the I/O collaborators services are built from.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Path the settings were loaded from (and `init` writes to)
    pub config_path: PathBuf,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Command runner abstraction
    pub cmd: Arc<dyn CommandRunner>,

    pub cloner: Arc<dyn RepoCloner>,
    pub differ: Arc<dyn TaxonomyDiffer>,
    pub prompter: Arc<dyn Prompter>,
    pub probe: Arc<dyn SystemProbe>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings, config_path: impl Into<PathBuf>) -> Self {
        Self::with_deps(
            settings,
            config_path,
            Arc::new(RealFileSystem),
            Arc::new(RealCommandRunner),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    ///
    /// Git, prompt and probe collaborators default to the real ones; swap
    /// them with the `with_*` setters.
    pub fn with_deps(
        settings: Settings,
        config_path: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
    ) -> Self {
        let settings = Arc::new(settings);
        let probe = Arc::new(RealSystemProbe::new(cmd.clone()));

        Self {
            settings,
            config_path: config_path.into(),
            fs,
            cmd,
            cloner: Arc::new(Git2Cloner),
            differ: Arc::new(Git2Differ),
            prompter: Arc::new(StdioPrompter),
            probe,
        }
    }

    pub fn with_cloner(mut self, cloner: Arc<dyn RepoCloner>) -> Self {
        self.cloner = cloner;
        self
    }

    pub fn with_differ(mut self, differ: Arc<dyn TaxonomyDiffer>) -> Self {
        self.differ = differ;
        self
    }

    pub fn with_prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.prompter = prompter;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn SystemProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn taxonomy_service(&self) -> TaxonomyService {
        TaxonomyService::new(self.fs.clone(), self.differ.clone())
    }

    pub fn init_service(&self) -> InitService {
        InitService::new(self.fs.clone(), self.cloner.clone(), self.prompter.clone())
    }
}
