//! Git-backed collaborators: taxonomy clone and taxonomy diff
//!
//! Both are traits so the command layer can be exercised without network
//! access or fixture repositories.

use std::path::{Path, PathBuf};

use git2::{BranchType, Commit, Delta, Repository, Sort, StatusOptions};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{is_taxonomy_file, DiffResult};

/// Branch the taxonomy repository is cloned from.
pub const TAXONOMY_BRANCH: &str = "main";

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Path is not inside a git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was checked
        path: PathBuf,
    },

    /// Base reference cannot be resolved or is unrelated to HEAD.
    #[error("couldn't find the taxonomy git ref \"{base}\" from the current HEAD")]
    BaseNotFound {
        /// The base ref as given by the user
        base: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// Parameters of a clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    pub url: String,
    pub destination: PathBuf,
    pub branch: String,
    /// History depth; `None` clones the full history
    pub depth: Option<i32>,
    pub recurse_submodules: bool,
}

impl CloneRequest {
    /// Clone of the taxonomy `main` branch with submodules, shallow if requested.
    pub fn taxonomy(url: impl Into<String>, destination: impl Into<PathBuf>, shallow: bool) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            branch: TAXONOMY_BRANCH.to_string(),
            depth: shallow.then_some(1),
            recurse_submodules: true,
        }
    }
}

/// Clones repositories.
pub trait RepoCloner: Send + Sync {
    fn clone_repo(&self, request: &CloneRequest) -> Result<(), GitError>;
}

/// Lists taxonomy files changed relative to a base reference.
pub trait TaxonomyDiffer: Send + Sync {
    fn changed_files(&self, repo: &Path, base: &str) -> Result<DiffResult, GitError>;
}

/// `RepoCloner` backed by libgit2.
#[derive(Debug, Default)]
pub struct Git2Cloner;

impl RepoCloner for Git2Cloner {
    fn clone_repo(&self, request: &CloneRequest) -> Result<(), GitError> {
        info!(
            "cloning {} ({}) into {}",
            request.url,
            request.branch,
            request.destination.display()
        );
        let mut fetch = git2::FetchOptions::new();
        if let Some(depth) = request.depth {
            fetch.depth(depth);
        }

        let repo = git2::build::RepoBuilder::new()
            .branch(&request.branch)
            .fetch_options(fetch)
            .clone(&request.url, &request.destination)?;

        if request.recurse_submodules {
            update_submodules(&repo)?;
        }
        Ok(())
    }
}

fn update_submodules(repo: &Repository) -> Result<(), GitError> {
    for mut submodule in repo.submodules()? {
        debug!("updating submodule {}", submodule.path().display());
        submodule.update(true, None)?;
        let nested = submodule.open()?;
        update_submodules(&nested)?;
    }
    Ok(())
}

/// `TaxonomyDiffer` backed by libgit2.
#[derive(Debug, Default)]
pub struct Git2Differ;

impl TaxonomyDiffer for Git2Differ {
    fn changed_files(&self, repo_path: &Path, base: &str) -> Result<DiffResult, GitError> {
        debug!("changed_files: repo={} base={}", repo_path.display(), base);
        let repo = Repository::open(repo_path).map_err(|_| GitError::NotARepo {
            path: repo_path.to_path_buf(),
        })?;

        let untracked = untracked_taxonomy_files(&repo)?;
        let base_commit = resolve_base(&repo, base)?;
        debug!("changed_files: diffing against {}", base_commit.id());

        let tree = base_commit.tree()?;
        let diff = repo.diff_tree_to_workdir_with_index(Some(&tree), None)?;
        let modified: Vec<PathBuf> = diff
            .deltas()
            .filter(|delta| delta.status() != Delta::Deleted)
            .filter_map(|delta| delta.new_file().path().map(Path::to_path_buf))
            .filter(|path| is_taxonomy_file(path))
            .collect();

        Ok(DiffResult::new(base, untracked.into_iter().chain(modified)))
    }
}

fn untracked_taxonomy_files(repo: &Repository) -> Result<Vec<PathBuf>, GitError> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);

    let statuses = repo.statuses(Some(&mut opts))?;
    Ok(statuses
        .iter()
        .filter(|entry| entry.status().is_wt_new())
        .filter_map(|entry| entry.path().map(PathBuf::from))
        .filter(|path| is_taxonomy_file(path))
        .collect())
}

/// Find the commit to diff against.
///
/// `remote/branch` names a remote-tracking branch, a plain name a local
/// branch; both walk every ancestor of HEAD, newest first, to the first
/// commit the branch contains. Anything else is resolved as a commit-ish
/// directly.
fn resolve_base<'r>(repo: &'r Repository, base: &str) -> Result<Commit<'r>, GitError> {
    let not_found = || GitError::BaseNotFound {
        base: base.to_string(),
    };

    let tip = if base.contains('/') {
        repo.refname_to_id(&format!("refs/remotes/{base}"))
            .map_err(|_| not_found())?
    } else if let Ok(branch) = repo.find_branch(base, BranchType::Local) {
        branch.get().peel_to_commit()?.id()
    } else {
        return repo
            .revparse_single(base)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| not_found());
    };

    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    walk.push_head()?;
    for oid in walk {
        let oid = oid?;
        if oid == tip || repo.graph_descendant_of(tip, oid)? {
            return Ok(repo.find_commit(oid)?);
        }
    }
    Err(not_found())
}
