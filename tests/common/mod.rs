//! Fixtures shared by integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::{Commit, IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

/// A version 2 skill with `examples` seed examples.
pub fn skill_yaml(examples: usize) -> String {
    let mut doc = String::from(
        "version: 2\ntask_description: Write short poems\ncreated_by: tester\nseed_examples:\n",
    );
    for i in 0..examples {
        doc.push_str(&format!(
            "  - question: Write poem number {i}?\n    answer: Roses are red number {i}\n"
        ));
    }
    doc
}

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    std::fs::write(&path, content).expect("write file");
    path
}

/// Git repository on `main` whose first commit is also `origin/main`.
pub struct TaxonomyRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TaxonomyRepo {
    /// Repository with one committed, valid skill at `compositional_skills/base/qna.yaml`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).expect("init repo");

        let fixture = Self { dir, repo };
        fixture.write("compositional_skills/base/qna.yaml", &skill_yaml(5));
        fixture.write("README.md", "# taxonomy\n");
        let oid = fixture.commit_all("initial");
        fixture
            .repo
            .reference("refs/remotes/origin/main", oid, true, "fixture remote")
            .expect("remote ref");
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        write_file(self.path(), relative, content)
    }

    pub fn commit_all(&self, message: &str) -> Oid {
        self.commit_all_merging(message, &[])
    }

    /// Commit the whole working tree with HEAD and `others` as parents.
    pub fn commit_all_merging(&self, message: &str, others: &[Oid]) -> Oid {
        let mut index = self.repo.index().expect("index");
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .expect("add all");
        index.write().expect("write index");
        let tree = self
            .repo
            .find_tree(index.write_tree().expect("write tree"))
            .expect("tree");
        let sig = Signature::now("Tester", "tester@example.com").expect("signature");
        let mut parents: Vec<Commit> = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
            .into_iter()
            .collect();
        for oid in others {
            parents.push(self.repo.find_commit(*oid).expect("merge parent"));
        }
        let parent_refs: Vec<&Commit> = parents.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .expect("commit")
    }

    /// Point `origin/main` at `oid`.
    pub fn set_origin_main(&self, oid: Oid) {
        self.repo
            .reference("refs/remotes/origin/main", oid, true, "fixture remote")
            .expect("remote ref");
    }

    /// Move HEAD, index and working tree to `oid`.
    pub fn reset_hard(&self, oid: Oid) {
        let commit = self.repo.find_commit(oid).expect("commit");
        self.repo
            .reset(commit.as_object(), git2::ResetType::Hard, None)
            .expect("reset");
    }
}
