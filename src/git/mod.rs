//! Git integration for change detection.
//!
//! Quay never shells out to git; everything goes through libgit2. The
//! project root may sit below the repository root, so all paths returned
//! here are relative to the project root, not the repo.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use git2::{DiffOptions, Repository};

/// A project's enclosing git repository.
pub struct GitWorkspace {
    repo: Repository,
    project_root: PathBuf,
}

impl GitWorkspace {
    /// Open the repository containing the project root.
    pub fn open(project_root: &Path) -> Result<Self> {
        let repo = Repository::discover(project_root).with_context(|| {
            format!(
                "no git repository found at {} or any parent",
                project_root.display()
            )
        })?;

        if repo.is_bare() {
            bail!("repository at {} is bare", project_root.display());
        }

        Ok(GitWorkspace {
            repo,
            project_root: project_root.to_path_buf(),
        })
    }

    /// Whether the project sits inside a git repository.
    pub fn is_available(project_root: &Path) -> bool {
        Repository::discover(project_root).is_ok()
    }

    /// Files changed between `base` and the working tree, staged changes
    /// and untracked files included. Paths are relative to the project
    /// root; changes outside it are dropped.
    pub fn changed_files(&self, base: &str) -> Result<Vec<PathBuf>> {
        let mut opts = DiffOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);

        let changed = self.diff_to_workdir(base, opts)?;
        tracing::debug!("{} files changed since {}", changed.len(), base);
        Ok(changed)
    }

    /// Files changed under a single project subdirectory, scoped with a
    /// pathspec so only that directory is walked.
    pub fn changed_files_in(&self, base: &str, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut opts = DiffOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        opts.pathspec(self.to_repo_relative(dir)?);

        self.diff_to_workdir(base, opts)
    }

    fn diff_to_workdir(&self, base: &str, mut opts: DiffOptions) -> Result<Vec<PathBuf>> {
        let base_tree = self
            .repo
            .revparse_single(base)
            .with_context(|| format!("could not resolve git revision `{}`", base))?
            .peel_to_commit()
            .with_context(|| format!("`{}` is not a commit", base))?
            .tree()?;

        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(Some(&base_tree), Some(&mut opts))
            .context("failed to diff against the working tree")?;

        let workdir = self.workdir()?;
        let mut changed = Vec::new();

        for delta in diff.deltas() {
            let path = delta.new_file().path().or_else(|| delta.old_file().path());
            let Some(path) = path else { continue };

            if let Some(relative) = self.to_project_relative(workdir, path) {
                if !changed.contains(&relative) {
                    changed.push(relative);
                }
            }
        }

        Ok(changed)
    }

    /// Read a project file's content at a revision.
    ///
    /// Returns `None` when the file does not exist at that revision.
    pub fn file_at(&self, rev: &str, project_path: &Path) -> Result<Option<String>> {
        let tree = self
            .repo
            .revparse_single(rev)
            .with_context(|| format!("could not resolve git revision `{}`", rev))?
            .peel_to_commit()
            .with_context(|| format!("`{}` is not a commit", rev))?
            .tree()?;

        let repo_path = self.to_repo_relative(project_path)?;

        let entry = match tree.get_path(&repo_path) {
            Ok(entry) => entry,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to look up {} at `{}`", repo_path.display(), rev)
                })
            }
        };

        let object = entry.to_object(&self.repo)?;
        let blob = object
            .as_blob()
            .with_context(|| format!("{} is not a file at `{}`", repo_path.display(), rev))?;

        let content = std::str::from_utf8(blob.content())
            .with_context(|| format!("{} is not UTF-8 at `{}`", repo_path.display(), rev))?;

        Ok(Some(content.to_string()))
    }

    fn workdir(&self) -> Result<&Path> {
        match self.repo.workdir() {
            Some(dir) => Ok(dir),
            None => bail!("repository has no working tree"),
        }
    }

    /// Translate a repo-relative delta path into a project-relative one.
    fn to_project_relative(&self, workdir: &Path, repo_path: &Path) -> Option<PathBuf> {
        let absolute = workdir.join(repo_path);
        absolute
            .strip_prefix(&self.project_root)
            .ok()
            .map(Path::to_path_buf)
    }

    /// Translate a project-relative path into a repo-relative one.
    fn to_repo_relative(&self, project_path: &Path) -> Result<PathBuf> {
        let workdir = self.workdir()?;
        let absolute = self.project_root.join(project_path);

        // The project root itself lives inside the workdir, so canonical
        // forms are not needed here; both sides come from the same walk.
        absolute
            .strip_prefix(workdir)
            .map(Path::to_path_buf)
            .with_context(|| {
                format!(
                    "{} is outside the git working tree",
                    absolute.display()
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{IndexAddOption, Signature};
    use tempfile::TempDir;

    fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"], IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();

        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("tester", "tester@example.com").unwrap();

        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn init_project() -> (TempDir, Repository) {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();

        std::fs::create_dir_all(tmp.path().join("pkgs/core/classes")).unwrap();
        std::fs::write(
            tmp.path().join("sfdx-project.json"),
            r#"{"packageDirectories": [{"path": "pkgs/core"}]}"#,
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("pkgs/core/classes/Expense.cls"),
            "public class Expense {}",
        )
        .unwrap();

        commit_all(&repo, "initial");
        (tmp, repo)
    }

    #[test]
    fn test_changed_files_against_head() {
        let (tmp, repo) = init_project();

        std::fs::write(
            tmp.path().join("pkgs/core/classes/Expense.cls"),
            "public class Expense { Integer total; }",
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("pkgs/core/classes/Report.cls"),
            "public class Report {}",
        )
        .unwrap();

        let ws = GitWorkspace::open(tmp.path()).unwrap();
        let changed = ws.changed_files("HEAD").unwrap();

        assert!(changed.contains(&PathBuf::from("pkgs/core/classes/Expense.cls")));
        assert!(changed.contains(&PathBuf::from("pkgs/core/classes/Report.cls")));

        drop(repo);
    }

    #[test]
    fn test_changed_files_scoped_to_directory() {
        let (tmp, repo) = init_project();

        std::fs::write(
            tmp.path().join("pkgs/core/classes/Report.cls"),
            "public class Report {}",
        )
        .unwrap();
        std::fs::write(tmp.path().join("README.md"), "# readme").unwrap();

        let ws = GitWorkspace::open(tmp.path()).unwrap();
        let scoped = ws.changed_files_in("HEAD", Path::new("pkgs/core")).unwrap();

        assert_eq!(scoped, vec![PathBuf::from("pkgs/core/classes/Report.cls")]);

        drop(repo);
    }

    #[test]
    fn test_changed_files_clean_tree() {
        let (tmp, _repo) = init_project();

        let ws = GitWorkspace::open(tmp.path()).unwrap();
        let changed = ws.changed_files("HEAD").unwrap();

        assert!(changed.is_empty());
    }

    #[test]
    fn test_file_at_revision() {
        let (tmp, repo) = init_project();

        // Change the manifest after the commit; file_at must see the old one.
        std::fs::write(
            tmp.path().join("sfdx-project.json"),
            r#"{"packageDirectories": [{"path": "pkgs/core"}, {"path": "pkgs/api"}]}"#,
        )
        .unwrap();

        let ws = GitWorkspace::open(tmp.path()).unwrap();
        let content = ws
            .file_at("HEAD", Path::new("sfdx-project.json"))
            .unwrap()
            .unwrap();

        assert!(content.contains("pkgs/core"));
        assert!(!content.contains("pkgs/api"));

        assert!(ws
            .file_at("HEAD", Path::new("missing.json"))
            .unwrap()
            .is_none());

        drop(repo);
    }

    #[test]
    fn test_bad_revision() {
        let (tmp, _repo) = init_project();

        let ws = GitWorkspace::open(tmp.path()).unwrap();
        let err = ws.changed_files("no-such-branch").unwrap_err();

        assert!(err.to_string().contains("no-such-branch"));
    }
}
