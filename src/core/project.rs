//! Project - the loaded DX project.
//!
//! A DxProject ties the parsed sfdx-project.json to its root directory
//! and gives the rest of the crate path lookups, the `.forceignore`
//! rules, and the mapping from changed files back to package directories.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::core::manifest::ProjectManifest;
use crate::core::package::PackageEntry;
use crate::util::GlobalContext;

/// The project file name.
pub const PROJECT_FILE: &str = "sfdx-project.json";

/// The ignore file filtering which source files count for a package.
pub const FORCEIGNORE_FILE: &str = ".forceignore";

/// Errors locating a project file.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("no {} found in `{}` or any parent directory", PROJECT_FILE, dir.display())]
    NotFound { dir: PathBuf },
}

/// Check a single directory for the project file.
pub fn find_project_file(dir: &Path) -> Result<PathBuf, ProjectError> {
    let candidate = dir.join(PROJECT_FILE);
    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(ProjectError::NotFound {
            dir: dir.to_path_buf(),
        })
    }
}

/// A loaded DX project.
#[derive(Debug, Clone)]
pub struct DxProject {
    manifest: ProjectManifest,
    root: PathBuf,
}

impl DxProject {
    /// Open a project from its manifest path.
    pub fn open(manifest_path: &Path) -> Result<Self> {
        let manifest = ProjectManifest::load(manifest_path)?;
        let root = manifest_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        Ok(DxProject { manifest, root })
    }

    /// Discover the project from the context's working directory.
    pub fn discover(ctx: &GlobalContext) -> Result<Self> {
        let manifest_path = ctx.find_project().map_err(|e| {
            anyhow::anyhow!("{}\n{}", e, crate::util::diagnostic::suggestions::NO_PROJECT)
        })?;
        Self::open(&manifest_path)
    }

    /// The project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }

    pub fn manifest_mut(&mut self) -> &mut ProjectManifest {
        &mut self.manifest
    }

    /// Absolute path of a package directory.
    pub fn package_dir(&self, entry: &PackageEntry) -> PathBuf {
        self.root.join(&entry.path)
    }

    /// The project-local quay directory.
    pub fn quay_dir(&self) -> PathBuf {
        self.root.join(".quay")
    }

    /// Load the project's `.forceignore`, or empty rules when absent.
    pub fn forceignore(&self) -> Result<Forceignore> {
        Forceignore::load(&self.root)
    }

    /// Map a project-relative file path to the package directory owning
    /// it. The longest matching directory prefix wins, so nested package
    /// directories shadow their parents.
    pub fn package_for_path(&self, relative: &Path) -> Option<&PackageEntry> {
        self.manifest
            .packages()
            .iter()
            .filter(|entry| relative.starts_with(&entry.path))
            .max_by_key(|entry| entry.path.components().count())
    }
}

/// Parsed `.forceignore` rules.
///
/// Follows gitignore-style matching: one glob per line, `#` comments,
/// `!` negation, last match wins. A pattern without a slash matches the
/// file name in any directory; a matching directory ignores its subtree.
#[derive(Debug, Clone, Default)]
pub struct Forceignore {
    rules: Vec<IgnoreRule>,
}

#[derive(Debug, Clone)]
struct IgnoreRule {
    matchers: Vec<glob::Pattern>,
    negated: bool,
}

impl Forceignore {
    /// Load `.forceignore` from the project root, empty when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(FORCEIGNORE_FILE);
        if !path.is_file() {
            return Ok(Forceignore::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Ok(Self::parse(&content))
    }

    /// Parse ignore rules from file content. Unparseable lines are
    /// skipped with a warning rather than failing the whole file.
    pub fn parse(content: &str) -> Self {
        let mut rules = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (negated, pattern) = match line.strip_prefix('!') {
                Some(rest) => (true, rest.trim()),
                None => (false, line),
            };

            let anchored = pattern
                .strip_prefix('/')
                .unwrap_or(pattern)
                .trim_end_matches('/');
            let expanded = if pattern.starts_with('/') || anchored.contains('/') {
                anchored.to_string()
            } else {
                // Bare names match at any depth.
                format!("**/{}", anchored)
            };

            let mut matchers = Vec::new();
            for candidate in [expanded.clone(), format!("{}/**", expanded)] {
                match glob::Pattern::new(&candidate) {
                    Ok(p) => matchers.push(p),
                    Err(e) => {
                        tracing::warn!("skipping .forceignore pattern `{}`: {}", line, e);
                    }
                }
            }

            if !matchers.is_empty() {
                rules.push(IgnoreRule { matchers, negated });
            }
        }

        Forceignore { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether a project-relative path is ignored.
    pub fn is_ignored(&self, relative: &Path) -> bool {
        let text = relative.to_string_lossy().replace('\\', "/");

        let mut ignored = false;
        for rule in &self.rules {
            if rule.matchers.iter().any(|m| m.matches(&text)) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}
