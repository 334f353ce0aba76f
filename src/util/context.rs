//! Global context for quay operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::project::{find_project_file, ProjectError};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global quay data (~/.quay/)
    home: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let home = crate::util::config::global_config_dir()
            .unwrap_or_else(|| PathBuf::from(".quay"));

        Ok(GlobalContext {
            cwd,
            home,
            verbose: false,
            color: true,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the quay home directory (~/.quay/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Get the project-local quay directory.
    pub fn project_quay_dir(&self) -> PathBuf {
        self.cwd.join(".quay")
    }

    /// Get the default artifact output directory.
    pub fn artifacts_dir(&self) -> PathBuf {
        self.project_quay_dir().join("artifacts")
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Load the merged configuration (global, then project overrides).
    pub fn load_config(&self) -> crate::util::Config {
        let project_path = match self.find_project_root() {
            Ok(root) => crate::util::config::project_config_path(&root),
            Err(_) => crate::util::config::project_config_path(&self.cwd),
        };
        crate::util::config::load_config(&self.config_path(), &project_path)
    }

    /// Find the project file (sfdx-project.json) starting from cwd and
    /// searching upward.
    pub fn find_project(&self) -> Result<PathBuf, ProjectError> {
        let mut current = self.cwd.clone();
        loop {
            match find_project_file(&current) {
                Ok(path) => return Ok(path),
                Err(ProjectError::NotFound { .. }) => {
                    if !current.pop() {
                        return Err(ProjectError::NotFound {
                            dir: self.cwd.clone(),
                        });
                    }
                }
            }
        }
    }

    /// Find the project root (directory containing sfdx-project.json).
    pub fn find_project_root(&self) -> Result<PathBuf, ProjectError> {
        self.find_project()
            .map(|p| p.parent().map(Path::to_path_buf).unwrap_or_default())
    }
}
