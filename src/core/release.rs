//! Release definition files.
//!
//! A release definition is a small YAML document checked into the project
//! (conventionally `releases/<name>.yaml`) that pins the non-manifest inputs
//! of an install run: the target org, installation keys for protected
//! packages, packages to leave out, and timing overrides.
//!
//! ```yaml
//! org: qa-sandbox
//! wait_mins: 45
//! skip:
//!   - expense-samples
//! installation_keys:
//!   expense-core: "s3cret"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Parsed release definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseDefinition {
    /// Target org alias or username. Overridden by `--org` on the command line.
    pub org: Option<String>,

    /// Package names to exclude from the plan (their dependents still install
    /// only if the org already has them).
    pub skip: Vec<String>,

    /// Installation keys for key-protected packages, keyed by package name.
    pub installation_keys: BTreeMap<String, String>,

    /// Minutes to wait for a single package install before timing out.
    pub wait_mins: Option<u64>,

    /// Seconds between install status polls.
    pub poll_secs: Option<u64>,
}

impl ReleaseDefinition {
    /// Load a release definition from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read release definition: {}", path.display()))?;

        serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse release definition: {}", path.display()))
    }

    /// Installation key for a package, if one is defined.
    pub fn installation_key(&self, package: &str) -> Option<&str> {
        self.installation_keys.get(package).map(String::as_str)
    }

    /// Whether a package is excluded from this release.
    pub fn is_skipped(&self, package: &str) -> bool {
        self.skip.iter().any(|s| s == package)
    }
}
