//! Org access - everything that talks to a Salesforce org.
//!
//! All org traffic goes through the vendor `sf` CLI; `OrgClient` is the
//! seam that keeps planning and install logic testable without one.

pub mod sf_cli;

pub use sf_cli::SfCli;

use std::path::Path;

use anyhow::Result;

use crate::core::version::PackageVersion;

/// A package version already present in an org.
#[derive(Debug, Clone)]
pub struct InstalledPackage {
    /// Subscriber package name, when the org reports one
    pub name: Option<String>,

    /// Namespace prefix for managed packages
    pub namespace: Option<String>,

    /// Subscriber package version id (04t)
    pub version_id: String,

    /// Installed version number, when it parses
    pub version: Option<PackageVersion>,
}

/// State of an asynchronous package install request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    /// Accepted but not yet picked up by the org
    Queued,

    /// The org is processing the request
    InProgress,

    /// Finished successfully
    Succeeded,

    /// Finished with errors
    Failed(String),
}

impl InstallStatus {
    /// Whether the request has finished, either way.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstallStatus::Succeeded | InstallStatus::Failed(_))
    }
}

/// A client for one target org.
pub trait OrgClient {
    /// The org alias or username this client targets.
    fn org(&self) -> &str;

    /// List package versions installed in the org.
    fn installed_packages(&self) -> Result<Vec<InstalledPackage>>;

    /// Kick off an install of a subscriber package version (04t id or
    /// alias). Returns the request id to poll.
    fn start_install(
        &self,
        subscriber_id: &str,
        installation_key: Option<&str>,
    ) -> Result<String>;

    /// Check on a previously started install request.
    fn install_status(&self, request_id: &str) -> Result<InstallStatus>;

    /// Deploy a source directory's metadata. Blocks until the deploy
    /// finishes; source deploys are fast and synchronous in the CLI.
    fn deploy_source(&self, source_dir: &Path) -> Result<()>;
}
