//! Test utilities and mocks for Quay unit tests.
//!
//! The centerpiece is [`MockOrgClient`], a scripted stand-in for the
//! vendor CLI: tests enqueue install requests with a status sequence and
//! assert on the recorded calls afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use quay::test_support::{installed_package, MockOrgClient};
//! use quay::org::InstallStatus;
//!
//! #[test]
//! fn test_example() {
//!     let org = MockOrgClient::new("dev")
//!         .with_installed(installed_package("expense-core", "04t6F000000N2ZvQAK", "1.4.0.3"))
//!         .expect_install("0Hf000000000001", vec![InstallStatus::InProgress, InstallStatus::Succeeded]);
//!
//!     // Drive the code under test, then:
//!     org.verify();
//! }
//! ```

pub mod fixtures;

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::core::PackageVersion;
use crate::org::{InstallStatus, InstalledPackage, OrgClient};

pub use fixtures::{create_test_project, THREE_PACKAGE_MANIFEST};

/// A call recorded by [`MockOrgClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum OrgCall {
    InstalledPackages,
    StartInstall {
        subscriber_id: String,
        installation_key: Option<String>,
    },
    InstallStatus {
        request_id: String,
    },
    DeploySource {
        path: PathBuf,
    },
}

/// Scripted [`OrgClient`] implementation.
///
/// `start_install` hands out the scripted request ids in order;
/// `install_status` replays that request's status sequence, repeating
/// the final status once the sequence is exhausted (a terminal status
/// stays terminal no matter how often it is polled).
pub struct MockOrgClient {
    org: String,
    installed: Vec<InstalledPackage>,
    requests: Mutex<VecDeque<String>>,
    statuses: Mutex<HashMap<String, VecDeque<InstallStatus>>>,
    fail_deploys: bool,
    calls: Mutex<Vec<OrgCall>>,
}

impl MockOrgClient {
    pub fn new(org: impl Into<String>) -> Self {
        MockOrgClient {
            org: org.into(),
            installed: Vec::new(),
            requests: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(HashMap::new()),
            fail_deploys: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Add a package to the org's installed list.
    pub fn with_installed(mut self, package: InstalledPackage) -> Self {
        self.installed.push(package);
        self
    }

    /// Script the next install: the request id to hand out and the
    /// status sequence its polls will see.
    pub fn expect_install(self, request_id: &str, script: Vec<InstallStatus>) -> Self {
        self.requests.lock().unwrap().push_back(request_id.to_string());
        self.statuses
            .lock()
            .unwrap()
            .insert(request_id.to_string(), script.into());
        self
    }

    /// Make every deploy_source call fail.
    pub fn failing_deploys(mut self) -> Self {
        self.fail_deploys = true;
        self
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<OrgCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Panic if a scripted install was never started.
    pub fn verify(&self) {
        let pending = self.requests.lock().unwrap();
        assert!(
            pending.is_empty(),
            "scripted installs never started: {:?}",
            pending
        );
    }

    fn record(&self, call: OrgCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl OrgClient for MockOrgClient {
    fn org(&self) -> &str {
        &self.org
    }

    fn installed_packages(&self) -> Result<Vec<InstalledPackage>> {
        self.record(OrgCall::InstalledPackages);
        Ok(self.installed.clone())
    }

    fn start_install(
        &self,
        subscriber_id: &str,
        installation_key: Option<&str>,
    ) -> Result<String> {
        self.record(OrgCall::StartInstall {
            subscriber_id: subscriber_id.to_string(),
            installation_key: installation_key.map(|k| k.to_string()),
        });

        match self.requests.lock().unwrap().pop_front() {
            Some(request_id) => Ok(request_id),
            None => bail!("unexpected start_install for `{}`", subscriber_id),
        }
    }

    fn install_status(&self, request_id: &str) -> Result<InstallStatus> {
        self.record(OrgCall::InstallStatus {
            request_id: request_id.to_string(),
        });

        let mut statuses = self.statuses.lock().unwrap();
        let Some(script) = statuses.get_mut(request_id) else {
            bail!("unknown request id `{}`", request_id);
        };
        match script.len() {
            0 => bail!("status script for `{}` is empty", request_id),
            1 => Ok(script.front().cloned().unwrap()),
            _ => Ok(script.pop_front().unwrap()),
        }
    }

    fn deploy_source(&self, source_dir: &Path) -> Result<()> {
        self.record(OrgCall::DeploySource {
            path: source_dir.to_path_buf(),
        });

        if self.fail_deploys {
            bail!("deploy of `{}` failed", source_dir.display());
        }
        Ok(())
    }
}

/// Build an [`InstalledPackage`] record the way the org would report it.
pub fn installed_package(name: &str, version_id: &str, version: &str) -> InstalledPackage {
    InstalledPackage {
        name: Some(name.to_string()),
        namespace: None,
        version_id: version_id.to_string(),
        version: PackageVersion::parse(version).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_org_scripted_install() {
        let org = MockOrgClient::new("dev").expect_install(
            "0Hf000000000001",
            vec![InstallStatus::InProgress, InstallStatus::Succeeded],
        );

        let request_id = org.start_install("04t6F000000N2ZvQAK", None).unwrap();
        assert_eq!(request_id, "0Hf000000000001");

        assert_eq!(
            org.install_status(&request_id).unwrap(),
            InstallStatus::InProgress
        );
        assert_eq!(
            org.install_status(&request_id).unwrap(),
            InstallStatus::Succeeded
        );
        // Terminal status repeats.
        assert_eq!(
            org.install_status(&request_id).unwrap(),
            InstallStatus::Succeeded
        );

        org.verify();
    }

    #[test]
    fn test_mock_org_rejects_unscripted_install() {
        let org = MockOrgClient::new("dev");
        assert!(org.start_install("04t6F000000N2ZvQAK", None).is_err());
    }

    #[test]
    fn test_mock_org_records_calls() {
        let org = MockOrgClient::new("dev");
        org.installed_packages().unwrap();
        org.deploy_source(Path::new("unpackaged/config")).unwrap();

        assert_eq!(
            org.calls(),
            vec![
                OrgCall::InstalledPackages,
                OrgCall::DeploySource {
                    path: PathBuf::from("unpackaged/config")
                },
            ]
        );
    }

    #[test]
    fn test_failing_deploys() {
        let org = MockOrgClient::new("dev").failing_deploys();
        assert!(org.deploy_source(Path::new("x")).is_err());
    }
}
