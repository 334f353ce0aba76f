//! The vendor `sf` CLI adapter.
//!
//! Every command is run with `--json`, which wraps the payload in an
//! envelope: `{"status": 0, "result": ...}` on success, with `message`
//! and `name` describing the failure otherwise. The CLI exits non-zero
//! on failure but still prints the envelope, so errors are read from the
//! envelope first and raw stderr only as a fallback.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::core::version::PackageVersion;
use crate::org::{InstallStatus, InstalledPackage, OrgClient};
use crate::util::config::Config;
use crate::util::diagnostic::SfCliMissingError;
use crate::util::process::{find_executable, ProcessBuilder};

/// Org client backed by the `sf` executable.
#[derive(Debug, Clone)]
pub struct SfCli {
    binary: PathBuf,
    org: String,
}

impl SfCli {
    /// Create a client for a known binary and target org.
    pub fn new(binary: impl Into<PathBuf>, org: impl Into<String>) -> Self {
        SfCli {
            binary: binary.into(),
            org: org.into(),
        }
    }

    /// Locate the CLI binary.
    ///
    /// A configured `sf.binary` wins when the file exists; otherwise
    /// `sf` and the legacy `sfdx` are searched on PATH.
    pub fn discover(config: &Config) -> Result<PathBuf, SfCliMissingError> {
        let mut searched = Vec::new();

        if let Some(configured) = &config.sf.binary {
            if configured.exists() {
                return Ok(configured.clone());
            }
            searched.push(configured.display().to_string());
        }

        for name in ["sf", "sfdx"] {
            if let Some(path) = find_executable(name) {
                return Ok(path);
            }
            searched.push(name.to_string());
        }

        Err(SfCliMissingError { searched })
    }

    /// The binary this client runs.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run a CLI command and unwrap the JSON envelope.
    fn run_json(&self, args: &[&str]) -> Result<Value> {
        let builder = ProcessBuilder::new(&self.binary)
            .args(args)
            .arg("--json")
            .env("SF_SKIP_NEW_VERSION_CHECK", "true");

        tracing::debug!("running {}", builder.display_command());
        let output = builder.exec()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let envelope: Envelope = match serde_json::from_str(stdout.trim()) {
            Ok(envelope) => envelope,
            Err(_) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                bail!(
                    "`{}` produced no JSON envelope\n{}",
                    builder.display_command(),
                    stderr.trim()
                );
            }
        };

        if envelope.status != 0 {
            let name = envelope.name.unwrap_or_else(|| "CliError".to_string());
            let message = envelope
                .message
                .unwrap_or_else(|| "no error message".to_string());
            bail!("sf {} failed: {} ({})", args.join(" "), message, name);
        }

        Ok(envelope.result)
    }
}

impl OrgClient for SfCli {
    fn org(&self) -> &str {
        &self.org
    }

    fn installed_packages(&self) -> Result<Vec<InstalledPackage>> {
        let result = self.run_json(&[
            "package",
            "installed",
            "list",
            "--target-org",
            self.org.as_str(),
        ])?;

        let records: Vec<InstalledRecord> = serde_json::from_value(result)
            .context("unexpected payload from `sf package installed list`")?;

        Ok(records.into_iter().map(InstalledRecord::cook).collect())
    }

    fn start_install(
        &self,
        subscriber_id: &str,
        installation_key: Option<&str>,
    ) -> Result<String> {
        let mut args = vec![
            "package",
            "install",
            "--package",
            subscriber_id,
            "--target-org",
            self.org.as_str(),
            "--wait",
            "0",
            "--no-prompt",
        ];

        if let Some(key) = installation_key {
            args.push("--installation-key");
            args.push(key);
        }

        let result = self.run_json(&args)?;
        let record: InstallRequestRecord = serde_json::from_value(result)
            .context("unexpected payload from `sf package install`")?;

        Ok(record.id)
    }

    fn install_status(&self, request_id: &str) -> Result<InstallStatus> {
        let result = self.run_json(&[
            "package",
            "install",
            "report",
            "--request-id",
            request_id,
            "--target-org",
            self.org.as_str(),
        ])?;

        let record: InstallRequestRecord = serde_json::from_value(result)
            .context("unexpected payload from `sf package install report`")?;

        Ok(record.cook_status())
    }

    fn deploy_source(&self, source_dir: &Path) -> Result<()> {
        let dir = source_dir.display().to_string();
        self.run_json(&[
            "project",
            "deploy",
            "start",
            "--source-dir",
            dir.as_str(),
            "--target-org",
            self.org.as_str(),
        ])?;
        Ok(())
    }
}

/// Probe the CLI's own version, for environment checks.
pub fn cli_version(binary: &Path) -> Result<semver::Version> {
    let output = ProcessBuilder::new(binary).arg("--version").exec_and_check()?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    parse_cli_version(&stdout)
        .with_context(|| format!("could not read a version from `{} --version`", binary.display()))
}

fn parse_cli_version(output: &str) -> Option<semver::Version> {
    // "@salesforce/cli/2.56.7 linux-x64 node-v20.15.1"
    let re = regex::Regex::new(r"cli/(\d+\.\d+\.\d+)").ok()?;
    let caps = re.captures(output)?;
    semver::Version::parse(&caps[1]).ok()
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: i64,

    #[serde(default)]
    result: Value,

    #[serde(default)]
    message: Option<String>,

    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstalledRecord {
    #[serde(default)]
    subscriber_package_name: Option<String>,

    #[serde(default)]
    subscriber_package_namespace: Option<String>,

    subscriber_package_version_id: String,

    #[serde(default)]
    subscriber_package_version_number: Option<String>,
}

impl InstalledRecord {
    fn cook(self) -> InstalledPackage {
        let version = self
            .subscriber_package_version_number
            .as_deref()
            .and_then(|v| PackageVersion::parse(v).ok());

        InstalledPackage {
            name: self.subscriber_package_name,
            namespace: self.subscriber_package_namespace,
            version_id: self.subscriber_package_version_id,
            version,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstallRequestRecord {
    id: String,

    #[serde(default)]
    status: Option<String>,

    #[serde(default)]
    errors: Option<Value>,
}

impl InstallRequestRecord {
    fn cook_status(&self) -> InstallStatus {
        match self.status.as_deref() {
            Some("SUCCESS") => InstallStatus::Succeeded,
            Some("ERROR") => InstallStatus::Failed(flatten_errors(self.errors.as_ref())),
            Some("IN_PROGRESS") => InstallStatus::InProgress,
            _ => InstallStatus::Queued,
        }
    }
}

/// Collapse the CLI's nested error payload into one line.
fn flatten_errors(errors: Option<&Value>) -> String {
    let Some(errors) = errors else {
        return "install failed with no error detail".to_string();
    };

    let list = errors
        .get("errors")
        .and_then(Value::as_array)
        .or_else(|| errors.as_array());

    let Some(list) = list else {
        return errors.to_string();
    };

    let messages: Vec<String> = list
        .iter()
        .map(|e| {
            e.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string())
        })
        .collect();

    if messages.is_empty() {
        "install failed with no error detail".to_string()
    } else {
        messages.join("; ")
    }
}
