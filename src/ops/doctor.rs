//! Environment health checks.
//!
//! The `doctor` command performs fast environment checks to verify
//! that the tools the org commands shell out to are available and that
//! the current project, if any, is in a workable state.
//!
//! ## Usage
//!
//! ```bash
//! quay doctor           # Quick check
//! quay doctor --verbose # Detailed output
//! quay doctor --offline # Skip org reachability
//! ```
//!
//! ## Checks Performed
//!
//! - `sf` CLI availability and version (`sfdx` accepted as fallback)
//! - Project manifest parse
//! - Package directories on disk
//! - Git repository presence (optional)
//! - Default org configured and reachable (optional)

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::core::{DxProject, PROJECT_FILE};
use crate::git::GitWorkspace;
use crate::org::sf_cli::{cli_version, SfCli};
use crate::util::process::ProcessBuilder;
use crate::util::{Config, GlobalContext};

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool or file (if applicable)
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    pub version: Option<String>,

    /// How long the check took
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: false,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the tool or file path.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,

    /// Total time taken
    pub total_duration: Duration,

    /// Environment information
    pub environment: HashMap<String, String>,
}

impl DoctorReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        DoctorReport {
            checks: Vec::new(),
            total_duration: Duration::ZERO,
            environment: HashMap::new(),
        }
    }

    /// Add a check result.
    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    /// Get the count of passed checks.
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get the count of failed checks.
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Get the count of required failed checks.
    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

impl Default for DoctorReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for the doctor command.
#[derive(Debug, Clone, Default)]
pub struct DoctorOptions {
    /// Include verbose output
    pub verbose: bool,

    /// Skip the org reachability probe
    pub offline: bool,
}

/// Run the doctor command.
pub fn doctor(options: DoctorOptions) -> Result<DoctorReport> {
    let start = Instant::now();
    let mut report = DoctorReport::new();

    let ctx = GlobalContext::new()?;
    let config = ctx.load_config();

    // Collect environment info
    report
        .environment
        .insert("os".to_string(), std::env::consts::OS.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());

    // Check sf CLI
    report.add(check_sf_cli(&config));

    // Check the project, when there is one. The manifest check carries
    // the package-directory check with it; without a parsed manifest
    // there is nothing to look for on disk.
    let project = match ctx.find_project() {
        Ok(manifest_path) => {
            let (check, project) = check_manifest(&manifest_path);
            report.add(check);
            project
        }
        Err(_) => {
            report.add(
                CheckResult::fail(
                    "Project manifest",
                    format!(
                        "no {} found in {} or any parent (run `quay new` to create a project)",
                        PROJECT_FILE,
                        ctx.cwd().display()
                    ),
                )
                .optional(),
            );
            None
        }
    };

    if let Some(project) = &project {
        report.add(check_package_dirs(project));
        report.add(check_git(project));
    }

    // Check default org
    report.add(check_default_org(&config, options.offline));

    report.total_duration = start.elapsed();
    Ok(report)
}

/// Check for the sf CLI.
fn check_sf_cli(config: &Config) -> CheckResult {
    let start = Instant::now();

    let binary = match SfCli::discover(config) {
        Ok(binary) => binary,
        Err(e) => {
            return CheckResult::fail("sf CLI", e.to_string()).with_duration(start.elapsed());
        }
    };

    match cli_version(&binary) {
        Ok(version) => CheckResult::pass("sf CLI", format!("Found {}", binary.display()))
            .with_path(binary)
            .with_version(version.to_string())
            .with_duration(start.elapsed()),
        Err(_) => {
            // The binary exists but would not report a version; the org
            // commands will most likely fail the same way.
            CheckResult::fail(
                "sf CLI",
                format!(
                    "{} exists but `--version` did not produce a version",
                    binary.display()
                ),
            )
            .with_path(binary)
            .with_duration(start.elapsed())
        }
    }
}

/// Parse the project manifest.
fn check_manifest(manifest_path: &std::path::Path) -> (CheckResult, Option<DxProject>) {
    let start = Instant::now();

    match DxProject::open(manifest_path) {
        Ok(project) => {
            let packages = project.manifest().packages().len();
            let check = CheckResult::pass(
                "Project manifest",
                format!("{} package directories", packages),
            )
            .with_path(manifest_path.to_path_buf())
            .with_duration(start.elapsed());
            (check, Some(project))
        }
        Err(e) => {
            let check = CheckResult::fail("Project manifest", format!("{:#}", e))
                .with_path(manifest_path.to_path_buf())
                .with_duration(start.elapsed());
            (check, None)
        }
    }
}

/// Every declared package directory exists on disk.
fn check_package_dirs(project: &DxProject) -> CheckResult {
    let start = Instant::now();

    let missing: Vec<String> = project
        .manifest()
        .packages()
        .iter()
        .filter(|entry| !project.package_dir(entry).is_dir())
        .map(|entry| entry.path.display().to_string())
        .collect();

    if missing.is_empty() {
        CheckResult::pass("Package directories", "all declared directories exist")
            .with_duration(start.elapsed())
    } else {
        CheckResult::fail(
            "Package directories",
            format!("missing on disk: {}", missing.join(", ")),
        )
        .with_duration(start.elapsed())
    }
}

/// Check for a git repository.
fn check_git(project: &DxProject) -> CheckResult {
    let start = Instant::now();

    if GitWorkspace::is_available(project.root()) {
        CheckResult::pass("Git repository", "project is inside a git repository")
            .with_duration(start.elapsed())
            .optional()
    } else {
        CheckResult::fail(
            "Git repository",
            "no git repository found (`quay changed` and `validate --base` need one)",
        )
        .with_duration(start.elapsed())
        .optional()
    }
}

/// Check for a configured default org and, unless offline, probe it.
fn check_default_org(config: &Config, offline: bool) -> CheckResult {
    let start = Instant::now();

    let Some(alias) = &config.install.default_org else {
        return CheckResult::fail(
            "Default org",
            "no default org configured (set install.default_org or pass --org)",
        )
        .with_duration(start.elapsed())
        .optional();
    };

    if offline {
        return CheckResult::pass("Default org", format!("`{}` (not probed, offline)", alias))
            .with_duration(start.elapsed())
            .optional();
    }

    let Ok(binary) = SfCli::discover(config) else {
        return CheckResult::fail(
            "Default org",
            format!("`{}` configured but the sf CLI is missing", alias),
        )
        .with_duration(start.elapsed())
        .optional();
    };

    match probe_org(&binary, alias) {
        Ok(()) => CheckResult::pass("Default org", format!("`{}` is reachable", alias))
            .with_duration(start.elapsed())
            .optional(),
        Err(e) => CheckResult::fail("Default org", format!("`{}`: {:#}", alias, e))
            .with_duration(start.elapsed())
            .optional(),
    }
}

/// One round trip to the org. `org display` is the cheapest command
/// that authenticates.
fn probe_org(binary: &std::path::Path, alias: &str) -> Result<()> {
    let output = ProcessBuilder::new(binary)
        .args(["org", "display", "--target-org", alias, "--json"])
        .exec()?;

    if output.status.success() {
        Ok(())
    } else {
        anyhow::bail!("org is not authenticated or not reachable")
    }
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    use std::fmt::Write;

    let mut output = String::new();

    writeln!(output, "Quay Doctor").unwrap();
    writeln!(output, "===========\n").unwrap();

    // Environment
    if verbose {
        writeln!(output, "Environment:").unwrap();
        writeln!(
            output,
            "  OS: {} ({})",
            report
                .environment
                .get("os")
                .unwrap_or(&"unknown".to_string()),
            report
                .environment
                .get("arch")
                .unwrap_or(&"unknown".to_string())
        )
        .unwrap();
        writeln!(output).unwrap();
    }

    // Checks
    writeln!(output, "Checks:").unwrap();
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };

        writeln!(output, "  {} {}{}", status, check.name, required).unwrap();

        if verbose || !check.passed {
            writeln!(output, "      {}", check.message).unwrap();
        }
        if verbose {
            if let Some(path) = &check.path {
                writeln!(output, "      Path: {}", path.display()).unwrap();
            }
            if let Some(version) = &check.version {
                writeln!(output, "      Version: {}", version).unwrap();
            }
        }
    }

    writeln!(output).unwrap();

    // Summary
    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();

    writeln!(output, "Summary: {} passed, {} failed", passed, failed).unwrap();

    if required_failed > 0 {
        writeln!(
            output,
            "\nWarning: {} required check(s) failed. Org commands will not work.",
            required_failed
        )
        .unwrap();
    } else if failed > 0 {
        writeln!(
            output,
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        )
        .unwrap();
    } else {
        writeln!(output, "\nAll checks passed. Quay is ready to use.").unwrap();
    }

    output
}
