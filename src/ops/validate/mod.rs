//! Project validation.
//!
//! The `validate` command checks `sfdx-project.json` and the working
//! tree against the rules the install and release pipelines assume.
//! Every rule has a stable code so CI can filter on it.
//!
//! ## Usage
//!
//! ```bash
//! quay validate                        # Validate the current project
//! quay validate --strict               # Treat warnings as errors
//! quay validate --base origin/main     # Also check version bumps against a ref
//! quay validate --output-format json   # Machine-readable output
//! ```
//!
//! ## Rules
//!
//! - QV001 duplicate package name
//! - QV002 package directory missing on disk
//! - QV003 missing or unparseable versionNumber
//! - QV004 `LATEST` as a package's own version
//! - QV005 unknown dependency
//! - QV006 dependency declared after its dependent
//! - QV007 transitive dependency not listed
//! - QV008 dependency pinned at diverging versions
//! - QV009 pin exceeds the sibling's declared version
//! - QV010 dependency cycle
//! - QV011 zero or multiple default directories
//! - QV012 self-dependency
//! - QV013 bad packageAliases value
//! - QV014 changed package without a version bump (needs `--base`)
//! - QV015 bad sfdcLoginUrl
//!
//! ## Output Formats
//!
//! - `human`: Default human-readable output
//! - `json`: Machine-readable JSON output
//! - `github`: GitHub Actions annotations with job summary

mod checks;
mod format;
mod types;

use anyhow::Result;

use crate::core::{DxProject, PROJECT_FILE};
use crate::graph::PackageGraph;

// Re-export public types
pub use self::format::{format_report, format_report_for_output, format_report_json};
pub use self::types::{
    Finding, FindingCode, OutputFormat, OutputFormatParseError, Severity, ValidateOptions,
    ValidateReport,
};

use self::checks::run_checks;

/// Validate a project according to the options.
///
/// The report carries every finding; callers decide the exit code from
/// [`ValidateReport::passed`].
pub fn validate(options: &ValidateOptions, project: &DxProject) -> Result<ValidateReport> {
    let graph = PackageGraph::from_manifest(project.manifest());
    let mut findings = run_checks(project, &graph, options)?;

    if options.strict {
        for finding in &mut findings {
            finding.severity = Severity::Error;
        }
    }

    let mut report = ValidateReport::new(PROJECT_FILE, project.manifest().packages().len());
    for finding in findings {
        report.add(finding);
    }

    tracing::debug!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "validation finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project_with(tmp: &TempDir, json: &str) -> DxProject {
        let path = tmp.path().join(PROJECT_FILE);
        std::fs::write(&path, json).unwrap();
        let project = DxProject::open(&path).unwrap();
        for entry in project.manifest().packages() {
            std::fs::create_dir_all(project.package_dir(entry)).unwrap();
        }
        project
    }

    // One warning (no default directory), no errors.
    const WARN_ONLY: &str = r#"{
  "packageDirectories": [
    { "path": "pkgs/a", "package": "a", "versionNumber": "1.0.0.NEXT" }
  ]
}"#;

    #[test]
    fn test_strict_promotes_warnings() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(&tmp, WARN_ONLY);

        let report = validate(&ValidateOptions::default(), &project).unwrap();
        assert!(report.passed);
        assert_eq!(report.warning_count(), 1);

        let strict = ValidateOptions {
            strict: true,
            ..Default::default()
        };
        let report = validate(&strict, &project).unwrap();
        assert!(!report.passed);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 0);
    }

    #[test]
    fn test_human_format_shows_findings() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(&tmp, WARN_ONLY);
        let report = validate(&ValidateOptions::default(), &project).unwrap();

        let text = format_report(&report, false);
        assert!(text.contains("Validate: sfdx-project.json (1 packages)"));
        assert!(text.contains("[WARN] QV011"));
        assert!(text.contains("Result: PASSED (errors: 0, warnings: 1)"));
    }

    #[test]
    fn test_json_format_round_trips() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(&tmp, WARN_ONLY);
        let report = validate(&ValidateOptions::default(), &project).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&format_report_json(&report)).unwrap();
        assert_eq!(value["passed"], true);
        assert_eq!(value["findings"][0]["code"], "QV011");
    }

    #[test]
    fn test_github_format_annotations() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(&tmp, WARN_ONLY);
        let report = validate(&ValidateOptions::default(), &project).unwrap();

        let text = format_report_for_output(&report, OutputFormat::Github, false);
        assert!(text.contains("::warning file=sfdx-project.json,title=QV011::"));
        assert!(text.contains("::group::Validation Summary"));
        assert!(text.contains("::endgroup::"));
    }
}
