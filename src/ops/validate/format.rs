//! Output formatting for validation results (human/JSON/GitHub).

use std::fmt::Write as _;

use super::types::{Finding, OutputFormat, Severity, ValidateReport};

/// Format a validation report for display (human-readable).
pub fn format_report(report: &ValidateReport, verbose: bool) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "Validate: {} ({} packages)",
        report.project_file, report.packages_checked
    )
    .unwrap();
    writeln!(output, "{}", "=".repeat(50)).unwrap();
    writeln!(output).unwrap();

    if report.findings.is_empty() {
        writeln!(output, "  [OK] all checks passed").unwrap();
    }
    for finding in &report.findings {
        let status = match finding.severity {
            Severity::Error => "[ERROR]",
            Severity::Warning => "[WARN]",
        };
        writeln!(output, "  {} {} {}", status, finding.code, finding_subject(finding)).unwrap();

        if let Some(remediation) = &finding.remediation {
            if verbose || finding.is_error() {
                writeln!(output, "      fix: {}", remediation).unwrap();
            }
        }
    }

    writeln!(output).unwrap();

    let status = if report.passed { "PASSED" } else { "FAILED" };
    writeln!(
        output,
        "Result: {} (errors: {}, warnings: {})",
        status,
        report.error_count(),
        report.warning_count()
    )
    .unwrap();

    output
}

fn finding_subject(finding: &Finding) -> String {
    match &finding.package {
        Some(package) => format!("{}: {}", package, finding.message),
        None => finding.message.clone(),
    }
}

/// Format a validation report as JSON.
pub fn format_report_json(report: &ValidateReport) -> String {
    serde_json::to_string_pretty(report)
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize report: {}"}}"#, e))
}

/// Format a validation report for GitHub Actions.
///
/// Outputs:
/// - `::error::` and `::warning::` annotations for CI integration
/// - Job summary in markdown format
pub fn format_report_github_actions(report: &ValidateReport) -> String {
    let mut output = String::new();

    for finding in &report.findings {
        // Escape newlines for GitHub Actions annotation format
        let escaped = finding_subject(finding).replace('\n', "%0A").replace('\r', "");
        let kind = match finding.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        writeln!(
            output,
            "::{} file={},title={}::{}",
            kind, report.project_file, finding.code, escaped
        )
        .unwrap();
    }

    // Job summary in markdown format
    writeln!(output, "::group::Validation Summary").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "## {}", report.project_file).unwrap();
    writeln!(output).unwrap();

    if !report.findings.is_empty() {
        writeln!(output, "| Code | Severity | Package | Message |").unwrap();
        writeln!(output, "|------|----------|---------|---------|").unwrap();
        for finding in &report.findings {
            writeln!(
                output,
                "| {} | {} | {} | {} |",
                finding.code,
                finding.severity,
                finding.package.as_deref().unwrap_or("-"),
                finding.message
            )
            .unwrap();
        }
        writeln!(output).unwrap();
    }

    let overall_status = if report.passed { "PASSED" } else { "FAILED" };
    let overall_emoji = if report.passed {
        ":heavy_check_mark:"
    } else {
        ":x:"
    };
    writeln!(
        output,
        "**Result:** {} {} (errors: {}, warnings: {})",
        overall_emoji,
        overall_status,
        report.error_count(),
        report.warning_count()
    )
    .unwrap();
    writeln!(output, "**Packages checked:** {}", report.packages_checked).unwrap();

    writeln!(output, "::endgroup::").unwrap();

    output
}

/// Format the report according to the specified output format.
pub fn format_report_for_output(
    report: &ValidateReport,
    format: OutputFormat,
    verbose: bool,
) -> String {
    match format {
        OutputFormat::Human => format_report(report, verbose),
        OutputFormat::Json => format_report_json(report),
        OutputFormat::Github => format_report_github_actions(report),
    }
}
