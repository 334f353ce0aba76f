//! User-friendly diagnostic messages.
//!
//! Every error should carry its root cause, the packages involved, and a
//! suggested fix where one exists.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no project file is found.
    pub const NO_PROJECT: &str = "help: Run `quay init` to create sfdx-project.json here";

    /// Suggestion when a package is not found in the project.
    pub const PACKAGE_NOT_FOUND: &str = "help: Run `quay tree` to see the project's packages";

    /// Suggestion when a dependency cannot be resolved.
    pub const MISSING_DEPENDENCY: &str =
        "help: Declare the package in packageDirectories or add a packageAliases entry";

    /// Suggestion when validation fails.
    pub const VALIDATE_FAILED: &str = "help: Run `quay validate` for the full list of findings";

    /// Suggestion when the vendor CLI is missing.
    pub const NO_SF_CLI: &str =
        "help: Install the Salesforce CLI: npm install --global @salesforce/cli";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
            Severity::Help => write!(f, "help"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
                Severity::Help => "\x1b[1;32mhelp\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
                Severity::Help => "help",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  -> {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// The vendor `sf` CLI could not be located.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("could not locate the Salesforce CLI (`sf` or `sfdx`)")]
#[diagnostic(
    code(quay::org::sf_cli_missing),
    help("Install it with `npm install --global @salesforce/cli`, or set `sf.binary` in ~/.quay/config.toml")
)]
pub struct SfCliMissingError {
    pub searched: Vec<String>,
}

/// A package named on the command line is not part of the project.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("package `{package}` is not declared in sfdx-project.json")]
#[diagnostic(code(quay::project::unknown_package))]
pub struct UnknownPackageError {
    pub package: String,
    #[help]
    pub suggestions: Option<String>,
}

impl UnknownPackageError {
    /// Build the error with a did-you-mean hint drawn from the project's
    /// package names.
    pub fn with_candidates<'a>(
        package: &str,
        candidates: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let lower = package.to_lowercase();
        let near: Vec<&str> = candidates
            .into_iter()
            .filter(|c| {
                let c_lower = c.to_lowercase();
                c_lower.contains(&lower) || lower.contains(&c_lower)
            })
            .collect();

        let suggestions = if near.is_empty() {
            Some(suggestions::PACKAGE_NOT_FOUND.trim_start_matches("help: ").to_string())
        } else {
            Some(format!("did you mean `{}`?", near.join("`, `")))
        };

        UnknownPackageError {
            package: package.to_string(),
            suggestions,
        }
    }
}

/// An install request did not finish inside its polling deadline.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("install of `{package}` did not finish within {waited_secs}s (request {request_id})")]
#[diagnostic(
    code(quay::install::timeout),
    help("The request is still running in the org; check it with `sf package install report --request-id <id>` or raise --wait")
)]
pub struct InstallTimeoutError {
    pub package: String,
    pub request_id: String,
    pub waited_secs: u64,
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
