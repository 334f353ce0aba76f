//! Graph error types and diagnostics.

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Error during graph construction or traversal.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("cycle detected in package dependencies")]
    CycleDetected { packages: Vec<String> },

    #[error("package not found: `{package}`")]
    PackageNotFound {
        package: String,
        suggestions: Vec<String>,
    },
}

impl GraphError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GraphError::CycleDetected { packages } => {
                let mut diag = Diagnostic::error("cycle detected in package dependencies");

                if !packages.is_empty() {
                    diag = diag.with_context(format!("cycle: {}", packages.join(" -> ")));
                }

                diag.with_suggestion(
                    "Break the cycle by removing one of the dependencies".to_string(),
                )
            }

            GraphError::PackageNotFound {
                package,
                suggestions,
            } => {
                let mut diag =
                    Diagnostic::error(format!("no package named `{}` in this project", package));

                if !suggestions.is_empty() {
                    diag = diag.with_context(format!("did you mean: {}?", suggestions.join(", ")));
                }

                diag.with_suggestion(
                    "Run `quay tree` to list the packages declared in sfdx-project.json"
                        .to_string(),
                )
            }
        }
    }
}
