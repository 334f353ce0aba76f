//! Public types and enums for the validate module.

use serde::Serialize;

/// Output format for validation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// Machine-readable JSON output
    Json,
    /// GitHub Actions annotations with job summary
    Github,
}

impl std::str::FromStr for OutputFormat {
    type Err = OutputFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            "github" | "github-actions" | "gha" => Ok(OutputFormat::Github),
            _ => Err(OutputFormatParseError(s.to_string())),
        }
    }
}

/// Error parsing output format option.
#[derive(Debug, Clone)]
pub struct OutputFormatParseError(pub String);

impl std::fmt::Display for OutputFormatParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid output format '{}', valid values: human, json, github",
            self.0
        )
    }
}

impl std::error::Error for OutputFormatParseError {}

/// Stable identifier for each validation rule.
///
/// Codes never change meaning between releases; CI configurations key
/// off them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingCode {
    /// Two package directories declare the same package name.
    DuplicatePackageName,
    /// A package directory path does not exist on disk.
    MissingDirectory,
    /// A versionNumber is missing or does not parse.
    InvalidVersion,
    /// `LATEST` used as a package's own versionNumber.
    LatestOwnVersion,
    /// A dependency names neither a sibling package nor an alias.
    UnknownDependency,
    /// A dependency is declared after the package that needs it.
    DeclarationOrder,
    /// A transitive dependency is not listed directly.
    MissingTransitive,
    /// Sibling packages pin the same dependency at different versions.
    VersionDivergence,
    /// A dependency pin exceeds the sibling's declared version.
    PinExceedsDeclared,
    /// The dependency graph has a cycle.
    DependencyCycle,
    /// Zero or multiple default package directories.
    DefaultDirectories,
    /// A package depends on itself.
    SelfDependency,
    /// An alias value is not a Salesforce package ID.
    InvalidAliasId,
    /// A package changed since the base ref without a version bump.
    UnbumpedChange,
    /// sfdcLoginUrl is not a usable login URL.
    InvalidLoginUrl,
}

impl FindingCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCode::DuplicatePackageName => "QV001",
            FindingCode::MissingDirectory => "QV002",
            FindingCode::InvalidVersion => "QV003",
            FindingCode::LatestOwnVersion => "QV004",
            FindingCode::UnknownDependency => "QV005",
            FindingCode::DeclarationOrder => "QV006",
            FindingCode::MissingTransitive => "QV007",
            FindingCode::VersionDivergence => "QV008",
            FindingCode::PinExceedsDeclared => "QV009",
            FindingCode::DependencyCycle => "QV010",
            FindingCode::DefaultDirectories => "QV011",
            FindingCode::SelfDependency => "QV012",
            FindingCode::InvalidAliasId => "QV013",
            FindingCode::UnbumpedChange => "QV014",
            FindingCode::InvalidLoginUrl => "QV015",
        }
    }

    /// The severity this rule carries before `--strict` promotion.
    pub fn default_severity(&self) -> Severity {
        match self {
            FindingCode::MissingTransitive
            | FindingCode::VersionDivergence
            | FindingCode::DefaultDirectories
            | FindingCode::UnbumpedChange
            | FindingCode::InvalidLoginUrl => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl std::fmt::Display for FindingCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FindingCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Finding severity. `--strict` promotes warnings to errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One validation finding.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    /// Rule code (stable across releases)
    pub code: FindingCode,

    /// Severity after any `--strict` promotion
    pub severity: Severity,

    /// The package (or directory label) the finding is about, when
    /// attributable to one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// What is wrong
    pub message: String,

    /// How to fix it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Finding {
    /// Create a finding at the rule's default severity.
    pub fn new(code: FindingCode, package: Option<String>, message: impl Into<String>) -> Self {
        Finding {
            code,
            severity: code.default_severity(),
            package,
            message: message.into(),
            remediation: None,
        }
    }

    /// Attach remediation text.
    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Complete validation result for one project.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateReport {
    /// Manifest file the findings refer to
    pub project_file: String,

    /// How many packageDirectories entries were checked
    pub packages_checked: usize,

    /// Individual findings, in rule order
    pub findings: Vec<Finding>,

    /// Whether validation passed (no error-severity findings)
    pub passed: bool,
}

impl ValidateReport {
    pub fn new(project_file: impl Into<String>, packages_checked: usize) -> Self {
        ValidateReport {
            project_file: project_file.into(),
            packages_checked,
            findings: Vec::new(),
            passed: true,
        }
    }

    /// Add a finding.
    pub fn add(&mut self, finding: Finding) {
        if finding.is_error() {
            self.passed = false;
        }
        self.findings.push(finding);
    }

    pub fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings.iter().filter(|f| !f.is_error()).count()
    }

    /// Findings for one package label.
    pub fn for_package(&self, package: &str) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| f.package.as_deref() == Some(package))
            .collect()
    }
}

/// Options for the validate command.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Git ref to compare versions against (enables the unbumped-change
    /// rule)
    pub base: Option<String>,

    /// Promote warnings to errors
    pub strict: bool,

    /// Verbose output
    pub verbose: bool,

    /// Output format (human, json, github)
    pub output_format: OutputFormat,
}
