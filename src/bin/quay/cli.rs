//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Quay - package lifecycle automation for Salesforce DX projects
#[derive(Parser)]
#[command(name = "quay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new DX project
    New(NewArgs),

    /// Initialize a DX project in an existing directory
    Init(InitArgs),

    /// Validate sfdx-project.json and the working tree
    Validate(ValidateArgs),

    /// Display the package dependency tree
    Tree(TreeArgs),

    /// Explain why a package is in the dependency graph
    Explain(ExplainArgs),

    /// Compute the install order for an org
    Plan(PlanArgs),

    /// Install packages and deploy source to an org
    Install(InstallArgs),

    /// Report or bump package versions
    Version(VersionArgs),

    /// List packages impacted by changes since a git ref
    Changed(ChangedArgs),

    /// Package a directory into a distributable archive
    Pack(PackArgs),

    /// Check the environment for required tooling
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct NewArgs {
    /// Project name
    pub name: String,

    /// Directory to create the project in (defaults to name)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct InitArgs {
    /// Project name (defaults to directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Directory to initialize (defaults to current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Git ref to compare package versions against
    #[arg(long)]
    pub base: Option<String>,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,

    /// Output format: human, json, or github
    #[arg(long, default_value = "human")]
    pub output_format: String,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Package to show the tree for (defaults to all roots)
    pub package: Option<String>,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct ExplainArgs {
    /// Package to explain
    pub package: String,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Target org alias or username
    #[arg(short, long)]
    pub org: Option<String>,

    /// Compute the order without querying any org
    #[arg(long)]
    pub offline: bool,

    /// Release definition YAML
    #[arg(long)]
    pub release: Option<PathBuf>,

    /// Restrict the plan to these packages and their dependencies
    #[arg(short, long)]
    pub packages: Vec<String>,

    /// Emit the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct InstallArgs {
    /// Target org alias or username
    #[arg(short, long)]
    pub org: Option<String>,

    /// Release definition YAML
    #[arg(long)]
    pub release: Option<PathBuf>,

    /// Restrict the install to these packages and their dependencies
    #[arg(short, long)]
    pub packages: Vec<String>,

    /// Show the plan without executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Continue past failed steps
    #[arg(long)]
    pub keep_going: bool,

    /// Minutes to wait for a single package install
    #[arg(long)]
    pub wait: Option<u64>,

    /// Seconds between install status polls
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct VersionArgs {
    #[command(subcommand)]
    pub command: VersionCommands,
}

#[derive(Subcommand)]
pub enum VersionCommands {
    /// Show package versions and dependency pins
    Report,

    /// Bump a package's version
    Bump(BumpArgs),
}

#[derive(Args)]
pub struct BumpArgs {
    /// Package to bump
    #[arg(short, long)]
    pub package: String,

    /// Bump the major version
    #[arg(long, conflicts_with_all = ["minor", "patch", "build"])]
    pub major: bool,

    /// Bump the minor version
    #[arg(long, conflicts_with_all = ["major", "patch", "build"])]
    pub minor: bool,

    /// Bump the patch version
    #[arg(long, conflicts_with_all = ["major", "minor", "build"])]
    pub patch: bool,

    /// Bump the build number
    #[arg(long, conflicts_with_all = ["major", "minor", "patch"])]
    pub build: bool,

    /// Also raise sibling dependency pins to the new version
    #[arg(long)]
    pub sync_deps: bool,
}

#[derive(Args)]
pub struct ChangedArgs {
    /// Git ref to diff against
    #[arg(long)]
    pub base: String,

    /// Also list transitive dependents of changed packages
    #[arg(long)]
    pub include_dependents: bool,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PackArgs {
    /// Package to pack
    pub package: String,

    /// Output directory (defaults to .quay/dist)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct DoctorArgs {
    /// Skip the org reachability probe
    #[arg(long)]
    pub offline: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
