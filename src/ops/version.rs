//! Version reporting and bumping.
//!
//! `report` summarizes every package directory's version and pins;
//! `bump` rewrites a package's versionNumber in place, optionally
//! raising sibling pins on it at the same time. All edits go through
//! the manifest's raw document, so unknown fields and key order in
//! `sfdx-project.json` survive the rewrite.

use std::fmt::Write as _;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::core::{BumpPart, DxProject, PackageVersion, ResolvedDependency, PROJECT_FILE};
use crate::util::diagnostic::UnknownPackageError;

/// Snapshot of every package directory's version state.
#[derive(Debug, Serialize)]
pub struct VersionReport {
    pub project_file: String,
    pub packages: Vec<PackageRow>,
}

#[derive(Debug, Serialize)]
pub struct PackageRow {
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<PackageVersion>,
    pub path: String,
    pub default: bool,
    pub dependencies: Vec<DependencyRow>,
}

#[derive(Debug, Serialize)]
pub struct DependencyRow {
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<PackageVersion>,
    /// `local`, a subscriber package version ID, or `unresolved`
    pub resolves_to: String,
}

/// Collect the version report for a project.
pub fn report(project: &DxProject) -> VersionReport {
    let manifest = project.manifest();

    let packages = manifest
        .packages()
        .iter()
        .map(|entry| {
            let dependencies = entry
                .dependencies
                .iter()
                .map(|dep| {
                    let resolves_to = match dep.resolve(manifest) {
                        ResolvedDependency::Local { .. } => "local".to_string(),
                        ResolvedDependency::Subscriber { subscriber_id, .. } => subscriber_id,
                        ResolvedDependency::Unresolved { .. } => "unresolved".to_string(),
                    };
                    DependencyRow {
                        package: dep.package.clone(),
                        version: dep.version.clone(),
                        resolves_to,
                    }
                })
                .collect();

            PackageRow {
                package: entry.label(),
                version: entry.version.clone(),
                path: entry.path.display().to_string(),
                default: entry.is_default,
                dependencies,
            }
        })
        .collect();

    VersionReport {
        project_file: PROJECT_FILE.to_string(),
        packages,
    }
}

impl VersionReport {
    /// Aligned human listing.
    pub fn render(&self) -> String {
        let mut out = String::new();
        writeln!(out, "Package versions: {}", self.project_file).unwrap();
        writeln!(out, "{}", "=".repeat(50)).unwrap();

        let name_width = self
            .packages
            .iter()
            .map(|row| row.package.len())
            .max()
            .unwrap_or(0);

        for row in &self.packages {
            let version = match &row.version {
                Some(v) => v.to_string(),
                None => "(source)".to_string(),
            };
            let mut line = format!("  {:<name_width$}  {}", row.package, version);
            if row.package != row.path {
                line.push_str(&format!("  {}", row.path));
            }
            if row.default {
                line.push_str(" (default)");
            }
            writeln!(out, "{}", line.trim_end()).unwrap();

            for dep in &row.dependencies {
                let pin = match &dep.version {
                    Some(v) => format!(" {}", v),
                    None => String::new(),
                };
                writeln!(
                    out,
                    "      requires {}{} [{}]",
                    dep.package, pin, dep.resolves_to
                )
                .unwrap();
            }
        }

        out
    }
}

/// Options for `quay version bump`.
#[derive(Debug, Clone)]
pub struct BumpOptions {
    pub package: String,
    pub part: BumpPart,
    /// Also raise sibling dependency pins on the bumped package
    pub sync_deps: bool,
}

/// What a bump changed.
#[derive(Debug, Serialize)]
pub struct BumpOutcome {
    pub package: String,
    pub previous: PackageVersion,
    pub next: PackageVersion,
    /// Dependent packages whose pins were raised
    pub synced: Vec<String>,
}

/// Bump a package's versionNumber and write the manifest back.
pub fn bump(project: &mut DxProject, options: &BumpOptions) -> Result<BumpOutcome> {
    let manifest = project.manifest();

    let Some(entry) = manifest.package(&options.package) else {
        let known: Vec<String> = manifest
            .package_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        return Err(UnknownPackageError::with_candidates(
            &options.package,
            known.iter().map(|s| s.as_str()),
        )
        .into());
    };

    let Some(previous) = entry.version.clone() else {
        bail!(
            "package `{}` has no versionNumber to bump",
            options.package
        );
    };
    let next = previous.bump(options.part)?;

    // Pick up sync targets before taking the mutable borrow.
    let sync_targets: Vec<(String, Option<PackageVersion>)> = if options.sync_deps {
        manifest
            .packages()
            .iter()
            .filter(|e| e.name.is_some() && e.label() != options.package)
            .filter_map(|e| {
                e.dependencies
                    .iter()
                    .find(|d| d.package == options.package)
                    .map(|d| (e.label(), d.version.clone()))
            })
            .collect()
    } else {
        Vec::new()
    };

    let manifest = project.manifest_mut();
    manifest.set_package_version(&options.package, &next);

    let mut synced = Vec::new();
    for (dependent, pin) in sync_targets {
        let new_pin = sync_pin(pin.as_ref(), &next);
        if manifest.set_dependency_version(&dependent, &options.package, &new_pin) {
            synced.push(dependent);
        }
    }

    manifest.save()?;
    tracing::info!(
        package = %options.package,
        from = %previous,
        to = %next,
        synced = synced.len(),
        "version bumped"
    );

    Ok(BumpOutcome {
        package: options.package.clone(),
        previous,
        next,
        synced,
    })
}

/// New pin for a dependent: symbolic pins keep their keyword on the
/// bumped base, concrete pins become the bumped version itself.
fn sync_pin(pin: Option<&PackageVersion>, next: &PackageVersion) -> PackageVersion {
    match pin {
        Some(pin) if !pin.is_concrete() => PackageVersion {
            base: next.base.clone(),
            build: pin.build,
        },
        _ => next.clone(),
    }
}
