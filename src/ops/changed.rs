//! Impacted package analysis.
//!
//! Maps a git diff back onto package directories to answer "what has to
//! be re-released since `<ref>`". Each package directory gets its own
//! scoped diff, fanned out across a rayon pool; a diff failure in one
//! package is recorded in the report instead of aborting the others.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;

use crate::core::{DxProject, PackageVersion};
use crate::git::GitWorkspace;
use crate::graph::PackageGraph;

/// Options for `quay changed`.
#[derive(Debug, Clone)]
pub struct ChangedOptions {
    /// Git revision to diff against
    pub base: String,
    /// Also list transitive dependents of changed packages
    pub include_dependents: bool,
}

impl Default for ChangedOptions {
    fn default() -> Self {
        ChangedOptions {
            base: "HEAD".to_string(),
            include_dependents: false,
        }
    }
}

/// What changed since the base revision, by package.
#[derive(Debug, Serialize)]
pub struct ImpactReport {
    pub base: String,
    pub changed: Vec<ChangedPackage>,
    /// Unchanged packages that depend on a changed one
    pub dependents: Vec<String>,
    /// Changed files belonging to no package directory
    pub unowned: Vec<String>,
    /// Packages whose diff could not be computed
    pub failures: Vec<PackageFailure>,
}

#[derive(Debug, Serialize)]
pub struct ChangedPackage {
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<PackageVersion>,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PackageFailure {
    pub package: String,
    pub error: String,
}

/// Compute the impact report for a project.
pub fn changed(project: &DxProject, options: &ChangedOptions) -> Result<ImpactReport> {
    let root = project.root();
    let manifest = project.manifest();
    let forceignore = project.forceignore()?;

    // One up-front diff validates the revision and finds files outside
    // any package directory.
    let workspace = GitWorkspace::open(root)?;
    let all_changed = workspace.changed_files(&options.base)?;
    drop(workspace);

    let unowned: Vec<String> = all_changed
        .iter()
        .filter(|path| !forceignore.is_ignored(path))
        .filter(|path| project.package_for_path(path).is_none())
        .map(|path| path.display().to_string())
        .collect();

    // libgit2 handles are not Sync, so every worker opens its own.
    let scoped: Vec<(String, Result<Vec<PathBuf>>)> = manifest
        .packages()
        .par_iter()
        .map(|entry| {
            let files = GitWorkspace::open(root)
                .and_then(|ws| ws.changed_files_in(&options.base, &entry.path));
            (entry.label(), files)
        })
        .collect();

    let mut report = ImpactReport {
        base: options.base.clone(),
        changed: Vec::new(),
        dependents: Vec::new(),
        unowned,
        failures: Vec::new(),
    };

    for (entry, (label, outcome)) in manifest.packages().iter().zip(scoped) {
        match outcome {
            Ok(files) => {
                let mut files: Vec<String> = files
                    .iter()
                    .filter(|path| !forceignore.is_ignored(path))
                    .map(|path| path.display().to_string())
                    .collect();
                if files.is_empty() {
                    continue;
                }
                files.sort();
                report.changed.push(ChangedPackage {
                    package: label,
                    version: entry.version.clone(),
                    files,
                });
            }
            Err(err) => report.failures.push(PackageFailure {
                package: label,
                error: format!("{:#}", err),
            }),
        }
    }

    if options.include_dependents {
        let graph = PackageGraph::from_manifest(manifest);
        let changed_names: BTreeSet<&str> =
            report.changed.iter().map(|c| c.package.as_str()).collect();

        let mut dependents = BTreeSet::new();
        for name in &changed_names {
            for id in graph.transitive_dependents(name) {
                if !changed_names.contains(id.name().as_str()) {
                    dependents.insert(id.name().to_string());
                }
            }
        }
        report.dependents = dependents.into_iter().collect();
    }

    tracing::debug!(
        changed = report.changed.len(),
        dependents = report.dependents.len(),
        failures = report.failures.len(),
        "impact analysis finished"
    );
    Ok(report)
}

impl ImpactReport {
    /// Whether every package diff completed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.unowned.is_empty()
    }

    /// Human listing; `verbose` adds per-file detail.
    pub fn render(&self, verbose: bool) -> String {
        let mut out = String::new();
        writeln!(
            out,
            "Changed since {}: {} package(s)",
            self.base,
            self.changed.len()
        )
        .unwrap();
        writeln!(out, "{}", "=".repeat(50)).unwrap();

        if self.is_empty() && self.failures.is_empty() {
            writeln!(out, "  no changes").unwrap();
            return out;
        }

        for package in &self.changed {
            let version = match &package.version {
                Some(v) => format!(" {}", v),
                None => String::new(),
            };
            writeln!(
                out,
                "  {}{} ({} file(s))",
                package.package,
                version,
                package.files.len()
            )
            .unwrap();
            if verbose {
                for file in &package.files {
                    writeln!(out, "      {}", file).unwrap();
                }
            }
        }

        for failure in &self.failures {
            writeln!(out, "  [ERROR] {}: {}", failure.package, failure.error).unwrap();
        }

        if !self.dependents.is_empty() {
            writeln!(out, "\nDependents needing a release:").unwrap();
            for name in &self.dependents {
                writeln!(out, "  {}", name).unwrap();
            }
        }

        if verbose && !self.unowned.is_empty() {
            writeln!(out, "\nFiles outside any package:").unwrap();
            for file in &self.unowned {
                writeln!(out, "  {}", file).unwrap();
            }
        }

        out
    }
}
