//! Install plan generation.
//!
//! An InstallPlan describes everything `quay install` would do to bring
//! an org up to date with the project: subscriber package installs in
//! dependency order, then source directory deploys. Plans are
//! serializable so `--dry-run` output can feed other tooling.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::{
    DxProject, PackageEntry, PackageVersion, ProjectManifest, ReleaseDefinition,
    ResolvedDependency,
};
use crate::graph::PackageGraph;
use crate::org::{InstalledPackage, OrgClient};
use crate::util::diagnostic::UnknownPackageError;

/// A complete install plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallPlan {
    /// Target org alias, absent for offline plans
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,

    /// All steps in execution order
    pub steps: Vec<PlanStep>,
}

/// One step of the plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// Package name (or directory label for source deploys)
    pub package: String,

    /// The version the step delivers, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<PackageVersion>,

    /// What to do
    pub action: StepAction,

    /// Why planning decided not to run this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<SkipReason>,
}

impl PlanStep {
    /// Display label, `name` or `name version`.
    pub fn label(&self) -> String {
        match &self.version {
            Some(version) => format!("{} {}", self.package, version),
            None => self.package.clone(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.skip.is_none()
    }
}

/// The action a plan step performs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepAction {
    /// Install a subscriber package version by its 04t ID
    InstallSubscriber { subscriber_id: String },
    /// Deploy a source directory
    DeploySource { path: PathBuf },
    /// Cannot execute: no subscriber package version is known
    Unresolved { reason: String },
}

/// Why a step is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The org already has a satisfying version
    AlreadyInstalled,
    /// The release definition excludes the package
    ReleaseSkip,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyInstalled => f.write_str("already installed"),
            SkipReason::ReleaseSkip => f.write_str("release definition"),
        }
    }
}

/// Options for plan computation.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Restrict the plan to these packages and their dependencies
    /// (empty = whole project)
    pub packages: Vec<String>,
}

impl InstallPlan {
    /// Compute the plan for a project.
    ///
    /// With an org client, the org's installed package list marks
    /// already-satisfied steps as skipped; without one (offline) the
    /// plan is pure manifest arithmetic. Packaged steps come first in
    /// dependency order, with each package's external (aliased)
    /// dependencies directly before it; source directories follow in
    /// declaration order.
    pub fn compute(
        project: &DxProject,
        release: Option<&ReleaseDefinition>,
        org: Option<&dyn OrgClient>,
        options: &PlanOptions,
    ) -> Result<InstallPlan> {
        let manifest = project.manifest();
        let graph = PackageGraph::from_manifest(manifest);
        let order = graph.topological_order()?;

        let keep = keep_set(manifest, &graph, &options.packages)?;

        let installed = match org {
            Some(client) => client.installed_packages()?,
            None => Vec::new(),
        };

        let mut steps = Vec::new();
        let mut seen_external = HashSet::new();
        let mut seen_unresolved = HashSet::new();

        for id in &order {
            let name = id.name();
            if let Some(keep) = &keep {
                if !keep.contains(name.as_str()) {
                    continue;
                }
            }

            // External dependencies land directly before their first
            // dependent.
            for dep in graph.subscriber_deps(&name) {
                let ResolvedDependency::Subscriber { alias, subscriber_id } =
                    dep.resolve(manifest)
                else {
                    continue;
                };
                if !seen_external.insert(subscriber_id.clone()) {
                    continue;
                }

                let entry = manifest.aliases().entry(&alias);
                let mut step = PlanStep {
                    package: entry
                        .map(|e| e.name.clone())
                        .unwrap_or_else(|| dep.package.clone()),
                    version: entry.and_then(|e| e.version.clone()),
                    action: StepAction::InstallSubscriber { subscriber_id },
                    skip: None,
                };
                mark_skip(&mut step, release, &installed);
                steps.push(step);
            }

            for dep in graph.unresolved_deps(&name) {
                if !seen_unresolved.insert(dep.package.clone()) {
                    continue;
                }
                steps.push(PlanStep {
                    package: dep.package.clone(),
                    version: dep.version.clone(),
                    action: StepAction::Unresolved {
                        reason: format!("no packageAliases entry resolves `{}`", dep.display()),
                    },
                    skip: None,
                });
            }

            if let Some(entry) = manifest.package(&name) {
                let mut step = local_step(manifest, entry, &installed);
                mark_skip(&mut step, release, &installed);
                steps.push(step);
            }
        }

        // Source directories deploy after every package install; a
        // --packages filter names packages, so it drops them entirely.
        if keep.is_none() {
            for entry in manifest.packages() {
                if entry.name.is_some() {
                    continue;
                }
                let mut step = PlanStep {
                    package: entry.label(),
                    version: None,
                    action: StepAction::DeploySource {
                        path: entry.path.clone(),
                    },
                    skip: None,
                };
                mark_skip(&mut step, release, &installed);
                steps.push(step);
            }
        }

        tracing::debug!(
            steps = steps.len(),
            pending = steps.iter().filter(|s| s.is_pending()).count(),
            "install plan computed"
        );

        Ok(InstallPlan {
            org: org.map(|client| client.org().to_string()),
            steps,
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps the executor will actually run.
    pub fn pending(&self) -> Vec<&PlanStep> {
        self.steps.iter().filter(|s| s.is_pending()).collect()
    }

    pub fn skipped_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_pending()).count()
    }

    /// Pending steps that cannot execute.
    pub fn unresolved(&self) -> Vec<&PlanStep> {
        self.steps
            .iter()
            .filter(|s| s.is_pending() && matches!(s.action, StepAction::Unresolved { .. }))
            .collect()
    }

    /// Numbered listing for `plan` and `install --dry-run` output.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match &self.org {
            Some(org) => {
                writeln!(out, "Install plan for org `{}` ({} steps):", org, self.len()).unwrap()
            }
            None => writeln!(out, "Install plan ({} steps, offline):", self.len()).unwrap(),
        }

        for (index, step) in self.steps.iter().enumerate() {
            let action = match &step.action {
                StepAction::InstallSubscriber { subscriber_id } => {
                    format!("install {} [{}]", step.label(), subscriber_id)
                }
                StepAction::DeploySource { path } => format!("deploy {}", path.display()),
                StepAction::Unresolved { reason } => {
                    format!("unresolved {}: {}", step.label(), reason)
                }
            };
            match &step.skip {
                Some(reason) => {
                    writeln!(out, "  {:>2}. {} (skipped: {})", index + 1, action, reason).unwrap()
                }
                None => writeln!(out, "  {:>2}. {}", index + 1, action).unwrap(),
            }
        }

        out
    }
}

/// Closure of the `--packages` filter over local dependencies, or None
/// for an unfiltered plan.
fn keep_set(
    manifest: &ProjectManifest,
    graph: &PackageGraph,
    packages: &[String],
) -> Result<Option<HashSet<String>>> {
    if packages.is_empty() {
        return Ok(None);
    }

    let known: Vec<String> = manifest
        .package_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    let mut keep = HashSet::new();
    for name in packages {
        if !graph.contains(name) {
            return Err(
                UnknownPackageError::with_candidates(name, known.iter().map(|s| s.as_str()))
                    .into(),
            );
        }
        keep.insert(name.clone());
        for dep in graph.transitive_deps(name) {
            keep.insert(dep.name().to_string());
        }
    }
    Ok(Some(keep))
}

/// Resolve a local package to its install step.
///
/// Precedence: the newest aliased build satisfying the declared
/// version, then whatever satisfying version the org already has
/// (skipped in place), and otherwise an unresolved step.
fn local_step(
    manifest: &ProjectManifest,
    entry: &PackageEntry,
    installed: &[InstalledPackage],
) -> PlanStep {
    let name = entry.label();
    let declared = entry.version.clone();

    if let Some(alias) = entry
        .version
        .as_ref()
        .and_then(|v| manifest.aliases().subscriber_for(&name, v))
    {
        return PlanStep {
            package: name,
            version: alias.version.clone().or(declared),
            action: StepAction::InstallSubscriber {
                subscriber_id: alias.id.clone(),
            },
            skip: None,
        };
    }

    let satisfying = installed.iter().find(|p| {
        p.name.as_deref() == Some(name.as_str())
            && match (&declared, &p.version) {
                (Some(want), Some(have)) => want.satisfied_by(have),
                _ => false,
            }
    });
    if let Some(record) = satisfying {
        return PlanStep {
            package: name,
            version: record.version.clone().or(declared),
            action: StepAction::InstallSubscriber {
                subscriber_id: record.version_id.clone(),
            },
            skip: Some(SkipReason::AlreadyInstalled),
        };
    }

    PlanStep {
        package: name.clone(),
        version: declared,
        action: StepAction::Unresolved {
            reason: format!("no packageAliases entry releases `{}`", name),
        },
        skip: None,
    }
}

fn mark_skip(
    step: &mut PlanStep,
    release: Option<&ReleaseDefinition>,
    installed: &[InstalledPackage],
) {
    if step.skip.is_some() {
        return;
    }
    if release.is_some_and(|r| r.is_skipped(&step.package)) {
        step.skip = Some(SkipReason::ReleaseSkip);
        return;
    }
    if satisfied_by_org(step, installed) {
        step.skip = Some(SkipReason::AlreadyInstalled);
    }
}

/// Whether the org's installed list already covers an install step,
/// either by the exact subscriber ID or by a satisfying version of the
/// same package name.
fn satisfied_by_org(step: &PlanStep, installed: &[InstalledPackage]) -> bool {
    let StepAction::InstallSubscriber { subscriber_id } = &step.action else {
        return false;
    };

    installed.iter().any(|p| {
        p.version_id == *subscriber_id
            || (p.name.as_deref() == Some(step.package.as_str())
                && match (&step.version, &p.version) {
                    (Some(want), Some(have)) => want.satisfied_by(have),
                    _ => false,
                })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::test_support::{
        create_test_project, installed_package, MockOrgClient, OrgCall, THREE_PACKAGE_MANIFEST,
    };

    fn offline_plan(project: &DxProject) -> InstallPlan {
        InstallPlan::compute(project, None, None, &PlanOptions::default()).unwrap()
    }

    fn step_packages(plan: &InstallPlan) -> Vec<&str> {
        plan.steps.iter().map(|s| s.package.as_str()).collect()
    }

    #[test]
    fn test_offline_plan_orders_dependencies_first() {
        let tmp = TempDir::new().unwrap();
        let project = create_test_project(tmp.path(), THREE_PACKAGE_MANIFEST);

        let plan = offline_plan(&project);
        assert!(plan.org.is_none());
        assert_eq!(
            step_packages(&plan),
            vec![
                "expense-core",
                "Marketing Base",
                "expense-api",
                "unpackaged/config"
            ]
        );

        // The declared 1.4.0.NEXT resolves to the newest released build.
        let core = &plan.steps[0];
        assert_eq!(core.version.as_ref().unwrap().to_string(), "1.4.0.3");
        assert!(matches!(
            &core.action,
            StepAction::InstallSubscriber { subscriber_id } if subscriber_id == "04t6F000000N2ZvQAK"
        ));

        assert!(matches!(
            &plan.steps[3].action,
            StepAction::DeploySource { path } if path == &PathBuf::from("unpackaged/config")
        ));
        assert_eq!(plan.skipped_count(), 0);
        assert!(plan.unresolved().is_empty());
    }

    #[test]
    fn test_installed_package_marks_step_skipped() {
        let tmp = TempDir::new().unwrap();
        let project = create_test_project(tmp.path(), THREE_PACKAGE_MANIFEST);

        let org = MockOrgClient::new("dev")
            .with_installed(installed_package("expense-core", "04t6F000000N2ZvQAK", "1.4.0.3"));
        let plan =
            InstallPlan::compute(&project, None, Some(&org), &PlanOptions::default()).unwrap();

        assert_eq!(plan.org.as_deref(), Some("dev"));
        assert_eq!(plan.steps[0].skip, Some(SkipReason::AlreadyInstalled));
        assert!(plan.steps[1].is_pending());
        assert_eq!(plan.pending().len(), 3);
        assert_eq!(org.calls(), vec![OrgCall::InstalledPackages]);
    }

    #[test]
    fn test_release_definition_skips() {
        let tmp = TempDir::new().unwrap();
        let project = create_test_project(tmp.path(), THREE_PACKAGE_MANIFEST);

        let release = ReleaseDefinition {
            skip: vec!["Marketing Base".to_string()],
            ..Default::default()
        };
        let plan =
            InstallPlan::compute(&project, Some(&release), None, &PlanOptions::default())
                .unwrap();

        let marketing = plan
            .steps
            .iter()
            .find(|s| s.package == "Marketing Base")
            .unwrap();
        assert_eq!(marketing.skip, Some(SkipReason::ReleaseSkip));
    }

    #[test]
    fn test_packages_filter_keeps_dependency_closure() {
        let tmp = TempDir::new().unwrap();
        let project = create_test_project(tmp.path(), THREE_PACKAGE_MANIFEST);

        let options = PlanOptions {
            packages: vec!["expense-api".to_string()],
        };
        let plan = InstallPlan::compute(&project, None, None, &options).unwrap();

        // Source directories are not part of a filtered plan.
        assert_eq!(
            step_packages(&plan),
            vec!["expense-core", "Marketing Base", "expense-api"]
        );
    }

    #[test]
    fn test_unknown_package_in_filter() {
        let tmp = TempDir::new().unwrap();
        let project = create_test_project(tmp.path(), THREE_PACKAGE_MANIFEST);

        let options = PlanOptions {
            packages: vec!["expense-ap".to_string()],
        };
        let err = InstallPlan::compute(&project, None, None, &options).unwrap_err();

        let unknown = err.downcast_ref::<UnknownPackageError>().unwrap();
        assert_eq!(unknown.package, "expense-ap");
        assert!(unknown.suggestions.as_deref().unwrap().contains("expense-api"));
    }

    #[test]
    fn test_unreleased_package_is_unresolved() {
        let tmp = TempDir::new().unwrap();
        let no_release_alias = r#"{
  "packageDirectories": [
    { "path": "pkgs/core", "package": "expense-core", "versionNumber": "1.4.0.NEXT", "default": true }
  ],
  "packageAliases": { "expense-core": "0Ho6F000000CaRbSAK" }
}"#;
        let project = create_test_project(tmp.path(), no_release_alias);

        let plan = offline_plan(&project);
        assert_eq!(plan.unresolved().len(), 1);
        assert!(matches!(
            &plan.steps[0].action,
            StepAction::Unresolved { reason } if reason.contains("expense-core")
        ));

        // The org already holding a satisfying build resolves it in place.
        let org = MockOrgClient::new("dev")
            .with_installed(installed_package("expense-core", "04t6F000000AdHocQAX", "1.4.0.7"));
        let plan =
            InstallPlan::compute(&project, None, Some(&org), &PlanOptions::default()).unwrap();
        assert_eq!(plan.steps[0].skip, Some(SkipReason::AlreadyInstalled));
        assert!(matches!(
            &plan.steps[0].action,
            StepAction::InstallSubscriber { subscriber_id } if subscriber_id == "04t6F000000AdHocQAX"
        ));
    }

    #[test]
    fn test_render_lists_steps() {
        let tmp = TempDir::new().unwrap();
        let project = create_test_project(tmp.path(), THREE_PACKAGE_MANIFEST);

        let text = offline_plan(&project).render();
        assert!(text.contains("Install plan (4 steps, offline):"));
        assert!(text.contains("1. install expense-core 1.4.0.3 [04t6F000000N2ZvQAK]"));
        assert!(text.contains("4. deploy unpackaged/config"));
    }

    #[test]
    fn test_plan_serialization_round_trip() {
        let tmp = TempDir::new().unwrap();
        let project = create_test_project(tmp.path(), THREE_PACKAGE_MANIFEST);
        let plan = offline_plan(&project);

        let json = serde_json::to_string_pretty(&plan).unwrap();
        assert!(json.contains("\"type\": \"install_subscriber\""));

        let back: InstallPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), plan.len());
        assert_eq!(back.steps[0].package, "expense-core");
    }
}
