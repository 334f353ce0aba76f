//! The validation rules.
//!
//! Each rule walks the cooked manifest (plus the dependency graph, the
//! filesystem, or git, as needed) and emits findings. Rules run in code
//! order; within a rule, findings follow manifest declaration order.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use url::Url;

use crate::core::{
    id_kind, BuildSegment, DxProject, IdKind, PackageVersion, ProjectManifest,
    ResolvedDependency, PROJECT_FILE,
};
use crate::git::GitWorkspace;
use crate::graph::PackageGraph;

use super::types::{Finding, FindingCode, ValidateOptions};

pub(crate) fn run_checks(
    project: &DxProject,
    graph: &PackageGraph,
    options: &ValidateOptions,
) -> Result<Vec<Finding>> {
    let manifest = project.manifest();
    let mut findings = Vec::new();

    check_duplicate_names(manifest, &mut findings);
    check_directories_exist(project, &mut findings);
    check_version_strings(manifest, &mut findings);
    check_own_version_latest(manifest, &mut findings);
    check_dependencies_known(manifest, &mut findings);
    check_declaration_order(manifest, &mut findings);
    check_transitive_closure(manifest, graph, &mut findings);
    check_version_divergence(manifest, &mut findings);
    check_pin_exceeds_declared(manifest, &mut findings);
    check_cycles(graph, &mut findings);
    check_default_directories(manifest, &mut findings);
    check_self_dependency(manifest, &mut findings);
    check_alias_ids(manifest, &mut findings);
    if let Some(base) = options.base.as_deref() {
        check_unbumped_changes(project, base, &mut findings)?;
    }
    check_login_url(manifest, &mut findings);

    Ok(findings)
}

/// QV001: the same package name declared by two directories.
fn check_duplicate_names(manifest: &ProjectManifest, findings: &mut Vec<Finding>) {
    let mut seen = HashMap::new();

    for entry in manifest.packages() {
        let Some(name) = entry.name else { continue };
        match seen.get(&name) {
            None => {
                seen.insert(name, &entry.path);
            }
            Some(first) => {
                findings.push(
                    Finding::new(
                        FindingCode::DuplicatePackageName,
                        Some(name.to_string()),
                        format!(
                            "declared by both `{}` and `{}`",
                            first.display(),
                            entry.path.display()
                        ),
                    )
                    .with_remediation("remove or rename one of the directories"),
                );
            }
        }
    }
}

/// QV002: a packageDirectories path that is not on disk.
fn check_directories_exist(project: &DxProject, findings: &mut Vec<Finding>) {
    for entry in project.manifest().packages() {
        let dir = project.package_dir(entry);
        if !dir.is_dir() {
            findings.push(
                Finding::new(
                    FindingCode::MissingDirectory,
                    Some(entry.label()),
                    format!("directory `{}` does not exist", entry.path.display()),
                )
                .with_remediation("create the directory or remove its packageDirectories entry"),
            );
        }
    }
}

/// QV003: versionNumber missing or unparseable, own or dependency.
fn check_version_strings(manifest: &ProjectManifest, findings: &mut Vec<Finding>) {
    for entry in manifest.packages() {
        match (&entry.name, &entry.version_raw, &entry.version) {
            (Some(_), None, _) => {
                findings.push(Finding::new(
                    FindingCode::InvalidVersion,
                    Some(entry.label()),
                    "package has no versionNumber",
                ));
            }
            (_, Some(raw), None) => {
                let reason = parse_failure(raw);
                findings.push(Finding::new(
                    FindingCode::InvalidVersion,
                    Some(entry.label()),
                    format!("versionNumber `{}` is invalid: {}", raw, reason),
                ));
            }
            _ => {}
        }

        for dep in &entry.dependencies {
            if let (Some(raw), None) = (&dep.version_raw, &dep.version) {
                let reason = parse_failure(raw);
                findings.push(Finding::new(
                    FindingCode::InvalidVersion,
                    Some(entry.label()),
                    format!(
                        "dependency `{}` versionNumber `{}` is invalid: {}",
                        dep.package, raw, reason
                    ),
                ));
            }
        }
    }
}

fn parse_failure(raw: &str) -> String {
    match PackageVersion::parse(raw) {
        Err(e) => e.to_string(),
        // Cooking is lenient; reaching here means it dropped a version
        // that does parse, which is a bug in cooking, not in the input.
        Ok(_) => "unexpected parse failure".to_string(),
    }
}

/// QV004: `LATEST` as a package's own versionNumber.
fn check_own_version_latest(manifest: &ProjectManifest, findings: &mut Vec<Finding>) {
    for entry in manifest.packages() {
        if entry.version.as_ref().is_some_and(|v| v.is_latest()) {
            findings.push(
                Finding::new(
                    FindingCode::LatestOwnVersion,
                    Some(entry.label()),
                    "versionNumber uses LATEST, which only floats in dependency position",
                )
                .with_remediation("use NEXT for the package's own build segment"),
            );
        }
    }
}

/// QV005: a dependency naming neither a sibling package nor an alias.
fn check_dependencies_known(manifest: &ProjectManifest, findings: &mut Vec<Finding>) {
    for entry in manifest.packages() {
        for dep in &entry.dependencies {
            if dep.resolve(manifest).is_unresolved() {
                findings.push(
                    Finding::new(
                        FindingCode::UnknownDependency,
                        Some(entry.label()),
                        format!(
                            "depends on `{}`, which is neither a sibling package nor a packageAliases entry",
                            dep.package
                        ),
                    )
                    .with_remediation(
                        "declare the package in packageDirectories or add a packageAliases entry",
                    ),
                );
            }
        }
    }
}

/// QV006: a local dependency declared after its dependent.
///
/// The vendor CLI processes packageDirectories top to bottom, so a
/// dependency must appear above every package that needs it.
fn check_declaration_order(manifest: &ProjectManifest, findings: &mut Vec<Finding>) {
    let mut position = HashMap::new();
    for entry in manifest.packages() {
        if let Some(name) = entry.name {
            position.entry(name).or_insert(entry.index);
        }
    }

    for entry in manifest.packages() {
        for dep in &entry.dependencies {
            let ResolvedDependency::Local { name, .. } = dep.resolve(manifest) else {
                continue;
            };
            let Some(&dep_index) = position.get(&name) else {
                continue;
            };
            if dep_index > entry.index {
                findings.push(
                    Finding::new(
                        FindingCode::DeclarationOrder,
                        Some(entry.label()),
                        format!(
                            "depends on `{}`, which is declared later in packageDirectories",
                            name
                        ),
                    )
                    .with_remediation(format!("move `{}` above `{}`", name, entry.label())),
                );
            }
        }
    }
}

/// QV007: transitive dependencies that are not listed directly.
///
/// Package version creation requires the full closure in each package's
/// dependency list; an inherited-but-unlisted dependency fails there.
fn check_transitive_closure(
    manifest: &ProjectManifest,
    graph: &PackageGraph,
    findings: &mut Vec<Finding>,
) {
    for entry in manifest.packages() {
        let Some(name) = entry.name else { continue };
        if !graph.contains(&name) {
            continue;
        }

        let direct: HashSet<String> = entry
            .dependencies
            .iter()
            .filter_map(|dep| match dep.resolve(manifest) {
                ResolvedDependency::Local { name, .. } => Some(name.to_string()),
                _ => None,
            })
            .collect();

        for missing in graph.transitive_deps(&name) {
            if direct.contains(missing.name().as_str()) {
                continue;
            }

            let via = entry.dependencies.iter().find_map(|dep| {
                match dep.resolve(manifest) {
                    ResolvedDependency::Local { name: direct_dep, .. } => graph
                        .transitive_deps(&direct_dep)
                        .iter()
                        .any(|td| td.name() == missing.name())
                        .then(|| direct_dep.to_string()),
                    _ => None,
                }
            });

            let message = match via {
                Some(via) => format!(
                    "depends on `{}` transitively (via `{}`) but does not list it",
                    missing.name(),
                    via
                ),
                None => format!(
                    "depends on `{}` transitively but does not list it",
                    missing.name()
                ),
            };
            findings.push(
                Finding::new(FindingCode::MissingTransitive, Some(name.to_string()), message)
                    .with_remediation(format!(
                        "add `{}` to the dependencies of `{}`",
                        missing.name(),
                        name
                    )),
            );
        }
    }
}

/// QV008: the same local dependency pinned at different versions.
///
/// Reconciliation takes the highest pin in the project; every requirer
/// below it gets a finding.
fn check_version_divergence(manifest: &ProjectManifest, findings: &mut Vec<Finding>) {
    let mut pins: BTreeMap<String, Vec<(String, PackageVersion)>> = BTreeMap::new();

    for entry in manifest.packages() {
        for dep in &entry.dependencies {
            if let ResolvedDependency::Local { name, version: Some(pin) } =
                dep.resolve(manifest)
            {
                pins.entry(name.to_string())
                    .or_default()
                    .push((entry.label(), pin));
            }
        }
    }

    for (target, requirers) in &pins {
        let Some((highest_by, highest)) =
            requirers.iter().max_by(|a, b| a.1.cmp(&b.1)).cloned()
        else {
            continue;
        };

        for (requirer, pin) in requirers {
            if *pin < highest {
                findings.push(
                    Finding::new(
                        FindingCode::VersionDivergence,
                        Some(requirer.clone()),
                        format!(
                            "pins `{}` at {} while `{}` pins {}",
                            target, pin, highest_by, highest
                        ),
                    )
                    .with_remediation(format!("raise the pin to {}", highest)),
                );
            }
        }
    }
}

/// QV009: a pin on a sibling that the sibling's own version cannot meet.
fn check_pin_exceeds_declared(manifest: &ProjectManifest, findings: &mut Vec<Finding>) {
    for entry in manifest.packages() {
        for dep in &entry.dependencies {
            let ResolvedDependency::Local { name, version: Some(pin) } =
                dep.resolve(manifest)
            else {
                continue;
            };
            let Some(declared) = manifest.package(&name).and_then(|e| e.version.clone()) else {
                continue;
            };

            if pin_exceeds(&pin, &declared) {
                findings.push(
                    Finding::new(
                        FindingCode::PinExceedsDeclared,
                        Some(entry.label()),
                        format!(
                            "pins `{}` at {} but `{}` declares {}",
                            name, pin, name, declared
                        ),
                    )
                    .with_remediation(format!("bump `{}` or lower the pin", name)),
                );
            }
        }
    }
}

/// A pin exceeds the declared version when it asks for a higher base,
/// or for a higher concrete build of the same base. Symbolic builds
/// (`NEXT`, `LATEST`) never exceed on the build segment alone.
fn pin_exceeds(pin: &PackageVersion, declared: &PackageVersion) -> bool {
    if pin.base > declared.base {
        return true;
    }
    if pin.base < declared.base {
        return false;
    }
    match (&pin.build, &declared.build) {
        (BuildSegment::Number(p), BuildSegment::Number(d)) => p > d,
        _ => false,
    }
}

/// QV010: dependency cycle.
fn check_cycles(graph: &PackageGraph, findings: &mut Vec<Finding>) {
    if let Some(cycle) = graph.find_cycle() {
        let path: Vec<String> = cycle.iter().map(|id| id.name().to_string()).collect();
        findings.push(
            Finding::new(
                FindingCode::DependencyCycle,
                path.first().cloned(),
                format!("dependency cycle: {}", path.join(" -> ")),
            )
            .with_remediation("break the cycle by extracting the shared code into a new package"),
        );
    }
}

/// QV011: not exactly one default directory.
fn check_default_directories(manifest: &ProjectManifest, findings: &mut Vec<Finding>) {
    let defaults = manifest.default_directories();
    match defaults.len() {
        1 => {}
        0 => {
            findings.push(
                Finding::new(
                    FindingCode::DefaultDirectories,
                    None,
                    "no package directory is marked default; source pushes have no target",
                )
                .with_remediation("set \"default\": true on the main package directory"),
            );
        }
        _ => {
            let paths: Vec<String> = defaults
                .iter()
                .map(|e| format!("`{}`", e.path.display()))
                .collect();
            findings.push(
                Finding::new(
                    FindingCode::DefaultDirectories,
                    None,
                    format!("multiple default directories: {}", paths.join(", ")),
                )
                .with_remediation("keep \"default\": true on exactly one directory"),
            );
        }
    }
}

/// QV012: a package depending on itself.
fn check_self_dependency(manifest: &ProjectManifest, findings: &mut Vec<Finding>) {
    for entry in manifest.packages() {
        let Some(name) = entry.name else { continue };
        for dep in &entry.dependencies {
            if matches!(dep.resolve(manifest),
                ResolvedDependency::Local { name: dep_name, .. } if dep_name == name)
            {
                findings.push(Finding::new(
                    FindingCode::SelfDependency,
                    Some(name.to_string()),
                    "depends on itself",
                ));
            }
        }
    }
}

/// QV013: alias values that are not Salesforce package IDs, and
/// versioned alias keys pointing at the wrong ID kind.
fn check_alias_ids(manifest: &ProjectManifest, findings: &mut Vec<Finding>) {
    for alias in manifest.aliases().iter() {
        match id_kind(&alias.id) {
            IdKind::Invalid => {
                findings.push(
                    Finding::new(
                        FindingCode::InvalidAliasId,
                        Some(alias.key.clone()),
                        format!(
                            "maps to `{}`, which is not a Salesforce package ID",
                            alias.id
                        ),
                    )
                    .with_remediation("alias values must be 0Ho package or 04t version IDs"),
                );
                continue;
            }
            IdKind::Package if alias.version.is_some() => {
                findings.push(
                    Finding::new(
                        FindingCode::InvalidAliasId,
                        Some(alias.key.clone()),
                        format!(
                            "names a specific version but maps to the 0Ho package ID `{}`",
                            alias.id
                        ),
                    )
                    .with_remediation("use the 04t subscriber package version ID"),
                );
            }
            _ => {}
        }

        if alias.key.contains('@') && alias.version.is_none() {
            findings.push(Finding::new(
                FindingCode::InvalidAliasId,
                Some(alias.key.clone()),
                "version suffix does not parse (expected `name@major.minor.patch-build`)",
            ));
        }
    }
}

/// QV014: packages with changes since the base ref whose versionNumber
/// did not move past the base manifest's.
fn check_unbumped_changes(
    project: &DxProject,
    base: &str,
    findings: &mut Vec<Finding>,
) -> Result<()> {
    let git = GitWorkspace::open(project.root())
        .context("--base requires the project to be inside a git repository")?;

    let base_manifest = match git.file_at(base, Path::new(PROJECT_FILE))? {
        Some(content) => {
            Some(ProjectManifest::parse(&content, project.manifest().path()).with_context(
                || format!("failed to parse {} at `{}`", PROJECT_FILE, base),
            )?)
        }
        // Manifest absent at base: every package is new, nothing to compare.
        None => None,
    };

    let ignore = project.forceignore()?;
    let mut touched = BTreeSet::new();
    for path in git
        .changed_files(base)
        .with_context(|| format!("failed to diff against `{}`", base))?
    {
        if ignore.is_ignored(&path) {
            continue;
        }
        if let Some(name) = project.package_for_path(&path).and_then(|e| e.name) {
            touched.insert(name.to_string());
        }
    }

    let Some(base_manifest) = base_manifest else {
        return Ok(());
    };

    for name in touched {
        let current = project
            .manifest()
            .package(&name)
            .and_then(|e| e.version.clone());
        let at_base = base_manifest.package(&name).and_then(|e| e.version.clone());

        if let (Some(current), Some(at_base)) = (current, at_base) {
            if current <= at_base {
                findings.push(
                    Finding::new(
                        FindingCode::UnbumpedChange,
                        Some(name.clone()),
                        format!(
                            "has changes since `{}` but versionNumber is still {}",
                            base, current
                        ),
                    )
                    .with_remediation(format!("run `quay version bump --package {}`", name)),
                );
            }
        }
    }

    Ok(())
}

/// QV015: sfdcLoginUrl that logins will reject.
fn check_login_url(manifest: &ProjectManifest, findings: &mut Vec<Finding>) {
    let Some(raw) = manifest.sfdc_login_url() else {
        return;
    };

    let problem = match Url::parse(raw) {
        Ok(url) if url.scheme() == "http" => Some(format!(
            "sfdcLoginUrl `{}` uses http; logins require https",
            raw
        )),
        Ok(url) if url.scheme() != "https" => {
            Some(format!("sfdcLoginUrl `{}` is not an https URL", raw))
        }
        Ok(_) => None,
        // A bare hostname parses as a relative URL.
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Some(format!("sfdcLoginUrl `{}` is not an https URL", raw))
        }
        Err(url::ParseError::EmptyHost) => {
            Some(format!("sfdcLoginUrl `{}` has no host", raw))
        }
        Err(e) => Some(format!("sfdcLoginUrl `{}` is not a valid URL: {}", raw, e)),
    };

    if let Some(message) = problem {
        findings.push(
            Finding::new(FindingCode::InvalidLoginUrl, None, message)
                .with_remediation("use https://login.salesforce.com or your My Domain URL"),
        );
    }
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

    fn findings_for(project: &DxProject) -> Vec<Finding> {
        findings_with_options(project, &ValidateOptions::default())
    }

    fn findings_with_options(project: &DxProject, options: &ValidateOptions) -> Vec<Finding> {
        let graph = PackageGraph::from_manifest(project.manifest());
        run_checks(project, &graph, options).unwrap()
    }

    fn codes(findings: &[Finding]) -> Vec<&'static str> {
        findings.iter().map(|f| f.code.as_str()).collect()
    }

    const CLEAN: &str = r#"{
  "packageDirectories": [
    { "path": "pkgs/core", "package": "expense-core", "versionNumber": "1.4.0.NEXT", "default": true },
    {
      "path": "pkgs/api",
      "package": "expense-api",
      "versionNumber": "1.2.0.NEXT",
      "dependencies": [{ "package": "expense-core", "versionNumber": "1.4.0.LATEST" }]
    }
  ],
  "packageAliases": {
    "expense-core": "0Ho6F000000CaRbSAK"
  },
  "sfdcLoginUrl": "https://login.salesforce.com"
}"#;

    #[test]
    fn test_clean_project_has_no_findings() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(&tmp, CLEAN);
        assert!(findings_for(&project).is_empty());
    }

    #[test]
    fn test_duplicate_package_name() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    { "path": "pkgs/a", "package": "expense-core", "versionNumber": "1.0.0.NEXT", "default": true },
    { "path": "pkgs/b", "package": "expense-core", "versionNumber": "1.0.0.NEXT" }
  ]
}"#,
        );

        let findings = findings_for(&project);
        assert_eq!(codes(&findings), vec!["QV001"]);
        assert!(findings[0].message.contains("pkgs/a"));
        assert!(findings[0].message.contains("pkgs/b"));
    }

    #[test]
    fn test_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(&tmp, CLEAN);
        std::fs::remove_dir(tmp.path().join("pkgs/api")).unwrap();

        let findings = findings_for(&project);
        assert_eq!(codes(&findings), vec!["QV002"]);
        assert_eq!(findings[0].package.as_deref(), Some("expense-api"));
    }

    #[test]
    fn test_invalid_version_strings() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    { "path": "pkgs/a", "package": "a", "versionNumber": "1.0", "default": true },
    { "path": "pkgs/b", "package": "b" },
    {
      "path": "pkgs/c", "package": "c", "versionNumber": "1.0.0.NEXT",
      "dependencies": [{ "package": "a", "versionNumber": "one.two" }]
    }
  ]
}"#,
        );

        let findings = findings_for(&project);
        assert_eq!(codes(&findings), vec!["QV003", "QV003", "QV003"]);
        assert!(findings[0].message.contains("`1.0`"));
        assert!(findings[1].message.contains("no versionNumber"));
        assert!(findings[2].message.contains("dependency `a`"));
    }

    #[test]
    fn test_latest_own_version() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    { "path": "pkgs/a", "package": "a", "versionNumber": "1.0.0.LATEST", "default": true }
  ]
}"#,
        );

        assert_eq!(codes(&findings_for(&project)), vec!["QV004"]);
    }

    #[test]
    fn test_unknown_dependency() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    {
      "path": "pkgs/a", "package": "a", "versionNumber": "1.0.0.NEXT", "default": true,
      "dependencies": [{ "package": "ghost" }]
    }
  ]
}"#,
        );

        let findings = findings_for(&project);
        assert_eq!(codes(&findings), vec!["QV005"]);
        assert!(findings[0].message.contains("`ghost`"));
        assert!(findings[0].remediation.is_some());
    }

    #[test]
    fn test_declaration_order_violation() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    {
      "path": "pkgs/api", "package": "api", "versionNumber": "1.0.0.NEXT", "default": true,
      "dependencies": [{ "package": "core", "versionNumber": "1.0.0.LATEST" }]
    },
    { "path": "pkgs/core", "package": "core", "versionNumber": "1.0.0.NEXT" }
  ]
}"#,
        );

        let findings = findings_for(&project);
        assert_eq!(codes(&findings), vec!["QV006"]);
        assert_eq!(findings[0].package.as_deref(), Some("api"));
    }

    #[test]
    fn test_missing_transitive_dependency() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    { "path": "pkgs/core", "package": "core", "versionNumber": "1.0.0.NEXT", "default": true },
    {
      "path": "pkgs/api", "package": "api", "versionNumber": "1.0.0.NEXT",
      "dependencies": [{ "package": "core", "versionNumber": "1.0.0.LATEST" }]
    },
    {
      "path": "pkgs/app", "package": "app", "versionNumber": "1.0.0.NEXT",
      "dependencies": [{ "package": "api", "versionNumber": "1.0.0.LATEST" }]
    }
  ]
}"#,
        );

        let findings = findings_for(&project);
        assert_eq!(codes(&findings), vec!["QV007"]);
        assert_eq!(findings[0].package.as_deref(), Some("app"));
        assert!(findings[0].message.contains("via `api`"));
        assert!(!findings[0].is_error());
    }

    #[test]
    fn test_version_divergence_reported_per_low_requirer() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    { "path": "pkgs/core", "package": "core", "versionNumber": "1.4.0.NEXT", "default": true },
    {
      "path": "pkgs/api", "package": "api", "versionNumber": "1.0.0.NEXT",
      "dependencies": [{ "package": "core", "versionNumber": "1.4.0.1" }]
    },
    {
      "path": "pkgs/app", "package": "app", "versionNumber": "1.0.0.NEXT",
      "dependencies": [
        { "package": "core", "versionNumber": "1.0.0.1" },
        { "package": "api", "versionNumber": "1.0.0.LATEST" }
      ]
    }
  ]
}"#,
        );

        let findings = findings_for(&project);
        assert_eq!(codes(&findings), vec!["QV008"]);
        assert_eq!(findings[0].package.as_deref(), Some("app"));
        assert!(findings[0].message.contains("1.4.0.1"));
        assert!(findings[0].remediation.as_deref().unwrap().contains("1.4.0.1"));
    }

    #[test]
    fn test_pin_exceeds_declared_version() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    { "path": "pkgs/core", "package": "core", "versionNumber": "1.4.0.NEXT", "default": true },
    {
      "path": "pkgs/api", "package": "api", "versionNumber": "1.0.0.NEXT",
      "dependencies": [{ "package": "core", "versionNumber": "2.0.0.1" }]
    }
  ]
}"#,
        );

        let findings = findings_for(&project);
        assert_eq!(codes(&findings), vec!["QV009"]);
        assert!(findings[0].message.contains("2.0.0.1"));
        assert!(findings[0].message.contains("1.4.0.NEXT"));
    }

    #[test]
    fn test_pin_exceeds_comparison() {
        let parse = |s| PackageVersion::parse(s).unwrap();

        assert!(pin_exceeds(&parse("2.0.0.1"), &parse("1.4.0.NEXT")));
        assert!(pin_exceeds(&parse("1.4.0.5"), &parse("1.4.0.3")));
        assert!(!pin_exceeds(&parse("1.4.0.9"), &parse("1.4.0.NEXT")));
        assert!(!pin_exceeds(&parse("1.4.0.LATEST"), &parse("1.4.0.NEXT")));
        assert!(!pin_exceeds(&parse("1.3.0.1"), &parse("1.4.0.NEXT")));
    }

    #[test]
    fn test_dependency_cycle() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    {
      "path": "pkgs/a", "package": "a", "versionNumber": "1.0.0.NEXT", "default": true,
      "dependencies": [{ "package": "b" }]
    },
    {
      "path": "pkgs/b", "package": "b", "versionNumber": "1.0.0.NEXT",
      "dependencies": [{ "package": "a" }]
    }
  ]
}"#,
        );

        let findings = findings_for(&project);
        assert!(codes(&findings).contains(&"QV010"));
        let cycle = findings.iter().find(|f| f.code.as_str() == "QV010").unwrap();
        assert!(cycle.message.contains(" -> "));
    }

    #[test]
    fn test_default_directory_count() {
        let tmp = TempDir::new().unwrap();
        let none = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    { "path": "pkgs/a", "package": "a", "versionNumber": "1.0.0.NEXT" }
  ]
}"#,
        );
        assert_eq!(codes(&findings_for(&none)), vec!["QV011"]);

        let tmp = TempDir::new().unwrap();
        let two = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    { "path": "pkgs/a", "package": "a", "versionNumber": "1.0.0.NEXT", "default": true },
    { "path": "pkgs/b", "package": "b", "versionNumber": "1.0.0.NEXT", "default": true }
  ]
}"#,
        );
        let findings = findings_for(&two);
        assert_eq!(codes(&findings), vec!["QV011"]);
        assert!(findings[0].message.contains("pkgs/a"));
    }

    #[test]
    fn test_self_dependency() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    {
      "path": "pkgs/a", "package": "a", "versionNumber": "1.0.0.NEXT", "default": true,
      "dependencies": [{ "package": "a" }]
    }
  ]
}"#,
        );

        assert_eq!(codes(&findings_for(&project)), vec!["QV012"]);
    }

    #[test]
    fn test_alias_id_shapes() {
        let tmp = TempDir::new().unwrap();
        let project = project_with(
            &tmp,
            r#"{
  "packageDirectories": [
    { "path": "pkgs/a", "package": "a", "versionNumber": "1.0.0.NEXT", "default": true }
  ],
  "packageAliases": {
    "short": "04tshort",
    "Marketing Base@1.2.0-3": "0Ho6F000000CaRbSAK",
    "Bad Suffix@garbage": "04t6F000000N2ZvQAK"
  }
}"#,
        );

        let findings = findings_for(&project);
        assert_eq!(codes(&findings), vec!["QV013", "QV013", "QV013"]);
        assert!(findings[0].message.contains("not a Salesforce package ID"));
        assert!(findings[1].message.contains("0Ho"));
        assert!(findings[2].message.contains("suffix"));
    }

    #[test]
    fn test_login_url() {
        let bad = [
            ("http://login.salesforce.com", "uses http"),
            ("login.salesforce.com", "not an https URL"),
            ("https://", "no host"),
        ];
        for (url, expect) in bad {
            let tmp = TempDir::new().unwrap();
            let project = project_with(
                &tmp,
                &format!(
                    r#"{{
  "packageDirectories": [
    {{ "path": "pkgs/a", "package": "a", "versionNumber": "1.0.0.NEXT", "default": true }}
  ],
  "sfdcLoginUrl": "{}"
}}"#,
                    url
                ),
            );

            let findings = findings_for(&project);
            assert_eq!(codes(&findings), vec!["QV015"], "url: {}", url);
            assert!(findings[0].message.contains(expect), "url: {}", url);
        }
    }

    mod unbumped {
        use super::*;
        use git2::{IndexAddOption, Repository, Signature};

        fn commit_all(repo: &Repository, message: &str) {
            let mut index = repo.index().unwrap();
            index
                .add_all(["*"], IndexAddOption::DEFAULT, None)
                .unwrap();
            index.write().unwrap();
            let tree_id = index.write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            let sig = Signature::now("test", "test@example.com").unwrap();
            let parent = repo
                .head()
                .ok()
                .and_then(|h| h.peel_to_commit().ok());
            let parents: Vec<_> = parent.iter().collect();
            repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
                .unwrap();
        }

        fn options_with_base(base: &str) -> ValidateOptions {
            ValidateOptions {
                base: Some(base.to_string()),
                ..Default::default()
            }
        }

        #[test]
        fn test_changed_package_without_bump() {
            let tmp = TempDir::new().unwrap();
            let repo = Repository::init(tmp.path()).unwrap();
            let project = project_with(&tmp, CLEAN);
            std::fs::write(
                tmp.path().join("pkgs/core/Expense.cls"),
                "public class Expense {}",
            )
            .unwrap();
            commit_all(&repo, "initial");

            std::fs::write(
                tmp.path().join("pkgs/core/Expense.cls"),
                "public class Expense { Id id; }",
            )
            .unwrap();

            let findings = findings_with_options(&project, &options_with_base("HEAD"));
            assert_eq!(codes(&findings), vec!["QV014"]);
            assert_eq!(findings[0].package.as_deref(), Some("expense-core"));
            assert!(!findings[0].is_error());
        }

        #[test]
        fn test_bumped_change_is_clean() {
            let tmp = TempDir::new().unwrap();
            let repo = Repository::init(tmp.path()).unwrap();
            let project = project_with(&tmp, CLEAN);
            std::fs::write(
                tmp.path().join("pkgs/core/Expense.cls"),
                "public class Expense {}",
            )
            .unwrap();
            commit_all(&repo, "initial");

            std::fs::write(
                tmp.path().join("pkgs/core/Expense.cls"),
                "public class Expense { Id id; }",
            )
            .unwrap();
            let bumped = CLEAN.replace("1.4.0.NEXT", "1.5.0.NEXT");
            std::fs::write(tmp.path().join(PROJECT_FILE), bumped).unwrap();
            drop(project);
            let project = DxProject::open(&tmp.path().join(PROJECT_FILE)).unwrap();

            let findings = findings_with_options(&project, &options_with_base("HEAD"));
            assert_eq!(codes(&findings), Vec::<&str>::new());
        }

        #[test]
        fn test_base_outside_repository_errors() {
            let tmp = TempDir::new().unwrap();
            let project = project_with(&tmp, CLEAN);
            let graph = PackageGraph::from_manifest(project.manifest());

            let err = run_checks(&project, &graph, &options_with_base("HEAD")).unwrap_err();
            assert!(err.to_string().contains("git repository"));
        }
    }
}
