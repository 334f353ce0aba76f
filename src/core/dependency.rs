//! Dependency specification and resolution.
//!
//! A dependency entry names either a sibling package directory or an
//! alias-table key. Resolution is local-first: a name that matches a
//! package in this project always wins over an alias of the same name.

use serde::{Deserialize, Serialize};

use crate::core::manifest::ProjectManifest;
use crate::core::version::PackageVersion;
use crate::util::InternedString;

/// A cooked dependency entry from a packageDirectories element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDependency {
    /// Target as written: a package name or an alias key like
    /// `Marketing Base@1.2.0-3`
    pub package: String,

    /// Parsed versionNumber, when present and well-formed
    pub version: Option<PackageVersion>,

    /// versionNumber as written
    pub version_raw: Option<String>,
}

impl PackageDependency {
    pub fn new(package: impl Into<String>, version: Option<PackageVersion>) -> Self {
        let version_raw = version.as_ref().map(|v| v.to_string());
        PackageDependency {
            package: package.into(),
            version,
            version_raw,
        }
    }

    /// Resolve this dependency against the project.
    ///
    /// Precedence:
    /// 1. A sibling package directory with this name (local)
    /// 2. An alias-table entry: the whole string as key, then
    ///    `name@version` assembled from the versionNumber field
    /// 3. Otherwise unresolved, which validation reports
    pub fn resolve(&self, manifest: &ProjectManifest) -> ResolvedDependency {
        if let Some(entry) = manifest.package(&self.package) {
            return ResolvedDependency::Local {
                name: entry.name.unwrap_or_default(),
                version: self.version.clone(),
            };
        }

        if let Some(alias) = manifest.aliases().entry(&self.package) {
            return ResolvedDependency::Subscriber {
                alias: alias.key.clone(),
                subscriber_id: alias.id.clone(),
            };
        }

        if let Some(version) = &self.version {
            if let Some(alias) = manifest.aliases().subscriber_for(&self.package, version) {
                return ResolvedDependency::Subscriber {
                    alias: alias.key.clone(),
                    subscriber_id: alias.id.clone(),
                };
            }
        }

        ResolvedDependency::Unresolved {
            package: self.package.clone(),
        }
    }

    /// Display form, `name` or `name (1.2.0.LATEST)`.
    pub fn display(&self) -> String {
        match &self.version {
            Some(v) => format!("{} ({})", self.package, v),
            None => self.package.clone(),
        }
    }
}

/// The result of resolving a dependency entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedDependency {
    /// A sibling package directory in this project.
    Local {
        name: InternedString,
        version: Option<PackageVersion>,
    },

    /// An external package version reachable through packageAliases.
    Subscriber {
        alias: String,
        subscriber_id: String,
    },

    /// Neither a sibling package nor an alias.
    Unresolved { package: String },
}

impl ResolvedDependency {
    pub fn is_local(&self) -> bool {
        matches!(self, ResolvedDependency::Local { .. })
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, ResolvedDependency::Unresolved { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn manifest() -> ProjectManifest {
        let content = r#"{
  "packageDirectories": [
    { "path": "pkgs/core", "package": "expense-core", "versionNumber": "1.4.0.NEXT" },
    {
      "path": "pkgs/api",
      "package": "expense-api",
      "versionNumber": "1.2.0.NEXT",
      "dependencies": [
        { "package": "expense-core", "versionNumber": "1.4.0.LATEST" },
        { "package": "Marketing Base@1.2.0-3" },
        { "package": "Shared Labels", "versionNumber": "2.0.0.1" },
        { "package": "ghost" }
      ]
    }
  ],
  "packageAliases": {
    "expense-core": "0Ho6F000000CaRbSAK",
    "Marketing Base@1.2.0-3": "04t6F000000N2ZvQAK",
    "Shared Labels@2.0.0-1": "04t6F000000PQRsQAO"
  }
}"#;
        ProjectManifest::parse(content, Path::new("/tmp/sfdx-project.json")).unwrap()
    }

    fn deps(manifest: &ProjectManifest) -> Vec<PackageDependency> {
        manifest.package("expense-api").unwrap().dependencies.clone()
    }

    #[test]
    fn test_local_wins_over_alias() {
        let manifest = manifest();
        let deps = deps(&manifest);

        // expense-core is both a sibling package and an alias key; the
        // sibling wins.
        match deps[0].resolve(&manifest) {
            ResolvedDependency::Local { name, version } => {
                assert_eq!(name, "expense-core");
                assert_eq!(version.unwrap().to_string(), "1.4.0.LATEST");
            }
            other => panic!("expected local, got {:?}", other),
        }
    }

    #[test]
    fn test_alias_key_as_package() {
        let manifest = manifest();
        let deps = deps(&manifest);

        match deps[1].resolve(&manifest) {
            ResolvedDependency::Subscriber { subscriber_id, .. } => {
                assert_eq!(subscriber_id, "04t6F000000N2ZvQAK");
            }
            other => panic!("expected subscriber, got {:?}", other),
        }
    }

    #[test]
    fn test_name_plus_version_finds_alias() {
        let manifest = manifest();
        let deps = deps(&manifest);

        match deps[2].resolve(&manifest) {
            ResolvedDependency::Subscriber { alias, subscriber_id } => {
                assert_eq!(alias, "Shared Labels@2.0.0-1");
                assert_eq!(subscriber_id, "04t6F000000PQRsQAO");
            }
            other => panic!("expected subscriber, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolved() {
        let manifest = manifest();
        let deps = deps(&manifest);

        assert!(deps[3].resolve(&manifest).is_unresolved());
    }
}
