//! sfdx-project.json parsing and schema.
//!
//! The project file is the central manifest of a DX project: an ordered
//! list of package directories plus the alias table mapping package names
//! to Salesforce IDs. The format is owned by Salesforce, so unknown fields
//! are carried through untouched and written back on save.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::alias::AliasTable;
use crate::core::dependency::PackageDependency;
use crate::core::package::PackageEntry;
use crate::core::version::PackageVersion;
use crate::util::InternedString;

/// Raw project file as deserialized from JSON.
///
/// Typed fields cover what quay reads and writes; everything else rides
/// in the flattened `extra` maps so a save never drops data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProject {
    #[serde(default)]
    package_directories: Vec<RawPackageDirectory>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    package_aliases: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    sfdc_login_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_api_version: Option<String>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPackageDirectory {
    path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    package: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version_name: Option<String>,

    #[serde(default, rename = "default", skip_serializing_if = "is_false")]
    is_default: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<RawDependency>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDependency {
    package: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version_number: Option<String>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// The parsed sfdx-project.json.
///
/// Holds both the cooked views the rest of the crate works with and the
/// raw document, so edits can be written back without losing fields quay
/// does not model.
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    raw: RawProject,

    /// Package directories in declaration order
    packages: Vec<PackageEntry>,

    /// Cooked packageAliases table
    aliases: AliasTable,

    /// Path this manifest was loaded from
    path: PathBuf,
}

impl ProjectManifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read project file: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    ///
    /// Parsing is lenient about version strings and dependency targets;
    /// those problems surface as validation findings, not parse errors,
    /// so a project with one bad entry can still be inspected.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawProject =
            serde_json::from_str(content).context("failed to parse sfdx-project.json")?;

        if raw.package_directories.is_empty() {
            anyhow::bail!(
                "project file at {} declares no packageDirectories",
                path.display()
            );
        }

        let packages = raw
            .package_directories
            .iter()
            .enumerate()
            .map(|(index, dir)| cook_directory(index, dir))
            .collect();

        let aliases = AliasTable::from_raw(&raw.package_aliases);

        Ok(ProjectManifest {
            raw,
            packages,
            aliases,
            path: path.to_path_buf(),
        })
    }

    /// Write the manifest back to the path it was loaded from.
    pub fn save(&self) -> Result<()> {
        let mut contents = serde_json::to_string_pretty(&self.raw)
            .context("failed to serialize sfdx-project.json")?;
        contents.push('\n');

        std::fs::write(&self.path, contents)
            .with_context(|| format!("failed to write project file: {}", self.path.display()))
    }

    /// Path of the manifest file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the manifest.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Package directories in declaration order.
    pub fn packages(&self) -> &[PackageEntry] {
        &self.packages
    }

    /// Look up a package directory by its package name.
    pub fn package(&self, name: &str) -> Option<&PackageEntry> {
        self.packages
            .iter()
            .find(|p| p.name.map(|n| n == name).unwrap_or(false))
    }

    /// Names of all named packages, in declaration order.
    pub fn package_names(&self) -> Vec<InternedString> {
        self.packages.iter().filter_map(|p| p.name).collect()
    }

    /// Package directories flagged `default`.
    pub fn default_directories(&self) -> Vec<&PackageEntry> {
        self.packages.iter().filter(|p| p.is_default).collect()
    }

    /// The cooked packageAliases table.
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn namespace(&self) -> Option<&str> {
        self.raw.namespace.as_deref()
    }

    pub fn sfdc_login_url(&self) -> Option<&str> {
        self.raw.sfdc_login_url.as_deref()
    }

    pub fn source_api_version(&self) -> Option<&str> {
        self.raw.source_api_version.as_deref()
    }

    /// Set a package's versionNumber, in both the cooked view and raw
    /// document. Returns false when no directory declares the package.
    pub fn set_package_version(&mut self, name: &str, version: &PackageVersion) -> bool {
        let Some(index) = self
            .packages
            .iter()
            .position(|p| p.name.map(|n| n == name).unwrap_or(false))
        else {
            return false;
        };

        self.raw.package_directories[index].version_number = Some(version.to_string());
        self.packages[index].version = Some(version.clone());
        self.packages[index].version_raw = Some(version.to_string());
        true
    }

    /// Set the pinned version of `dep` inside `dependent`'s dependency
    /// list. Returns false when the pair is not declared.
    pub fn set_dependency_version(
        &mut self,
        dependent: &str,
        dep: &str,
        version: &PackageVersion,
    ) -> bool {
        let Some(pkg_index) = self
            .packages
            .iter()
            .position(|p| p.name.map(|n| n == dependent).unwrap_or(false))
        else {
            return false;
        };

        let Some(dep_index) = self.packages[pkg_index]
            .dependencies
            .iter()
            .position(|d| d.package == dep)
        else {
            return false;
        };

        self.raw.package_directories[pkg_index].dependencies[dep_index].version_number =
            Some(version.to_string());
        let cooked = &mut self.packages[pkg_index].dependencies[dep_index];
        cooked.version = Some(version.clone());
        cooked.version_raw = Some(version.to_string());
        true
    }
}

fn cook_directory(index: usize, dir: &RawPackageDirectory) -> PackageEntry {
    let name = dir.package.as_deref().map(InternedString::new);

    let (version, version_raw) = match &dir.version_number {
        Some(raw) => (PackageVersion::parse(raw).ok(), Some(raw.clone())),
        None => (None, None),
    };

    let dependencies = dir
        .dependencies
        .iter()
        .map(|d| {
            let (version, version_raw) = match &d.version_number {
                Some(raw) => (PackageVersion::parse(raw).ok(), Some(raw.clone())),
                None => (None, None),
            };
            PackageDependency {
                package: d.package.clone(),
                version,
                version_raw,
            }
        })
        .collect();

    PackageEntry {
        index,
        path: PathBuf::from(&dir.path),
        name,
        version,
        version_raw,
        is_default: dir.is_default,
        dependencies,
    }
}

/// Generate a default sfdx-project.json for a new project.
pub fn generate_default_manifest(name: &str) -> String {
    format!(
        r#"{{
  "packageDirectories": [
    {{
      "path": "force-app",
      "package": "{name}",
      "versionNumber": "0.1.0.NEXT",
      "default": true
    }}
  ],
  "name": "{name}",
  "namespace": "",
  "sfdcLoginUrl": "https://login.salesforce.com",
  "sourceApiVersion": "61.0"
}}
"#
    )
}

/// Generate a default .forceignore for a new project.
pub fn generate_default_forceignore() -> String {
    "# macOS\n\
     **/.DS_Store\n\
     \n\
     # Local sfdx config\n\
     **/.sfdx\n\
     **/.sf\n\
     \n\
     # Tooling\n\
     **/jsconfig.json\n\
     **/.eslintrc.json\n"
        .to_string()
}
