//! Package directory entries - one per packageDirectories element.

use std::path::PathBuf;

use crate::core::package_id::PackageId;
use crate::core::dependency::PackageDependency;
use crate::core::version::PackageVersion;
use crate::util::InternedString;

/// What kind of directory a packageDirectories entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// Named and versioned; becomes a package version installed into orgs.
    Unlocked,
    /// A bare path; its metadata is deployed as source, never installed.
    Source,
}

impl PackageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageKind::Unlocked => "unlocked",
            PackageKind::Source => "source",
        }
    }
}

/// A cooked packageDirectories entry.
///
/// Cooking is lenient: an unparseable versionNumber leaves `version`
/// empty while `version_raw` keeps the original text for findings.
#[derive(Debug, Clone)]
pub struct PackageEntry {
    /// Position in packageDirectories (declaration order matters)
    pub index: usize,

    /// Directory path as declared (relative to the project root)
    pub path: PathBuf,

    /// Package name, if this directory is a package
    pub name: Option<InternedString>,

    /// Parsed versionNumber
    pub version: Option<PackageVersion>,

    /// versionNumber as written
    pub version_raw: Option<String>,

    /// Whether this is the project's default directory
    pub is_default: bool,

    /// Declared dependencies, in order
    pub dependencies: Vec<PackageDependency>,
}

impl PackageEntry {
    pub fn kind(&self) -> PackageKind {
        if self.name.is_some() {
            PackageKind::Unlocked
        } else {
            PackageKind::Source
        }
    }

    /// The entry's PackageId, when it has both a name and a parsed version.
    pub fn id(&self) -> Option<PackageId> {
        match (self.name, &self.version) {
            (Some(name), Some(version)) => Some(PackageId::new(name, version.clone())),
            _ => None,
        }
    }

    /// Display label: package name, or the path for source directories.
    pub fn label(&self) -> String {
        match self.name {
            Some(name) => name.to_string(),
            None => self.path.display().to_string(),
        }
    }
}
