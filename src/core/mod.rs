//! Core data structures for Quay.
//!
//! This module contains the foundational types used throughout Quay:
//! - Interned identifiers (PackageId)
//! - Four-part package versions
//! - The sfdx-project.json manifest and its cooked views
//! - Project discovery and .forceignore handling

pub mod alias;
pub mod dependency;
pub mod manifest;
pub mod package;
pub mod package_id;
pub mod project;
pub mod release;
pub mod version;

pub use alias::{id_kind, AliasEntry, AliasTable, IdKind};
pub use dependency::{PackageDependency, ResolvedDependency};
pub use manifest::ProjectManifest;
pub use package::{PackageEntry, PackageKind};
pub use package_id::PackageId;
pub use project::{
    find_project_file, DxProject, Forceignore, ProjectError, FORCEIGNORE_FILE, PROJECT_FILE,
};
pub use release::ReleaseDefinition;
pub use version::{BuildSegment, BumpPart, PackageVersion, VersionError};
