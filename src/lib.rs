//! Quay - a package lifecycle tool for Salesforce DX projects
//!
//! This crate provides the core library functionality for Quay,
//! including manifest handling, dependency graphing, validation,
//! install planning, and org execution through the vendor `sf` CLI.

pub mod core;
pub mod git;
pub mod graph;
pub mod ops;
pub mod org;
pub mod util;

/// Test utilities and mocks for Quay unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scripted org client and manifest
/// fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    dependency::PackageDependency, manifest::ProjectManifest, package::PackageEntry,
    package_id::PackageId, project::DxProject, version::PackageVersion,
};

pub use crate::graph::PackageGraph;
pub use crate::util::context::GlobalContext;
