//! Artifact packaging.
//!
//! `quay pack` rolls one package directory into `<name>-<version>.tar.gz`
//! containing the `.forceignore`-filtered source tree plus a generated
//! `artifact.json` describing the contents: name, version, dependency
//! pins, a fingerprint over the source files, and the pack timestamp.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::core::DxProject;
use crate::util::diagnostic::UnknownPackageError;
use crate::util::fs::ensure_dir;
use crate::util::hash::{sha256_file, Fingerprint};

/// Options for `quay pack`.
#[derive(Debug, Clone)]
pub struct PackOptions {
    pub package: String,
    /// Output directory, `.quay/dist` when unset
    pub out_dir: Option<PathBuf>,
}

/// The generated `artifact.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    pub version: String,
    pub packed_at: DateTime<Utc>,
    pub dependencies: Vec<ArtifactDependency>,
    pub files: usize,
    /// SHA256 over the file list and contents
    pub fingerprint: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactDependency {
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<String>,
}

/// A tarball written by [`pack`].
#[derive(Debug)]
pub struct PackedArtifact {
    pub path: PathBuf,
    pub metadata: ArtifactMetadata,
}

/// Pack one package into a source artifact.
pub fn pack(project: &DxProject, options: &PackOptions) -> Result<PackedArtifact> {
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
    let Some(version) = entry.version.clone() else {
        bail!("package `{}` has no versionNumber to pack", options.package);
    };

    let package_dir = project.package_dir(entry);
    if !package_dir.is_dir() {
        bail!(
            "package directory {} does not exist",
            entry.path.display()
        );
    }
    let forceignore = project.forceignore()?;

    // Stable walk order keeps the fingerprint deterministic.
    let mut files: Vec<(PathBuf, PathBuf)> = Vec::new();
    for walked in WalkDir::new(&package_dir).sort_by_file_name() {
        let walked = walked.with_context(|| {
            format!("failed to walk package directory {}", entry.path.display())
        })?;
        if !walked.file_type().is_file() {
            continue;
        }

        let absolute = walked.path();
        if let Ok(project_rel) = absolute.strip_prefix(project.root()) {
            if forceignore.is_ignored(project_rel) {
                continue;
            }
        }

        let archive_rel = absolute
            .strip_prefix(&package_dir)
            .context("walked file is outside the package directory")?
            .to_path_buf();
        files.push((absolute.to_path_buf(), archive_rel));
    }

    let mut fp = Fingerprint::new();
    fp.update_str(&options.package)
        .update_str(&version.to_string());
    for (absolute, archive_rel) in &files {
        fp.update_str(&archive_rel.to_string_lossy().replace('\\', "/"));
        fp.update_str(&sha256_file(absolute)?);
    }

    let metadata = ArtifactMetadata {
        name: options.package.clone(),
        version: version.to_string(),
        packed_at: Utc::now(),
        dependencies: entry
            .dependencies
            .iter()
            .map(|d| ArtifactDependency {
                package: d.package.clone(),
                version: d.version.as_ref().map(ToString::to_string),
            })
            .collect(),
        files: files.len(),
        fingerprint: fp.finish(),
    };

    let out_dir = match &options.out_dir {
        Some(dir) => dir.clone(),
        None => project.quay_dir().join("dist"),
    };
    ensure_dir(&out_dir)?;

    let stem = format!("{}-{}", options.package, version);
    let tarball_path = out_dir.join(format!("{}.tar.gz", stem));

    let file = File::create(&tarball_path)
        .with_context(|| format!("failed to create {}", tarball_path.display()))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (absolute, archive_rel) in &files {
        builder
            .append_path_with_name(absolute, Path::new(&stem).join(archive_rel))
            .with_context(|| {
                format!("failed to add {} to the archive", archive_rel.display())
            })?;
    }

    let mut json = serde_json::to_string_pretty(&metadata)
        .context("failed to serialize artifact.json")?;
    json.push('\n');
    let mut header = tar::Header::new_gnu();
    header.set_size(json.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(
            &mut header,
            Path::new(&stem).join("artifact.json"),
            json.as_bytes(),
        )
        .context("failed to add artifact.json to the archive")?;

    let encoder = builder
        .into_inner()
        .context("failed to finish the archive")?;
    encoder
        .finish()
        .context("failed to flush the gzip stream")?;

    tracing::info!(
        artifact = %tarball_path.display(),
        files = files.len(),
        "packed"
    );

    Ok(PackedArtifact {
        path: tarball_path,
        metadata,
    })
}
