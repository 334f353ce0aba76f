//! Four-segment package version numbers.
//!
//! Salesforce package versions are `major.minor.patch.build` where the
//! build segment is either a number assigned by the platform, the keyword
//! `NEXT` (build allocated at package-version creation), or the keyword
//! `LATEST` (only valid in dependency position: the newest build of that
//! `major.minor.patch`).

use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors produced when parsing or manipulating version numbers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid version `{input}`: expected `major.minor.patch.build`")]
    SegmentCount { input: String },

    #[error("invalid version `{input}`: {reason}")]
    Segment { input: String, reason: String },

    #[error("`LATEST` is only valid in a dependency's versionNumber")]
    LatestNotAllowed,

    #[error("cannot bump the build segment of a `{keyword}` version")]
    SymbolicBuild { keyword: String },
}

/// The build segment of a package version.
///
/// The derived ordering puts every concrete build below `NEXT`, and
/// `NEXT` below `LATEST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildSegment {
    Number(u32),
    Next,
    Latest,
}

impl BuildSegment {
    pub fn is_concrete(&self) -> bool {
        matches!(self, BuildSegment::Number(_))
    }
}

impl fmt::Display for BuildSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildSegment::Number(n) => write!(f, "{}", n),
            BuildSegment::Next => write!(f, "NEXT"),
            BuildSegment::Latest => write!(f, "LATEST"),
        }
    }
}

/// Which part of a version to bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpPart {
    Major,
    Minor,
    Patch,
    Build,
}

/// A four-segment package version.
///
/// The first three segments are held as a [`semver::Version`] (with empty
/// pre-release and build metadata); the platform build segment rides
/// alongside. Ordering compares the base first, then the build segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageVersion {
    pub base: Version,
    pub build: BuildSegment,
}

impl PackageVersion {
    pub fn new(major: u64, minor: u64, patch: u64, build: BuildSegment) -> Self {
        PackageVersion {
            base: Version::new(major, minor, patch),
            build,
        }
    }

    /// Parse a dotted version (`1.4.0.3`, `1.4.0.NEXT`, `1.4.0.LATEST`).
    ///
    /// Accepts `LATEST`; callers validating a package's own versionNumber
    /// should also check [`PackageVersion::is_latest`].
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let parts: Vec<&str> = input.split('.').collect();
        if parts.len() != 4 {
            return Err(VersionError::SegmentCount {
                input: input.to_string(),
            });
        }

        let base = parse_base(input, parts[0], parts[1], parts[2])?;
        let build = parse_build(input, parts[3])?;

        Ok(PackageVersion { base, build })
    }

    /// Parse the version suffix of a subscriber alias key (`1.4.0-3`).
    ///
    /// The build segment of an alias suffix is always concrete.
    pub fn parse_alias_suffix(input: &str) -> Result<Self, VersionError> {
        let (base_str, build_str) =
            input
                .rsplit_once('-')
                .ok_or_else(|| VersionError::SegmentCount {
                    input: input.to_string(),
                })?;

        let parts: Vec<&str> = base_str.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionError::SegmentCount {
                input: input.to_string(),
            });
        }

        let base = parse_base(input, parts[0], parts[1], parts[2])?;
        let build: u32 = build_str.parse().map_err(|_| VersionError::Segment {
            input: input.to_string(),
            reason: format!("invalid build number `{}`", build_str),
        })?;

        Ok(PackageVersion {
            base,
            build: BuildSegment::Number(build),
        })
    }

    pub fn is_latest(&self) -> bool {
        self.build == BuildSegment::Latest
    }

    pub fn is_concrete(&self) -> bool {
        self.build.is_concrete()
    }

    /// Bump the given part, returning the new version.
    ///
    /// Bumping major/minor/patch zeroes the lower base segments and
    /// restarts a concrete build at 1 (the platform numbers builds per
    /// base version); a symbolic build segment is carried over. Bumping
    /// the build requires a concrete build number.
    pub fn bump(&self, part: BumpPart) -> Result<PackageVersion, VersionError> {
        let mut next = self.clone();
        match part {
            BumpPart::Major => {
                next.base = Version::new(self.base.major + 1, 0, 0);
                next.build = restart_build(self.build);
            }
            BumpPart::Minor => {
                next.base = Version::new(self.base.major, self.base.minor + 1, 0);
                next.build = restart_build(self.build);
            }
            BumpPart::Patch => {
                next.base =
                    Version::new(self.base.major, self.base.minor, self.base.patch + 1);
                next.build = restart_build(self.build);
            }
            BumpPart::Build => match self.build {
                BuildSegment::Number(n) => next.build = BuildSegment::Number(n + 1),
                other => {
                    return Err(VersionError::SymbolicBuild {
                        keyword: other.to_string(),
                    })
                }
            },
        }
        Ok(next)
    }

    /// Whether an installed version satisfies this version as a dependency
    /// requirement.
    ///
    /// A concrete requirement is a floor; `LATEST` and `NEXT` only pin the
    /// base, so any installed build of an equal-or-higher base satisfies
    /// them.
    pub fn satisfied_by(&self, installed: &PackageVersion) -> bool {
        match self.build {
            BuildSegment::Number(_) => installed >= self,
            BuildSegment::Next | BuildSegment::Latest => installed.base >= self.base,
        }
    }

    /// Base-only comparison, ignoring the build segment.
    pub fn same_base(&self, other: &PackageVersion) -> bool {
        self.base == other.base
    }
}

fn parse_base(
    input: &str,
    major: &str,
    minor: &str,
    patch: &str,
) -> Result<Version, VersionError> {
    let parse_segment = |s: &str, which: &str| -> Result<u64, VersionError> {
        s.parse().map_err(|_| VersionError::Segment {
            input: input.to_string(),
            reason: format!("invalid {} segment `{}`", which, s),
        })
    };

    Ok(Version::new(
        parse_segment(major, "major")?,
        parse_segment(minor, "minor")?,
        parse_segment(patch, "patch")?,
    ))
}

fn parse_build(input: &str, segment: &str) -> Result<BuildSegment, VersionError> {
    match segment {
        "NEXT" => Ok(BuildSegment::Next),
        "LATEST" => Ok(BuildSegment::Latest),
        n => n
            .parse()
            .map(BuildSegment::Number)
            .map_err(|_| VersionError::Segment {
                input: input.to_string(),
                reason: format!("invalid build segment `{}`", n),
            }),
    }
}

fn restart_build(build: BuildSegment) -> BuildSegment {
    match build {
        BuildSegment::Number(_) => BuildSegment::Number(1),
        symbolic => symbolic,
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.base.major, self.base.minor, self.base.patch, self.build
        )
    }
}

impl FromStr for PackageVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageVersion::parse(s)
    }
}

impl Serialize for PackageVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PackageVersion::parse(&s).map_err(serde::de::Error::custom)
    }
}
