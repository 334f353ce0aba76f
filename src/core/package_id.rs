//! Package identification - WHAT package (name + version).
//!
//! PackageId uniquely identifies a package at a declared version. It's
//! interned for cheap comparison and cloning, which keeps graph nodes and
//! plan steps `Copy`.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{LazyLock, RwLock};

use serde::{Deserialize, Serialize};

use crate::core::version::PackageVersion;
use crate::util::InternedString;

static PACKAGE_INTERNER: LazyLock<RwLock<HashMap<PackageIdInner, &'static PackageIdInner>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A unique identifier for a package at a declared version (interned).
///
/// PackageIds compare and hash by pointer.
#[derive(Clone, Copy)]
pub struct PackageId {
    inner: &'static PackageIdInner,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PackageIdInner {
    name: InternedString,
    version: PackageVersion,
}

impl PackageId {
    /// Create a new package ID.
    pub fn new(name: impl Into<InternedString>, version: PackageVersion) -> Self {
        let inner = PackageIdInner {
            name: name.into(),
            version,
        };

        Self::intern(inner)
    }

    fn intern(inner: PackageIdInner) -> Self {
        // Fast path under the read lock.
        {
            let interner = PACKAGE_INTERNER.read().unwrap();
            if let Some(&interned) = interner.get(&inner) {
                return PackageId { inner: interned };
            }
        }

        let mut interner = PACKAGE_INTERNER.write().unwrap();

        // Re-check after acquiring the write lock.
        if let Some(&interned) = interner.get(&inner) {
            return PackageId { inner: interned };
        }

        let leaked: &'static PackageIdInner = Box::leak(Box::new(inner.clone()));
        interner.insert(inner, leaked);

        PackageId { inner: leaked }
    }

    /// Get the package name.
    pub fn name(&self) -> InternedString {
        self.inner.name
    }

    /// Get the declared package version.
    pub fn version(&self) -> &PackageVersion {
        &self.inner.version
    }

    /// Get a display string like "expense-core 1.4.0.NEXT".
    pub fn display_name(&self) -> String {
        format!("{} {}", self.inner.name, self.inner.version)
    }
}

impl PartialEq for PackageId {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.inner, other.inner)
    }
}

impl Eq for PackageId {}

impl Hash for PackageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.inner, state)
    }
}

impl PartialOrd for PackageId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner
            .name
            .cmp(&other.inner.name)
            .then_with(|| self.inner.version.cmp(&other.inner.version))
    }
}

impl fmt::Debug for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageId")
            .field("name", &self.inner.name.as_str())
            .field("version", &self.inner.version.to_string())
            .finish()
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.inner.name, self.inner.version)
    }
}

impl Serialize for PackageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct PackageIdData<'a> {
            name: &'a str,
            version: String,
        }

        let data = PackageIdData {
            name: self.inner.name.as_str(),
            version: self.inner.version.to_string(),
        };

        data.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PackageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct PackageIdData {
            name: String,
            version: String,
        }

        let data = PackageIdData::deserialize(deserializer)?;
        let version =
            PackageVersion::parse(&data.version).map_err(serde::de::Error::custom)?;

        Ok(PackageId::new(data.name, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::BuildSegment;

    fn version(s: &str) -> PackageVersion {
        PackageVersion::parse(s).unwrap()
    }

    #[test]
    fn test_package_id_interning() {
        let id1 = PackageId::new("expense-core", version("1.0.0.NEXT"));
        let id2 = PackageId::new("expense-core", version("1.0.0.NEXT"));

        assert_eq!(id1, id2);
        assert!(std::ptr::eq(id1.inner, id2.inner));
    }

    #[test]
    fn test_package_id_different_versions() {
        let id1 = PackageId::new("expense-core", version("1.0.0.1"));
        let id2 = PackageId::new("expense-core", version("2.0.0.1"));

        assert_ne!(id1, id2);
    }

    #[test]
    fn test_package_id_ordering() {
        let id1 = PackageId::new("aaa", version("1.0.0.1"));
        let id2 = PackageId::new("bbb", version("1.0.0.1"));
        let id3 = PackageId::new("aaa", version("2.0.0.1"));

        assert!(id1 < id2);
        assert!(id1 < id3);
    }

    #[test]
    fn test_display() {
        let id = PackageId::new(
            "expense-core",
            PackageVersion::new(1, 2, 3, BuildSegment::Next),
        );

        assert_eq!(id.display_name(), "expense-core 1.2.3.NEXT");
    }
}
