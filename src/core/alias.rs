//! The packageAliases table.
//!
//! Alias keys come in two forms: a bare package name mapping to a `0Ho`
//! package ID, and `name@major.minor.patch-build` mapping to a `04t`
//! subscriber package version ID. Install planning resolves dependency
//! pins to `04t` IDs through this table.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::core::version::PackageVersion;

static SALESFORCE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0Ho|04t)[a-zA-Z0-9]{12}([a-zA-Z0-9]{3})?$").unwrap());

/// What a Salesforce ID value identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// `0Ho` - a package
    Package,
    /// `04t` - a subscriber package version
    SubscriberVersion,
    /// Not a recognizable Salesforce ID
    Invalid,
}

/// Classify an alias value by its ID prefix and shape.
pub fn id_kind(id: &str) -> IdKind {
    if !SALESFORCE_ID.is_match(id) {
        return IdKind::Invalid;
    }
    if id.starts_with("0Ho") {
        IdKind::Package
    } else {
        IdKind::SubscriberVersion
    }
}

/// One packageAliases entry, with its key split into name and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    /// Key as written
    pub key: String,

    /// Name part (before `@`, or the whole key)
    pub name: String,

    /// Version suffix, when the key is `name@M.m.p-b`
    pub version: Option<PackageVersion>,

    /// The ID value as written
    pub id: String,
}

impl AliasEntry {
    pub fn id_kind(&self) -> IdKind {
        id_kind(&self.id)
    }
}

/// The cooked packageAliases table, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    /// Cook the raw alias map.
    ///
    /// Non-string values are kept (rendered as JSON) so validation can
    /// report them instead of dropping them silently.
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        let entries = raw
            .iter()
            .map(|(key, value)| {
                let id = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };

                let (name, version) = match key.split_once('@') {
                    Some((name, suffix)) => (
                        name.to_string(),
                        PackageVersion::parse_alias_suffix(suffix).ok(),
                    ),
                    None => (key.clone(), None),
                };

                AliasEntry {
                    key: key.clone(),
                    name,
                    version,
                    id,
                }
            })
            .collect();

        AliasTable { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AliasEntry> {
        self.entries.iter()
    }

    /// Exact-key lookup returning the raw ID.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entry(key).map(|e| e.id.as_str())
    }

    /// Exact-key lookup.
    pub fn entry(&self, key: &str) -> Option<&AliasEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Find the subscriber version alias for a package at a version.
    ///
    /// A dependency pin `1.4.0.3` matches the alias key `name@1.4.0-3`.
    /// A symbolic pin (`LATEST`/`NEXT`) matches the highest aliased build
    /// of the same base.
    pub fn subscriber_for(&self, name: &str, version: &PackageVersion) -> Option<&AliasEntry> {
        let mut best: Option<&AliasEntry> = None;

        for entry in &self.entries {
            if entry.name != name || entry.id_kind() != IdKind::SubscriberVersion {
                continue;
            }
            let Some(alias_version) = &entry.version else {
                continue;
            };

            let matches = if version.is_concrete() {
                alias_version == version
            } else {
                alias_version.base == version.base
            };
            if !matches {
                continue;
            }

            match best {
                Some(current) if current.version.as_ref() >= Some(alias_version) => {}
                _ => best = Some(entry),
            }
        }

        best
    }

    /// All subscriber version aliases for a package name.
    pub fn subscriber_versions(&self, name: &str) -> Vec<&AliasEntry> {
        self.entries
            .iter()
            .filter(|e| {
                e.name == name
                    && e.version.is_some()
                    && e.id_kind() == IdKind::SubscriberVersion
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AliasTable {
        let raw: Map<String, Value> = serde_json::from_str(
            r#"{
  "expense-core": "0Ho6F000000CaRbSAK",
  "expense-core@1.4.0-2": "04t6F000000N2YtQAK",
  "expense-core@1.4.0-3": "04t6F000000N2ZvQAK",
  "expense-core@1.5.0-1": "04t6F000000N3AaQAK",
  "broken": 42
}"#,
        )
        .unwrap();
        AliasTable::from_raw(&raw)
    }

    #[test]
    fn test_id_kind() {
        assert_eq!(id_kind("0Ho6F000000CaRbSAK"), IdKind::Package);
        assert_eq!(id_kind("04t6F000000N2ZvQAK"), IdKind::SubscriberVersion);
        assert_eq!(id_kind("04t6F000000N2Zv"), IdKind::SubscriberVersion);
        assert_eq!(id_kind("001000000000001"), IdKind::Invalid);
        assert_eq!(id_kind("04tshort"), IdKind::Invalid);
    }

    #[test]
    fn test_key_splitting() {
        let table = table();

        let bare = table.entry("expense-core").unwrap();
        assert_eq!(bare.name, "expense-core");
        assert!(bare.version.is_none());

        let versioned = table.entry("expense-core@1.4.0-3").unwrap();
        assert_eq!(versioned.name, "expense-core");
        assert_eq!(
            versioned.version.as_ref().unwrap().to_string(),
            "1.4.0.3"
        );
    }

    #[test]
    fn test_subscriber_for_concrete() {
        let table = table();
        let version = PackageVersion::parse("1.4.0.3").unwrap();

        let entry = table.subscriber_for("expense-core", &version).unwrap();
        assert_eq!(entry.id, "04t6F000000N2ZvQAK");

        let missing = PackageVersion::parse("9.9.9.9").unwrap();
        assert!(table.subscriber_for("expense-core", &missing).is_none());
    }

    #[test]
    fn test_subscriber_for_latest_takes_highest_build() {
        let table = table();
        let version = PackageVersion::parse("1.4.0.LATEST").unwrap();

        let entry = table.subscriber_for("expense-core", &version).unwrap();
        assert_eq!(entry.key, "expense-core@1.4.0-3");
    }

    #[test]
    fn test_non_string_value_kept_for_validation() {
        let table = table();
        let broken = table.entry("broken").unwrap();

        assert_eq!(broken.id, "42");
        assert_eq!(broken.id_kind(), IdKind::Invalid);
    }

    #[test]
    fn test_subscriber_versions() {
        let table = table();
        assert_eq!(table.subscriber_versions("expense-core").len(), 3);
        assert!(table.subscriber_versions("other").is_empty());
    }
}
