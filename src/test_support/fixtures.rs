//! Shared project fixtures.

use std::path::Path;

use crate::core::{DxProject, PROJECT_FILE};

/// Three packages plus an unpackaged source directory: `expense-core`
/// (default), `expense-api` depending on core and on an external
/// managed package, and `unpackaged/config`. Released builds of core
/// and api are aliased.
pub const THREE_PACKAGE_MANIFEST: &str = r#"{
  "packageDirectories": [
    { "path": "pkgs/core", "package": "expense-core", "versionNumber": "1.4.0.NEXT", "default": true },
    {
      "path": "pkgs/api",
      "package": "expense-api",
      "versionNumber": "1.2.0.NEXT",
      "dependencies": [
        { "package": "Marketing Base@2.1.0-4" },
        { "package": "expense-core", "versionNumber": "1.4.0.LATEST" }
      ]
    },
    { "path": "unpackaged/config" }
  ],
  "packageAliases": {
    "expense-core": "0Ho6F000000CaRbSAK",
    "expense-core@1.4.0-3": "04t6F000000N2ZvQAK",
    "expense-api@1.2.0-1": "04t6F000000ApiAQAS",
    "Marketing Base@2.1.0-4": "04t6F000000MktBQAS"
  },
  "sfdcLoginUrl": "https://login.salesforce.com"
}"#;

/// Write `sfdx-project.json` into `dir`, create every declared package
/// directory, and open the project.
pub fn create_test_project(dir: &Path, manifest_json: &str) -> DxProject {
    let manifest_path = dir.join(PROJECT_FILE);
    std::fs::write(&manifest_path, manifest_json).unwrap();

    let project = DxProject::open(&manifest_path).unwrap();
    for entry in project.manifest().packages() {
        std::fs::create_dir_all(project.package_dir(entry)).unwrap();
    }
    project
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_three_package_fixture_loads() {
        let tmp = TempDir::new().unwrap();
        let project = create_test_project(tmp.path(), THREE_PACKAGE_MANIFEST);

        assert_eq!(project.manifest().packages().len(), 3);
        assert_eq!(project.manifest().aliases().len(), 4);
        assert!(tmp.path().join("pkgs/api").is_dir());
    }
}
