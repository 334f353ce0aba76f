//! Implementation of `quay new` and `quay init`.

use std::path::Path;

use anyhow::{bail, Result};

use crate::core::manifest::{generate_default_forceignore, generate_default_manifest};
use crate::core::project::{FORCEIGNORE_FILE, PROJECT_FILE};
use crate::util::fs::{ensure_dir, write_string};

/// Options for creating a new project.
#[derive(Debug, Clone)]
pub struct NewOptions {
    /// Project name
    pub name: String,

    /// Initialize in existing directory
    pub init: bool,
}

/// Create a new DX project.
pub fn new_project(path: &Path, opts: &NewOptions) -> Result<()> {
    // Check if directory already exists
    if path.exists() && !opts.init {
        bail!(
            "destination `{}` already exists\n\
             \n\
             Use `quay init` to initialize an existing directory.",
            path.display()
        );
    }

    // Create directory if needed
    ensure_dir(path)?;

    // Check for existing sfdx-project.json
    let manifest_path = path.join(PROJECT_FILE);
    if manifest_path.exists() {
        bail!("`{}` already exists in `{}`", PROJECT_FILE, path.display());
    }

    // Write manifest
    write_string(&manifest_path, &generate_default_manifest(&opts.name))?;

    // Create the default package directory skeleton. The `main/default`
    // layers are what the source tracking tooling expects.
    ensure_dir(&path.join("force-app").join("main").join("default"))?;

    // .forceignore
    let forceignore_path = path.join(FORCEIGNORE_FILE);
    if !forceignore_path.exists() {
        write_string(&forceignore_path, &generate_default_forceignore())?;
    }

    // .gitignore
    let gitignore_path = path.join(".gitignore");
    if !gitignore_path.exists() {
        let gitignore = r#"# Quay artifacts
.quay/

# Local sfdx state
.sfdx/
.sf/

# Editor files
*.swp
*~
.vscode/
.idea/
"#;
        write_string(&gitignore_path, gitignore)?;
    }

    Ok(())
}

/// Initialize a DX project in an existing directory.
pub fn init_project(path: &Path, opts: &NewOptions) -> Result<()> {
    let mut opts = opts.clone();
    opts.init = true;
    new_project(path, &opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::ProjectManifest;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_project_layout() {
        let tmp = TempDir::new().unwrap();
        let project_dir = tmp.path().join("expense-tracker");

        let opts = NewOptions {
            name: "expense-tracker".to_string(),
            init: false,
        };

        new_project(&project_dir, &opts).unwrap();

        assert!(project_dir.join("sfdx-project.json").exists());
        assert!(project_dir.join("force-app/main/default").is_dir());
        assert!(project_dir.join(".forceignore").exists());
        assert!(project_dir.join(".gitignore").exists());
    }

    #[test]
    fn test_new_project_manifest_parses() {
        let tmp = TempDir::new().unwrap();
        let project_dir = tmp.path().join("expense-tracker");

        let opts = NewOptions {
            name: "expense-tracker".to_string(),
            init: false,
        };

        new_project(&project_dir, &opts).unwrap();

        let manifest = ProjectManifest::load(&project_dir.join("sfdx-project.json")).unwrap();
        assert_eq!(manifest.packages().len(), 1);

        let entry = manifest.package("expense-tracker").unwrap();
        assert!(entry.is_default);
        assert_eq!(entry.version_raw.as_deref(), Some("0.1.0.NEXT"));
    }

    #[test]
    fn test_new_fails_on_existing_dir() {
        let tmp = TempDir::new().unwrap();

        let opts = NewOptions {
            name: "existing".to_string(),
            init: false,
        };

        let err = new_project(tmp.path(), &opts).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_init_existing_dir() {
        let tmp = TempDir::new().unwrap();

        let opts = NewOptions {
            name: "existing".to_string(),
            init: false,
        };

        init_project(tmp.path(), &opts).unwrap();

        assert!(tmp.path().join("sfdx-project.json").exists());
    }

    #[test]
    fn test_init_fails_on_existing_manifest() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("sfdx-project.json"), "{}").unwrap();

        let opts = NewOptions {
            name: "existing".to_string(),
            init: true,
        };

        let err = init_project(tmp.path(), &opts).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_init_keeps_existing_forceignore() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".forceignore"), "custom/\n").unwrap();

        let opts = NewOptions {
            name: "existing".to_string(),
            init: true,
        };

        init_project(tmp.path(), &opts).unwrap();

        let content = fs::read_to_string(tmp.path().join(".forceignore")).unwrap();
        assert_eq!(content, "custom/\n");
    }
}
