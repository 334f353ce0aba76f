//! `quay init` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::InitArgs;
use quay::ops::new::{init_project, NewOptions};

/// Determines the project name from the arguments or directory.
pub fn determine_project_name(name: &Option<String>, path: &PathBuf) -> String {
    name.clone().unwrap_or_else(|| {
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed")
            .to_string()
    })
}

pub fn execute(args: InitArgs) -> Result<()> {
    let path = args.path.unwrap_or_else(|| PathBuf::from("."));

    let path = if path == PathBuf::from(".") {
        std::env::current_dir()?
    } else {
        path
    };

    let name = determine_project_name(&args.name, &path);

    let opts = NewOptions {
        name: name.clone(),
        init: true,
    };

    init_project(&path, &opts)?;

    eprintln!("     Initialized DX project `{}`", name);

    Ok(())
}
