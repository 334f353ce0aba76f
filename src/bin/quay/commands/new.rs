//! `quay new` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::NewArgs;
use quay::ops::new::{new_project, NewOptions};

pub fn execute(args: NewArgs) -> Result<()> {
    let path = args.path.unwrap_or_else(|| PathBuf::from(&args.name));

    let opts = NewOptions {
        name: args.name.clone(),
        init: false,
    };

    new_project(&path, &opts)?;

    eprintln!("     Created DX project `{}`", args.name);

    Ok(())
}
