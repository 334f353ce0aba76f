//! `quay pack` command

use anyhow::Result;

use crate::cli::PackArgs;
use quay::core::DxProject;
use quay::ops::pack::{pack, PackOptions};
use quay::util::GlobalContext;

pub fn execute(args: PackArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let project = DxProject::discover(&ctx)?;

    let options = PackOptions {
        package: args.package.clone(),
        out_dir: args.out_dir.clone(),
    };
    let artifact = pack(&project, &options)?;

    eprintln!(
        "      Packed `{}` {} ({} files) -> {}",
        artifact.metadata.name,
        artifact.metadata.version,
        artifact.metadata.files,
        artifact.path.display()
    );

    Ok(())
}
