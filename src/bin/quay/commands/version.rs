//! `quay version` command

use anyhow::{bail, Result};

use crate::cli::{BumpArgs, VersionArgs, VersionCommands};
use quay::core::{BumpPart, DxProject};
use quay::ops::version::{bump, report, BumpOptions};
use quay::util::GlobalContext;

pub fn execute(args: VersionArgs) -> Result<()> {
    match args.command {
        VersionCommands::Report => report_command(),
        VersionCommands::Bump(args) => bump_command(args),
    }
}

fn report_command() -> Result<()> {
    let ctx = GlobalContext::new()?;
    let project = DxProject::discover(&ctx)?;
    print!("{}", report(&project).render());
    Ok(())
}

fn bump_command(args: BumpArgs) -> Result<()> {
    let part = bump_part(&args)?;

    let ctx = GlobalContext::new()?;
    let mut project = DxProject::discover(&ctx)?;

    let outcome = bump(
        &mut project,
        &BumpOptions {
            package: args.package.clone(),
            part,
            sync_deps: args.sync_deps,
        },
    )?;

    eprintln!(
        "      Bumped `{}` {} -> {}",
        outcome.package, outcome.previous, outcome.next
    );
    for dependent in &outcome.synced {
        eprintln!("      Synced pin in `{}`", dependent);
    }

    Ok(())
}

fn bump_part(args: &BumpArgs) -> Result<BumpPart> {
    match (args.major, args.minor, args.patch, args.build) {
        (true, _, _, _) => Ok(BumpPart::Major),
        (_, true, _, _) => Ok(BumpPart::Minor),
        (_, _, true, _) => Ok(BumpPart::Patch),
        (_, _, _, true) => Ok(BumpPart::Build),
        _ => bail!("pass one of --major, --minor, --patch, --build"),
    }
}
