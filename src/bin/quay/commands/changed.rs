//! `quay changed` command

use anyhow::Result;

use crate::cli::ChangedArgs;
use quay::core::DxProject;
use quay::ops::changed::{changed, ChangedOptions};
use quay::util::GlobalContext;

pub fn execute(args: ChangedArgs, verbose: bool) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let project = DxProject::discover(&ctx)?;

    let options = ChangedOptions {
        base: args.base.clone(),
        include_dependents: args.include_dependents,
    };
    let report = changed(&project, &options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render(verbose));
    }

    // Per-package diff failures mean the report may undercount.
    if !report.is_complete() {
        std::process::exit(1);
    }

    Ok(())
}
