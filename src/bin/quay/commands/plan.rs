//! `quay plan` command

use anyhow::Result;

use crate::cli::PlanArgs;
use crate::commands::{load_release, target_org};
use quay::core::DxProject;
use quay::ops::plan::{InstallPlan, PlanOptions};
use quay::org::SfCli;
use quay::util::GlobalContext;

pub fn execute(args: PlanArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let project = DxProject::discover(&ctx)?;
    let config = ctx.load_config();

    let release = load_release(args.release.as_deref())?;
    let options = PlanOptions {
        packages: args.packages.clone(),
    };

    let plan = if args.offline {
        InstallPlan::compute(&project, release.as_ref(), None, &options)?
    } else {
        let org = target_org(args.org.as_deref(), release.as_ref(), &config)?;
        let binary = SfCli::discover(&config)?;
        let client = SfCli::new(binary, org);
        InstallPlan::compute(&project, release.as_ref(), Some(&client), &options)?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", plan.render());
    }

    // A plan with unresolved steps can never install as-is.
    if !plan.unresolved().is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
