//! `quay install` command

use anyhow::Result;

use crate::cli::InstallArgs;
use crate::commands::{load_release, target_org};
use quay::core::DxProject;
use quay::ops::install::InstallQueue;
use quay::ops::plan::{InstallPlan, PlanOptions};
use quay::org::SfCli;
use quay::util::GlobalContext;

pub fn execute(args: InstallArgs, verbose: bool) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let project = DxProject::discover(&ctx)?;
    let config = ctx.load_config();

    let release = load_release(args.release.as_deref())?;
    let org = target_org(args.org.as_deref(), release.as_ref(), &config)?;

    let binary = SfCli::discover(&config)?;
    let client = SfCli::new(binary, org);

    let options = PlanOptions {
        packages: args.packages.clone(),
    };
    let plan = InstallPlan::compute(&project, release.as_ref(), Some(&client), &options)?;

    if args.dry_run {
        print!("{}", plan.render());
        if !plan.unresolved().is_empty() {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Timing: CLI > release definition > config
    let wait = args
        .wait
        .or(release.as_ref().and_then(|r| r.wait_mins))
        .unwrap_or_else(|| config.wait_mins());
    let poll = args
        .poll_interval
        .or(release.as_ref().and_then(|r| r.poll_secs))
        .unwrap_or_else(|| config.poll_secs());

    let report = InstallQueue::new(&client)
        .release(release.as_ref())
        .timing(wait, poll)
        .keep_going(args.keep_going)
        .verbose(verbose)
        .run(&plan, project.root())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("   Installed to `{}`: {}", report.org, report.summary());
    }

    if !report.succeeded() {
        std::process::exit(1);
    }

    Ok(())
}
