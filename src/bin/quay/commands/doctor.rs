//! `quay doctor` command

use anyhow::Result;

use crate::cli::DoctorArgs;
use quay::ops::doctor::{doctor, format_report, DoctorOptions};

pub fn execute(args: DoctorArgs, verbose: bool) -> Result<()> {
    let options = DoctorOptions {
        verbose,
        offline: args.offline,
    };

    let report = doctor(options)?;
    print!("{}", format_report(&report, verbose));

    // Exit with error code if required checks failed
    if !report.all_required_passed() {
        std::process::exit(1);
    }

    Ok(())
}
