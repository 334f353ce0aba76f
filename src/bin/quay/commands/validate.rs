//! `quay validate` command

use anyhow::Result;

use crate::cli::ValidateArgs;
use quay::core::DxProject;
use quay::ops::validate::{format_report_for_output, validate, OutputFormat, ValidateOptions};
use quay::util::GlobalContext;

pub fn execute(args: ValidateArgs, verbose: bool) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let project = DxProject::discover(&ctx)?;

    let format: OutputFormat = args.output_format.parse()?;

    let options = ValidateOptions {
        base: args.base,
        strict: args.strict,
        verbose,
        output_format: format,
    };

    let report = validate(&options, &project)?;

    print!("{}", format_report_for_output(&report, format, verbose));

    // CI keys off the exit code
    if !report.passed {
        std::process::exit(1);
    }

    Ok(())
}
