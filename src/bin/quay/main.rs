//! Quay CLI - package lifecycle automation for Salesforce DX projects

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("quay=debug")
    } else {
        EnvFilter::new("quay=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // NO_COLOR wins over the default; the flag wins over everything.
    let color = !cli.no_color && std::env::var_os("NO_COLOR").is_none();

    // Execute command
    match cli.command {
        Commands::New(args) => commands::new::execute(args),
        Commands::Init(args) => commands::init::execute(args),
        Commands::Validate(args) => commands::validate::execute(args, cli.verbose),
        Commands::Tree(args) => commands::tree::execute(args, color),
        Commands::Explain(args) => commands::explain::execute(args, color),
        Commands::Plan(args) => commands::plan::execute(args),
        Commands::Install(args) => commands::install::execute(args, cli.verbose),
        Commands::Version(args) => commands::version::execute(args),
        Commands::Changed(args) => commands::changed::execute(args, cli.verbose),
        Commands::Pack(args) => commands::pack::execute(args),
        Commands::Doctor(args) => commands::doctor::execute(args, cli.verbose),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
