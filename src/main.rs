mod agents;
mod cli;
mod config;
mod error;
mod hcl;
mod registry;
mod resolution;
mod surgery;
mod utils;
mod version;
mod workflow;

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use config::Config;
use registry::{CachedCatalog, RegistryClient};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = Config::load(&cli).and_then(|config| {
        let catalog = CachedCatalog::new(RegistryClient::new(&config.registry)?);
        workflow::execute_update(&config, &catalog, cli.verbose)
    });

    match result {
        Ok(report) if report.has_failures() => process::exit(1),
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "tfbump=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("TFBUMP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
