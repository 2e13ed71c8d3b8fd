//! vtree CLI Binary
//!
//! Prints the visible rows of a lazily expanded directory tree.

use clap::Parser;
use std::process;
use vtree::logging::init_logging;
use vtree::tooling::{Cli, CliContext};

fn main() {
    let cli = Cli::parse();

    let mut context = match CliContext::new(cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading configuration: {:#}", e);
            process::exit(1);
        }
    };
    context.apply_log_overrides(&cli);

    if let Err(e) = init_logging(Some(&context.config().logging)) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    match context.execute(&cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
