//! Superset template database rewriter.
//!
//! Reads a dashboard export template, replaces the database name it refers
//! to, and writes an upload file for Superset's Import Dashboard option.
//!
//! Exit status is 0 on success and 1 on any handled failure; argument errors
//! reported by clap keep clap's own status.

use anyhow::Context;
use clap::Parser;
use dbswap::{Cli, run};
use dbswap_core::init_logging;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet)
        .context("logging setup failed")
    {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(category = e.category(), "{}", e.detailed_message());
            ExitCode::from(e.exit_code())
        }
    }
}
