//! CLI definitions for minimon.

use std::path::PathBuf;

use clap::Parser;

/// minimon CLI.
#[derive(Debug, Parser)]
#[command(name = "minimon")]
#[command(about = "Minimal host and container monitoring agent")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (TOML, or JSON when ending in .json)
    pub config: PathBuf,
}

impl Cli {
    /// Parse the command line, printing usage and exiting with status 1 on
    /// a malformed invocation.
    pub(crate) fn parse_or_exit() -> Self {
        match Self::try_parse() {
            Ok(cli) => cli,
            Err(e) => {
                let code = if e.use_stderr() { 1 } else { 0 };
                let _ = e.print();
                std::process::exit(code);
            }
        }
    }
}
