// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - serve: run the HTTP service (the normal deployment mode)
// - check: run the same QA pipeline once on a local HTML file, handy in CI
//          or when debugging a single campaign
//
// Every flag here is optional and overrides the matching EMAIL_QA_* variable.
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "email-qa",
    version,
    about = "QA checks for marketing email HTML: liquid balance, broken links, UTM tags",
    long_about = "email-qa checks marketing email HTML for unbalanced liquid delimiters, \
                  unreachable links and missing campaign tracking parameters. \
                  Run it as an HTTP service (serve) or against a single file (check)."
)]
pub struct Cli {
    /// Per-link timeout in seconds (env: EMAIL_QA_LINK_TIMEOUT_SECS, default 5)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Links of one message checked at the same time (env: EMAIL_QA_MAX_CONCURRENT_CHECKS, default 16)
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve POST /actions/qa_message over HTTP
    ///
    /// Example: email-qa serve --bind 127.0.0.1:8080
    Serve {
        /// Address to listen on (env: EMAIL_QA_BIND, default 0.0.0.0:8080)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run the QA checks once on an HTML file and print the report
    ///
    /// Example: email-qa check newsletter.html --json
    Check {
        /// Path to the HTML file, or '-' to read from stdin
        file: PathBuf,

        /// Output the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}
