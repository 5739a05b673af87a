// src/main.rs
// =============================================================================
// This is the entry point of the email-qa binary.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load configuration (defaults < EMAIL_QA_* env vars < flags)
// 3. Set up logging with tracing-subscriber
// 4. Either serve HTTP or run a one-off check on a file
// 5. Exit with proper code (0 = PASS, 1 = WARN/FAIL found, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands};
use email_qa::report::{QaReport, Status};
use email_qa::server::{self, AppState};
use email_qa::{QaConfig, QaEngine};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = service stopped cleanly, or the checked email passed
//   Ok(1) = the checked email has WARN or FAIL findings
//   Err   = configuration, IO or startup error
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let bind = match &cli.command {
        Commands::Serve { bind } => bind.clone(),
        Commands::Check { .. } => None,
    };
    let config = QaConfig::from_env()?.override_with(bind, cli.timeout_secs, cli.concurrency)?;

    init_tracing(config.log_json);

    let engine = QaEngine::from_config(&config)?;

    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!(
                timeout_secs = config.link_timeout.as_secs(),
                max_concurrent_checks = config.max_concurrent_checks,
                max_body_bytes = config.max_body_bytes,
                "starting email-qa"
            );
            let state = AppState::new(engine).with_max_body_bytes(config.max_body_bytes);
            server::serve(&config.bind_addr, state).await?;
            Ok(0)
        }
        Commands::Check { file, json } => {
            let html = read_input(&file)?;
            let report = engine.run(&html).await;

            print_report(&report, json)?;

            Ok(if report.overall == Status::Pass { 0 } else { 1 })
        }
    }
}

// RUST_LOG wins when set; otherwise info. EMAIL_QA_LOG_JSON switches the
// output to one JSON object per line for log shippers.
fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn read_input(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut html = String::new();
        std::io::stdin()
            .read_to_string(&mut html)
            .context("Failed to read HTML from stdin")?;
        return Ok(html);
    }

    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

// Prints the report either as a table or JSON
fn print_report(report: &QaReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_table(report);
    }
    Ok(())
}

// Prints the report as a human-readable table in the terminal
fn print_table(report: &QaReport) {
    println!("{:<15} {:<8} {:<60}", "CHECK", "STATUS", "DETAILS");
    println!("{}", "=".repeat(85));

    for finding in &report.findings {
        let details = serde_json::Value::Object(finding.details.clone()).to_string();

        // Truncate long detail lines (URLs with tracking params get long)
        let details_display = if details.chars().count() > 60 {
            format!("{}...", details.chars().take(57).collect::<String>())
        } else {
            details
        };

        println!(
            "{:<15} {:<8} {:<60}",
            finding.check_name.as_str(),
            format_status(finding.status),
            details_display
        );
    }

    println!();
    println!("📊 Overall: {}", format_status(report.overall));
}

fn format_status(status: Status) -> String {
    match status {
        Status::Pass => "✅ PASS".to_string(),
        Status::Warn => "⚠️  WARN".to_string(),
        Status::Fail => "❌ FAIL".to_string(),
    }
}
