//! CLI entry point for the domain security auditor
//!
//! ```bash
//! # Audit a domain, human-readable output
//! mailaudit example.com
//!
//! # Machine-readable report
//! mailaudit example.com --json
//!
//! # Custom configuration and probe deadline
//! mailaudit example.com --config mailaudit.toml --timeout 10
//! ```

use clap::Parser;
use mailaudit_rs::config::Config;
use mailaudit_rs::{domain, evaluator, report, runner};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailaudit")]
#[command(about = "Audit a domain's email security posture (DMARC, SPF, DKIM, SMTP)", long_about = None)]
struct Cli {
    /// Domain to audit (e.g. example.com)
    domain: String,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Per-probe deadline in seconds (overrides the config file)
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(timeout) = cli.timeout {
        config.probe.timeout_secs = timeout;
    }

    // Default to the configured level; RUST_LOG still wins when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let domain = domain::validate_domain(&cli.domain)?;

    info!("Auditing {}", domain);
    let findings = runner::run_probes(&domain, &config).await;
    let security_report = evaluator::evaluate(&domain, &findings);

    if cli.json {
        println!("{}", report::render_json(&security_report)?);
    } else {
        print!("{}", report::render_text(&security_report, &findings));
    }

    Ok(())
}
