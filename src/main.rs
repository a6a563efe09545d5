use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gmail_labeler::config::LabelerConfig;
use gmail_labeler::gmail::{GmailClient, MailService, load_access_token};
use gmail_labeler::labeler::Labeler;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    /// One JSON object per line with an RFC 3339 timestamp.
    Json,
    /// Human-readable lines.
    Pretty,
}

#[derive(Parser)]
#[command(name = "gmail-labeler")]
#[command(about = "Update gmail labels to focus on unread, important, emails", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, env = "GMAIL_LABELER_CONFIG", default_value = "./config.json")]
    config: PathBuf,

    /// Apply label changes (without this the run is dry)
    #[arg(long, overrides_with = "no_prod_run")]
    prod_run: bool,

    /// Only report what would change
    #[arg(long, overrides_with = "prod_run")]
    no_prod_run: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "json")]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = LabelerConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    let dry_run = !cli.prod_run || cli.no_prod_run;
    if dry_run {
        warn!("Dry run: label changes will be skipped, pass --prod-run to apply them");
    }

    let token = load_access_token(&config.secrets)
        .await
        .context("Failed to authenticate with Gmail")?;
    let service: Arc<dyn MailService> = Arc::new(GmailClient::new(token));

    let summary = Labeler::new(service, config.run_config(dry_run))
        .run()
        .await?;

    info!(
        threads_reviewed_pass_a = summary.threads_reviewed_pass_a(),
        threads_moved_to_archive = summary.reply_to_archive.threads_matched,
        threads_reviewed_pass_b = summary.threads_reviewed_pass_b(),
        threads_moved_to_reply = summary.archive_to_reply.threads_matched,
        dry_run,
        "Labeling finished"
    );

    Ok(())
}
