//! costpulse - Daily AWS cost summary and 3-month stacked chart

use clap::Parser;
use costpulse::{
    cli::Cli, config::ConfigSources, error::Result, report, timezone::TimezoneConfig,
};
use costpulse_aws::{SecretsManagerStore, load_sdk_config};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The --quiet flag overrides RUST_LOG
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("costpulse=info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = execute(&cli).await {
        error!("Report failed: {}", e);
        if e.is_fetch() {
            error!("Check the AWS credentials and the Cost Explorer permissions of this role");
        }
        return Err(e);
    }
    Ok(())
}

async fn execute(cli: &Cli) -> Result<()> {
    let tz_config = TimezoneConfig::from_cli(cli.timezone.as_deref(), cli.utc)?;
    let today = match cli.today_override()? {
        Some(date) => date,
        None => tz_config.today(),
    };
    info!("Using timezone: {}, today is {}", tz_config.name(), today);

    let sources = ConfigSources::load(cli.config.clone(), cli.config_layer())?;
    let secrets = SecretsManagerStore::new(&load_sdk_config(sources.region().as_deref()).await);
    let config = sources.resolve(&secrets).await?;
    if config.dry_run {
        info!("Dry run: report goes to stdout and {}", config.output_dir.display());
    }

    report::run(&config, today).await
}
