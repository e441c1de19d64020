use anyhow::Context;
use clap::Parser;
use reconlab::cli::{Cli, Commands};
use reconlab::config::AppSettings;
use reconlab::logging::{self, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = AppSettings::load(cli.config.as_deref()).context("could not load settings")?;

    logging::init(LogConfig::from_flags(
        cli.verbose,
        cli.quiet,
        &settings.log_level,
    ));

    match &cli.command {
        Commands::Scan(cmd) => cmd
            .execute(&settings, cli.quiet)
            .await
            .context("scan failed")?,
        Commands::Discover(cmd) => cmd
            .execute(&settings, cli.quiet)
            .await
            .context("discovery failed")?,
    }
    Ok(())
}
