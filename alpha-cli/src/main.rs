//! alphasign
//!
//! Command line tool for Alpha LED sign protocol captures.

mod cli;
mod commands;
mod report;
mod settings;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};
use settings::Settings;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };

    // Logs go to stderr so stdout stays usable for reports and frames
    let filter = cli.log_level.clone().unwrap_or_else(|| settings.log_filter.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let scope = cli.scope.map_or(settings.checksum_scope, Into::into);
    tracing::debug!(?scope, "starting alphasign");

    match &cli.command {
        Commands::Inspect(args) => commands::inspect(args, cli.format, scope),
        Commands::Strip(args) => commands::strip(args, &settings, scope),
        Commands::Compose(args) => commands::compose(args, &settings, scope),
        Commands::Checksum(args) => commands::checksum(args, cli.format, scope),
    }
}
