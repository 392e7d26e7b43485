//! Notifier entry point

use clap::Parser;
use core_config::tracing::install_color_eyre;
use eyre::Result;
use zerg_notifier::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    zerg_notifier::run(Cli::parse()).await
}
