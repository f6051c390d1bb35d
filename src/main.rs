use clap::Parser;

use loyalty_rs::cli::{self, Cli, executor::CommandOutcome};
use loyalty_rs::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = cli::load_and_merge_config(&cli)?;
    cli::init_logger_from_settings(&settings)?;

    tracing::info!(version = loyalty_rs::pkg_version(), "Starting loyalty-rs");

    match cli::execute_command(&cli, settings.clone()).await? {
        CommandOutcome::StartServer => Server::new(settings).run().await?,
        CommandOutcome::Done => {}
    }

    Ok(())
}
