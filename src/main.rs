mod calls;
mod cli;
mod client;
mod daemon;
mod ipc;
mod platform;
mod proximity;

use clap::Parser;
use cli::{Cli, Command};
use platform::PlatformConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Daemon {
            proximity_node,
            tap_to_wake_node,
            quirk_property,
            control_property,
            recalibration_service,
            lock_tag,
        } => {
            let config = PlatformConfig {
                proximity_node,
                tap_to_wake_node,
                quirk_property,
                control_property,
                recalibration_service,
                lock_tag,
            };
            if let Err(e) = daemon::run(cli.socket, config).await {
                tracing::error!(error = %e, "daemon failed");
                eprintln!("proxd daemon: {e}");
                std::process::exit(1);
            }
        }
        Command::Client { action } => {
            if let Err(e) = client::run(cli.socket, action).await {
                tracing::error!(error = %e, "client failed");
                eprintln!("proxd client: {e}");
                std::process::exit(1);
            }
        }
    }
}
