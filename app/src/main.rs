#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use clap::{Parser, Subcommand};
use command::{
    CommandStrategy, InfoStrategy, InitStrategy, TelegramInput, TelegramStrategy, VersionStrategy,
};
use parley_config::Config;

mod command;
mod logging;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Telegram relay to a remote completion model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Telegram bot
    Telegram {
        /// Bot token, overriding the config file
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Initialize configuration
    Init,
    /// Show configuration summary
    Info,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Telegram { token } => {
            let config = Config::load()?;
            logging::init(Some(&config.storage.log_file))?;
            TelegramStrategy.execute(TelegramInput { token, config }).await
        }
        Commands::Init => {
            logging::init(None)?;
            InitStrategy.execute(()).await
        }
        Commands::Info => {
            logging::init(None)?;
            InfoStrategy.execute(()).await
        }
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
