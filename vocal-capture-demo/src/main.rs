mod commands;
mod observer;

use clap::{Parser, Subcommand};

/// Drive the vocal capture engine against a simulated microphone
#[derive(Parser)]
#[command(name = "vocal-capture")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record from the simulated microphone and print the result
    Record(commands::RecordArgs),

    /// Print the capture capability report
    Diagnose(commands::DiagnoseArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Commands::Record(args) => commands::record(args).await,
        Commands::Diagnose(args) => commands::diagnose(args).await,
    }
}
