use clap::{Parser, Subcommand};

use matinee::{hub, runner};
use matinee_common::error::MatineeError;

/// The Matinee bot platform
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Hub(hub::HubArgs),
    Runner(runner::RunnerArgs),
}

////////////////////////////////////////////////////////////////////////////////
// PUBLIC FUNCTION
////////////////////////////////////////////////////////////////////////////////

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), MatineeError> {
    let args = Cli::parse();
    match args.command {
        Commands::Hub(hub) => hub::init_hub(hub).await,
        Commands::Runner(runner) => runner::init_runner(runner).await,
    }
}
