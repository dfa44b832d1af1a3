use clap::Parser;
use dotenvy::dotenv;
use itkoo_settlement::{
    cli::{self, Cli},
    config::settings,
};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Parse the command line (exits with usage on bad input)
    let args = Cli::parse();

    // 4. Load settlement settings and run the command
    let result = run(args).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("❌ {e}");
            if e.is_retriable() {
                eprintln!("This failure is temporary, please run the command again.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> itkoo_settlement::errors::Result<()> {
    let loaded = settings::load_default_settings()
        .inspect(|_| info!("Settlement settings loaded"))
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    cli::run(args, loaded).await
}
