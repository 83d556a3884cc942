use clap::Parser;
use propman::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so PROPMAN_* overrides apply
    let _ = dotenvy::dotenv();

    let verbose = matches!(std::env::var("CLI_VERBOSE").as_deref(), Ok("true") | Ok("1"));
    let default_level = if verbose {
        "propman=debug"
    } else if propman::is_production!() {
        "propman=error"
    } else {
        "propman=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(environment = ?propman::config::config().environment, "starting");

    let cli = Cli::parse();

    if let Err(e) = propman::cli::run(cli).await {
        if verbose {
            eprintln!("Error: {e:?}");
        } else {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }

    Ok(())
}
