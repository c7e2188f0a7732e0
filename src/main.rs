//! sagroute CLI entry point.
//!
//! Builds the advisor core and waits; the RPC transport that feeds it
//! snapshots and queries is attached by the deployment, not this binary.

use clap::Parser;
use sagroute::{AdvisorService, Config, Result};

#[derive(Parser, Debug)]
#[command(name = "sagroute")]
#[command(about = "Routing and stability advisor for heterogeneous mesh networks")]
struct Args {
    /// Log filter, e.g. "info" or "sagroute=debug"
    #[arg(short, long, default_value = "info")]
    verbosity: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    use tracing_subscriber::{fmt, EnvFilter};
    fmt()
        .with_env_filter(EnvFilter::new(&args.verbosity))
        .init();

    let config = Config::from_env()?;
    let service = AdvisorService::new(config);

    tracing::info!(
        listen = %service.config().listen_addr,
        history_window = service.config().history_window,
        ema_smoothing = service.config().ema_smoothing,
        "advisor core ready"
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|err| sagroute::Error::Internal(format!("signal handler: {err}")))?;
    tracing::info!("shutting down");
    Ok(())
}
