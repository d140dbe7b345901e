//! Command line front end for mailrelay.
//!
//! - `simulate` pushes numbered test emails through no-op vendors wrapped in
//!   the behaviors given on the command line and reports how many failed.
//! - `consume` reads newline-delimited JSON messages from stdin, queues them
//!   and delivers them through a configured failover.
//!
//! ```text
//! mailrelay simulate --email-count 30 --vendor-count 3 \
//!     --with-state-failover \
//!     --vendors vendor1 vendor2 vendor3 \
//!     --middlewares cb,rl rl,cb retry,rl \
//!     --circuit-breakers 5,10 3,20 0 \
//!     --rate-limiters 10,5 5,10 3,5 \
//!     --retries 0 0 2
//! ```

use clap::{Parser, Subcommand};

mod consume;
mod simulate;

/// Resilient email delivery simulator and consumer
#[derive(Parser, Debug)]
#[command(name = "mailrelay")]
#[command(about = "Send email through resilient, failing-over backends", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate sending emails through no-op vendors
    Simulate(simulate::SimulateArgs),
    /// Deliver JSON messages read from stdin through the in-memory queue
    Consume(consume::ConsumeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => {
            // the failover blocks while retries back off
            tokio::task::spawn_blocking(move || simulate::run(&args)).await??;
        }
        Commands::Consume(args) => consume::run(&args).await?,
    }

    Ok(())
}
