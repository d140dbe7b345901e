use anyhow::Context;
use clap::Args;
use mailrelay::queue::{self, QUEUE_NAME};
use mailrelay::RelayConfig;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args, Debug, Clone)]
pub struct ConsumeArgs {
    /// JSON relay configuration; defaults to a single retried, rate-limited
    /// and circuit-broken backend
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Messages the queue holds before reading stdin pauses
    #[arg(long, default_value_t = 64)]
    pub capacity: usize,
}

pub async fn run(args: &ConsumeArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => RelayConfig::from_file(path)?,
        None => RelayConfig::default(),
    };
    let failover = config.build_failover()?;

    let (producer, consumer) = queue::channel(args.capacity);
    let worker = tokio::spawn(consumer.run(failover));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        producer.publish_raw(line.to_string()).await?;
    }
    drop(producer);

    let report = worker.await.context("consumer task failed")?;
    tracing::info!(
        queue = QUEUE_NAME,
        received = report.received,
        delivered = report.delivered,
        undelivered = report.undelivered,
        unacked = report.unacked.len(),
        "consumer finished"
    );
    for unacked in &report.unacked {
        tracing::warn!(tag = unacked.tag, reason = %unacked.reason, "message left unacknowledged");
    }
    Ok(())
}
