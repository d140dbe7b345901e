use anyhow::Context;
use clap::Args;
use mailrelay::{
    parse_behaviors, BackendConfig, BehaviorKind, CircuitBreakerSettings, ConfigError, Failover,
    FailoverKind, Message, RateLimiterSettings, RelayConfig, RetrySettings, DEFAULT_MAX_SWEEPS,
};

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Keep sending through the vendor that last succeeded (sticky failover)
    #[arg(long)]
    pub with_state_failover: bool,

    /// Number of emails to send, e.g. 100
    #[arg(long)]
    pub email_count: usize,

    /// Number of vendors, e.g. 3
    #[arg(long)]
    pub vendor_count: usize,

    /// Vendor names, e.g. sns sendgrid mailgun
    #[arg(long, num_args = 1.., required = true)]
    pub vendors: Vec<String>,

    /// Behaviors per vendor, outermost first, e.g. retry,cb cb,rl
    #[arg(long, num_args = 1.., required = true)]
    pub middlewares: Vec<String>,

    /// Circuit breaker per vendor as threshold,reset_timeout, e.g. 2,10 3,20
    #[arg(long, num_args = 1..)]
    pub circuit_breakers: Vec<String>,

    /// Rate limiter per vendor as max_attempts,per_seconds, e.g. 10,5
    #[arg(long, num_args = 1..)]
    pub rate_limiters: Vec<String>,

    /// Retry count per vendor, e.g. 3
    #[arg(long, num_args = 1..)]
    pub retries: Vec<String>,

    /// Full sweeps the sticky failover may complete before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_SWEEPS)]
    pub max_sweeps: usize,
}

/// Turns the per-vendor arguments into a relay configuration.
///
/// Settings are only parsed for behaviors a vendor actually lists, so
/// placeholders such as `0` are fine for the others.
pub fn relay_config(args: &SimulateArgs) -> Result<RelayConfig, ConfigError> {
    for (field, actual) in [
        ("vendors", args.vendors.len()),
        ("middlewares", args.middlewares.len()),
    ] {
        if actual != args.vendor_count {
            return Err(ConfigError::CountMismatch {
                field,
                expected: args.vendor_count,
                actual,
            });
        }
    }

    let backends = args
        .vendors
        .iter()
        .zip(&args.middlewares)
        .enumerate()
        .map(|(i, (name, middlewares))| vendor_config(args, i, name, middlewares))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RelayConfig {
        failover: if args.with_state_failover {
            FailoverKind::Sticky
        } else {
            FailoverKind::Stateless
        },
        max_sweeps: args.max_sweeps,
        backends,
    })
}

fn vendor_config(
    args: &SimulateArgs,
    index: usize,
    name: &str,
    middlewares: &str,
) -> Result<BackendConfig, ConfigError> {
    let behaviors = parse_behaviors(middlewares)?;
    let mut config = BackendConfig::new(name).with_behaviors(behaviors.iter().copied());

    for behavior in behaviors {
        match behavior {
            BehaviorKind::CircuitBreaker if config.circuit_breaker.is_none() => {
                let settings: CircuitBreakerSettings =
                    setting(&args.circuit_breakers, index, name, behavior)?.parse()?;
                config = config.with_circuit_breaker(settings);
            }
            BehaviorKind::RateLimiter if config.rate_limiter.is_none() => {
                let settings: RateLimiterSettings =
                    setting(&args.rate_limiters, index, name, behavior)?.parse()?;
                config = config.with_rate_limiter(settings);
            }
            BehaviorKind::Retry if config.retry.is_none() => {
                let settings: RetrySettings =
                    setting(&args.retries, index, name, behavior)?.parse()?;
                config = config.with_retry(settings);
            }
            _ => {}
        }
    }

    Ok(config)
}

fn setting<'a>(
    list: &'a [String],
    index: usize,
    name: &str,
    behavior: BehaviorKind,
) -> Result<&'a String, ConfigError> {
    list.get(index).ok_or_else(|| ConfigError::MissingSettings {
        backend: name.to_string(),
        behavior,
    })
}

/// Numbered test messages.
pub fn generate_messages(count: usize) -> impl Iterator<Item = Message> {
    (0..count).map(|i| {
        Message::new(
            format!("Test Email {i}"),
            format!("This is a test email {i}"),
            ["email"],
            "from",
        )
    })
}

pub fn run(args: &SimulateArgs) -> anyhow::Result<()> {
    let config = relay_config(args).context("invalid simulation arguments")?;
    let mut failover = config.build_failover()?;

    let mut failed = 0;
    for message in generate_messages(args.email_count) {
        match failover.send(&message) {
            Ok(true) => {}
            Ok(false) => failed += 1,
            Err(err) => {
                tracing::error!(subject = %message.subject(), error = %err, "failover gave up");
                failed += 1;
            }
        }
    }

    tracing::info!(emails = args.email_count, "emails sent");
    tracing::info!(errors = failed, "emails failed");
    Ok(())
}
