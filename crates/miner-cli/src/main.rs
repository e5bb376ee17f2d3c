mod session;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use miner_core::ReadyPolicy;
use session::{SessionConfig, DEFAULT_GENESIS, DEMO_STAGES};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "miner-cli")]
#[command(about = "Mine a short chain of proof-of-work blocks")]
struct Args {
    /// Maximum transactions per block
    #[arg(long, default_value_t = miner_core::constants::DEFAULT_BLOCK_CAPACITY)]
    capacity: usize,

    /// Pause between blocks, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Previous hash carried by the first block
    #[arg(long, default_value = DEFAULT_GENESIS)]
    genesis: String,

    /// Give up on a block after this many nonce attempts
    #[arg(long, conflicts_with = "parallel")]
    max_steps: Option<u64>,

    /// Search nonces on all cores
    #[arg(long)]
    parallel: bool,

    /// When a block may be mined
    #[arg(long, value_enum, default_value_t = PolicyArg::WhenFull)]
    ready_policy: PolicyArg,

    /// Print the resulting chain as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    WhenFull,
    AnyTransactions,
}

impl From<PolicyArg> for ReadyPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::WhenFull => ReadyPolicy::WhenFull,
            PolicyArg::AnyTransactions => ReadyPolicy::AnyTransactions,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = SessionConfig {
        capacity: args.capacity,
        delay: Duration::from_millis(args.delay_ms),
        genesis: args.genesis,
        max_steps: args.max_steps,
        parallel: args.parallel,
        ready_policy: args.ready_policy.into(),
        announce: !args.json,
    };

    let stop = Arc::new(AtomicBool::new(false));
    tokio::spawn({
        let stop = stop.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, abandoning the current search");
                stop.store(true, Ordering::Relaxed);
            }
        }
    });

    info!(capacity = config.capacity, parallel = config.parallel, "mining session starting");
    let chain = session::run(&config, &DEMO_STAGES, stop).await?;

    if args.json {
        let summaries = chain.summaries()?;
        println!(
            "{}",
            serde_json::to_string_pretty(&summaries).context("serialize chain")?
        );
    } else {
        session::print_summary(&chain);
    }
    Ok(())
}
