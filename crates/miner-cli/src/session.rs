use anyhow::{bail, ensure, Context, Result};
use miner_core::{
    mine::mine_parallel,
    pow::{mine, MiningBudget, MiningReport, MiningStatus},
    Block, BlockChain, Error, ReadyPolicy, Target, TransactionGenerator,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_GENESIS: &str = "0e0fb2e3ae9bd2a0fa8b6999bfe6ab7df197a494d4a02885783a697ac74940d9";

/// One block of the scripted session: how many transactions are pending
/// and the target it has to beat.
#[derive(Clone, Copy, Debug)]
pub struct Stage {
    pub pending: usize,
    pub target: &'static str,
}

/// Two blocks at the same difficulty, then one extra leading zero.
pub const DEMO_STAGES: [Stage; 3] = [
    Stage {
        pending: 1500,
        target: "000ddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd",
    },
    Stage {
        pending: 1232,
        target: "000ddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd",
    },
    Stage {
        pending: 1876,
        target: "0000dddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd",
    },
];

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub capacity: usize,
    pub delay: Duration,
    pub genesis: String,
    pub max_steps: Option<u64>,
    pub parallel: bool,
    pub ready_policy: ReadyPolicy,
    /// Print the per-block announcements on stdout.
    pub announce: bool,
}

pub async fn run(
    config: &SessionConfig,
    stages: &[Stage],
    stop: Arc<AtomicBool>,
) -> Result<BlockChain> {
    let mut chain = BlockChain::new();
    let mut generator = TransactionGenerator::new();

    for (index, stage) in stages.iter().enumerate() {
        let previous_hash = if chain.is_empty() {
            config.genesis.clone()
        } else {
            chain.next_previous_hash()?
        };
        let target = Target::from_hex(stage.target)
            .with_context(|| format!("stage {index} target"))?;

        let mut block = Block::with_capacity(previous_hash, target, config.capacity)
            .with_ready_policy(config.ready_policy);
        let mut waiting = 0usize;
        for tx in generator.by_ref().take(stage.pending) {
            match block.add_transaction(tx) {
                Ok(()) => {}
                Err(Error::CapacityExceeded { .. }) => waiting += 1,
                Err(e) => return Err(e.into()),
            }
        }
        info!(
            block = index,
            included = block.len(),
            waiting,
            "block filled"
        );
        ensure!(
            block.is_ready_to_mine(),
            "block #{index} is not ready to mine ({} of {} transactions)",
            block.len(),
            block.capacity()
        );

        let (block, report) = mine_on_worker(block, config, stop.clone()).await?;
        match report.status {
            MiningStatus::Mined => {}
            MiningStatus::Cancelled => bail!("mining cancelled at block #{index}"),
            MiningStatus::Exhausted => bail!(
                "step budget exhausted at block #{index} after {} steps",
                report.steps
            ),
        }

        chain.push(block)?;
        if config.announce {
            announce(&chain)?;
        }
        if index + 1 < stages.len() && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
    }

    Ok(chain)
}

/// The nonce search is CPU bound, keep it off the async workers.
async fn mine_on_worker(
    mut block: Block,
    config: &SessionConfig,
    stop: Arc<AtomicBool>,
) -> Result<(Block, MiningReport)> {
    let parallel = config.parallel;
    let mut budget = MiningBudget::unbounded().with_stop(stop.clone());
    budget.max_steps = config.max_steps;

    let (block, report) = tokio::task::spawn_blocking(move || {
        let report = if parallel {
            mine_parallel(&mut block, &stop)
        } else {
            mine(&mut block, &budget)
        };
        report.map(|r| (block, r))
    })
    .await
    .context("mining task panicked")??;
    Ok((block, report))
}

fn announce(chain: &BlockChain) -> Result<()> {
    let tip = chain.last()?;
    println!("{}", "-".repeat(80));
    println!("TO ALL THE NODES OF THE NETWORK, THIS BLOCK HAS BEEN ADDED:");
    println!("[block #{}] : {}", chain.len(), tip.rendered_state()?);
    println!("{}", "-".repeat(80));
    Ok(())
}

pub fn print_summary(chain: &BlockChain) {
    println!();
    println!("SUMMARY");
    println!();
    for (i, block) in chain.iter().enumerate() {
        println!(
            "Block #{i} was added. It took {} steps to find it.",
            block.nonce()
        );
    }
    let blocks = chain.blocks();
    if let [.., before, last] = blocks {
        if last.target() < before.target() {
            println!("Difficulty was increased for the last block!");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(capacity: usize) -> SessionConfig {
        SessionConfig {
            capacity,
            delay: Duration::ZERO,
            genesis: DEFAULT_GENESIS.to_string(),
            max_steps: None,
            parallel: false,
            ready_policy: ReadyPolicy::WhenFull,
            announce: false,
        }
    }

    const EASY: [Stage; 2] = [
        Stage {
            pending: 6,
            target: "0fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
        },
        Stage {
            pending: 3,
            target: "00ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
        },
    ];

    #[tokio::test]
    async fn session_builds_a_linked_chain() {
        let stop = Arc::new(AtomicBool::new(false));
        let chain = run(&config(3), &EASY, stop).await.unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.blocks()[0].previous_hash(), DEFAULT_GENESIS);
        assert_eq!(chain.blocks()[0].len(), 3);
        chain.verify().unwrap();
    }

    #[tokio::test]
    async fn under_filled_block_stops_the_session() {
        let stop = Arc::new(AtomicBool::new(false));
        let err = run(&config(10), &EASY, stop).await.unwrap_err();
        assert!(err.to_string().contains("not ready to mine"), "{err}");
    }

    #[tokio::test]
    async fn any_transactions_policy_mines_partial_blocks() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut cfg = config(10);
        cfg.ready_policy = ReadyPolicy::AnyTransactions;
        let chain = run(&cfg, &EASY, stop).await.unwrap();
        assert_eq!(chain.blocks()[0].len(), 6);
        assert_eq!(chain.blocks()[1].len(), 3);
    }

    #[tokio::test]
    async fn raised_stop_flag_aborts() {
        let stop = Arc::new(AtomicBool::new(true));
        let err = run(&config(3), &EASY, stop).await.unwrap_err();
        assert!(err.to_string().contains("cancelled"), "{err}");
    }

    #[tokio::test]
    async fn parallel_session_verifies() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut cfg = config(3);
        cfg.parallel = true;
        let chain = run(&cfg, &EASY, stop).await.unwrap();
        chain.verify().unwrap();
    }
}
