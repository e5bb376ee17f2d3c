use sha2::{Digest, Sha256};

pub mod block;
pub mod chain;
pub mod constants;
pub mod error;
pub mod mine;
pub mod target;
pub mod transaction;

pub use block::{Block, BlockState, MiningStep, ReadyPolicy};
pub use chain::{BlockChain, BlockSummary};
pub use error::{Error, Result};
pub use target::Target;
pub use transaction::{Transaction, TransactionGenerator};

pub type Hash = [u8; 32];

/// SHA-256 over arbitrary bytes.
pub fn digest(data: impl AsRef<[u8]>) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// SHA-256 rendered as 64 lowercase hex characters.
pub fn digest_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(digest(data))
}

pub mod pow {
    use super::{Block, MiningStep, Result};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;
    use tracing::{debug, warn};

    /// Limits on a single call to [`mine`]. The default runs until success.
    #[derive(Clone, Debug, Default)]
    pub struct MiningBudget {
        pub max_steps: Option<u64>,
        pub deadline: Option<Instant>,
        pub stop: Option<Arc<AtomicBool>>,
    }

    impl MiningBudget {
        pub fn unbounded() -> Self {
            Self::default()
        }

        pub fn steps(max_steps: u64) -> Self {
            Self {
                max_steps: Some(max_steps),
                ..Self::default()
            }
        }

        pub fn with_deadline(mut self, deadline: Instant) -> Self {
            self.deadline = Some(deadline);
            self
        }

        pub fn with_stop(mut self, stop: Arc<AtomicBool>) -> Self {
            self.stop = Some(stop);
            self
        }

        fn stop_requested(&self) -> bool {
            self.stop
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
        }

        fn past_deadline(&self) -> bool {
            self.deadline.is_some_and(|d| Instant::now() >= d)
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum MiningStatus {
        Mined,
        /// Step budget or deadline ran out; calling [`mine`] again resumes.
        Exhausted,
        Cancelled,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MiningReport {
        pub status: MiningStatus,
        /// Nonce attempts made during this call.
        pub steps: u64,
        pub nonce: u64,
    }

    /// Drive [`Block::mining_step`] until the block is mined or the budget
    /// says stop. The block keeps its nonce, so a later call picks up where
    /// this one left off.
    pub fn mine(block: &mut Block, budget: &MiningBudget) -> Result<MiningReport> {
        block.ensure_minable()?;
        debug!(
            target_hex = %block.target(),
            expected_steps = block.target().expected_steps(),
            start_nonce = block.nonce(),
            "starting nonce search"
        );

        let mut steps = 0u64;
        loop {
            if budget.stop_requested() {
                warn!(nonce = block.nonce(), steps, "nonce search cancelled");
                return Ok(report(block, MiningStatus::Cancelled, steps));
            }
            if budget.max_steps.is_some_and(|max| steps >= max) || budget.past_deadline() {
                debug!(nonce = block.nonce(), steps, "mining budget exhausted");
                return Ok(report(block, MiningStatus::Exhausted, steps));
            }
            steps += 1;
            if block.mining_step()? == MiningStep::Success {
                return Ok(report(block, MiningStatus::Mined, steps));
            }
        }
    }

    fn report(block: &Block, status: MiningStatus, steps: u64) -> MiningReport {
        MiningReport {
            status,
            steps,
            nonce: block.nonce(),
        }
    }
}
