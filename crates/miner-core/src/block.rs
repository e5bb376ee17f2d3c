use tracing::{info, trace};

use crate::constants::{DEFAULT_BLOCK_CAPACITY, RENDER_SEPARATOR, TRANSACTION_SEPARATOR};
use crate::{digest, digest_hex, Error, Hash, Result, Target, Transaction};

/// When a block may enter the nonce search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadyPolicy {
    /// Only a completely packed block is mined.
    #[default]
    WhenFull,
    /// Any block holding at least one transaction is mined.
    AnyTransactions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
    Filling,
    Full,
    Mining,
    Mined,
}

/// Result of a single nonce attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MiningStep {
    /// The current nonce produced a hash below the target; it is now frozen.
    Success,
    /// The nonce was bumped; try again.
    Continue,
}

#[derive(Clone, Debug)]
pub struct Block {
    previous_hash: String,
    transactions: Vec<Transaction>,
    aggregate_hash: Option<String>,
    target: Target,
    nonce: u64,
    capacity: usize,
    ready_policy: ReadyPolicy,
    state: BlockState,
}

impl Block {
    pub fn new(previous_hash: impl Into<String>, target: Target) -> Self {
        Self::with_capacity(previous_hash, target, DEFAULT_BLOCK_CAPACITY)
    }

    pub fn with_capacity(previous_hash: impl Into<String>, target: Target, capacity: usize) -> Self {
        let state = if capacity == 0 {
            BlockState::Full
        } else {
            BlockState::Filling
        };
        Self {
            previous_hash: previous_hash.into(),
            transactions: Vec::new(),
            aggregate_hash: None,
            target,
            nonce: 0,
            capacity,
            ready_policy: ReadyPolicy::default(),
            state,
        }
    }

    pub fn with_ready_policy(mut self, policy: ReadyPolicy) -> Self {
        self.ready_policy = policy;
        self
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn aggregate_hash(&self) -> Option<&str> {
        self.aggregate_hash.as_deref()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ready_policy(&self) -> ReadyPolicy {
        self.ready_policy
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn is_mined(&self) -> bool {
        self.state == BlockState::Mined
    }

    /// Append a transaction and refresh the aggregate hash. A full block
    /// leaves its contents untouched and reports `CapacityExceeded`.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        if self.is_mined() {
            return Err(Error::BlockSealed);
        }
        if self.is_full() {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.transactions.push(tx);
        self.aggregate_hash = Some(aggregate_hash(&self.transactions));
        if self.state == BlockState::Filling && self.is_full() {
            self.state = BlockState::Full;
        }
        Ok(())
    }

    /// Pull transactions until the block is full or the source runs dry.
    /// Returns how many were added.
    pub fn fill_from<I>(&mut self, source: I) -> Result<usize>
    where
        I: IntoIterator<Item = Transaction>,
    {
        let mut added = 0;
        let mut source = source.into_iter();
        while !self.is_full() {
            match source.next() {
                Some(tx) => {
                    self.add_transaction(tx)?;
                    added += 1;
                }
                None => break,
            }
        }
        Ok(added)
    }

    pub fn is_full(&self) -> bool {
        self.transactions.len() >= self.capacity
    }

    pub fn is_ready_to_mine(&self) -> bool {
        match self.ready_policy {
            ReadyPolicy::WhenFull => self.is_full(),
            ReadyPolicy::AnyTransactions => !self.is_empty(),
        }
    }

    /// `<aggregate hash>-<nonce>`, the preimage of the block hash.
    pub fn rendered_state(&self) -> Result<String> {
        let aggregate = self.aggregate_hash.as_deref().ok_or(Error::UnpreparedBlock)?;
        Ok(render(aggregate, self.nonce))
    }

    pub fn hash_bytes(&self) -> Result<Hash> {
        Ok(digest(self.rendered_state()?))
    }

    pub fn hash(&self) -> Result<String> {
        Ok(digest_hex(self.rendered_state()?))
    }

    /// Reject blocks that cannot enter (or re-enter) the nonce search.
    pub fn ensure_minable(&self) -> Result<()> {
        if self.is_mined() {
            return Err(Error::BlockSealed);
        }
        if self.aggregate_hash.is_none() {
            return Err(Error::UnpreparedBlock);
        }
        if !self.is_ready_to_mine() {
            return Err(Error::BlockNotReady {
                len: self.len(),
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Try the current nonce once.
    pub fn mining_step(&mut self) -> Result<MiningStep> {
        self.ensure_minable()?;
        self.state = BlockState::Mining;

        let hash = self.hash_bytes()?;
        trace!(
            nonce = self.nonce,
            hash = %hex::encode(hash),
            target_hex = %self.target,
            "mining step"
        );
        if self.target.is_met_by(&hash) {
            self.state = BlockState::Mined;
            info!(
                nonce = self.nonce,
                hash = %hex::encode(hash),
                "block mined"
            );
            return Ok(MiningStep::Success);
        }
        self.nonce = self.nonce.checked_add(1).ok_or(Error::NonceSpaceExhausted)?;
        Ok(MiningStep::Continue)
    }

    /// Check the hash at `nonce` and seal the block if it meets the target.
    /// On a miss the block keeps its previous nonce.
    pub(crate) fn seal_at(&mut self, nonce: u64) -> Result<bool> {
        self.ensure_minable()?;
        let previous = self.nonce;
        self.nonce = nonce;
        let hash = self.hash_bytes()?;
        if !self.target.is_met_by(&hash) {
            self.nonce = previous;
            return Ok(false);
        }
        self.state = BlockState::Mined;
        info!(nonce, hash = %hex::encode(hash), "block mined");
        Ok(true)
    }

    #[cfg(test)]
    pub(crate) fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    /// Whether the frozen nonce really satisfies the target.
    pub fn meets_target(&self) -> Result<bool> {
        Ok(self.target.is_met_by(&self.hash_bytes()?))
    }
}

pub(crate) fn render(aggregate: &str, nonce: u64) -> String {
    format!("{aggregate}{RENDER_SEPARATOR}{nonce}")
}

/// Flat digest over the transaction digests joined with `-`.
pub fn aggregate_hash(transactions: &[Transaction]) -> String {
    let joined = transactions
        .iter()
        .map(Transaction::as_str)
        .collect::<Vec<_>>()
        .join(TRANSACTION_SEPARATOR);
    digest_hex(joined)
}
