use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("block is full ({capacity} transactions)")]
    CapacityExceeded { capacity: usize },

    #[error("block has no transactions yet, nothing to hash")]
    UnpreparedBlock,

    #[error("block is not ready to mine ({len}/{capacity} transactions)")]
    BlockNotReady { len: usize, capacity: usize },

    #[error("nonce space exhausted without meeting the target")]
    NonceSpaceExhausted,

    #[error("block is already mined")]
    BlockSealed,

    #[error("block must be mined before it can join the chain")]
    BlockNotMined,

    #[error("chain is empty")]
    EmptyChain,

    #[error("previous hash mismatch: expected {expected}, found {found}")]
    InvalidChainLink { expected: String, found: String },

    #[error("invalid target: {0}")]
    InvalidTarget(String),
}
