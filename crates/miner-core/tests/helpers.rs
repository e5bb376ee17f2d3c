use miner_core::{
    pow::{mine, MiningBudget, MiningStatus},
    Block, Target, TransactionGenerator,
};

pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

pub fn target_with_prefix(prefix: &str) -> Target {
    let hex = format!("{prefix}{}", "f".repeat(64 - prefix.len()));
    Target::from_hex(&hex).expect("valid target")
}

pub fn filled_block(
    previous_hash: &str,
    target: Target,
    capacity: usize,
    generator: &mut TransactionGenerator,
) -> Block {
    let mut block = Block::with_capacity(previous_hash, target, capacity);
    block.fill_from(generator.by_ref()).expect("fill block");
    block
}

pub fn mined_block(
    previous_hash: &str,
    target: Target,
    capacity: usize,
    generator: &mut TransactionGenerator,
) -> Block {
    let mut block = filled_block(previous_hash, target, capacity, generator);
    let report = mine(&mut block, &MiningBudget::unbounded()).expect("mine block");
    assert_eq!(report.status, MiningStatus::Mined);
    block
}
