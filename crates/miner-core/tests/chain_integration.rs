mod helpers;

use helpers::{filled_block, mined_block, target_with_prefix, ZERO_HASH};
use miner_core::{
    digest_hex,
    mine::mine_parallel,
    pow::{mine, MiningBudget, MiningStatus},
    Block, BlockChain, Error, MiningStep, Target, TransactionGenerator,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::atomic::AtomicBool;

#[test]
fn test_three_block_session() -> anyhow::Result<()> {
    let mut generator = TransactionGenerator::new();
    let mut chain = BlockChain::new();
    let easy = target_with_prefix("00");
    let hard = target_with_prefix("000");

    let mut previous = ZERO_HASH.to_string();
    for target in [easy, easy, hard] {
        let block = mined_block(&previous, target, 20, &mut generator);
        chain.push(block)?;
        previous = chain.next_previous_hash()?;
    }

    assert_eq!(chain.len(), 3);
    assert_eq!(generator.seed(), 60);
    chain.verify()?;
    for pair in chain.blocks().windows(2) {
        assert_eq!(pair[1].previous_hash(), digest_hex(pair[0].rendered_state()?));
    }
    Ok(())
}

#[test]
fn test_last_links_to_previous_rendered_state() -> anyhow::Result<()> {
    let mut generator = TransactionGenerator::new();
    let mut chain = BlockChain::new();
    let b1 = mined_block(ZERO_HASH, Target::MAX, 4, &mut generator);
    let link = digest_hex(b1.rendered_state()?);
    chain.push(b1)?;
    chain.push(mined_block(&link, Target::MAX, 4, &mut generator))?;
    assert_eq!(chain.last()?.previous_hash(), link);
    Ok(())
}

#[test]
fn test_capacity_holds_for_random_insert_counts() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut generator = TransactionGenerator::new();
    for _ in 0..20 {
        let capacity = rng.gen_range(1..50);
        let attempts = rng.gen_range(0..100);
        let mut block = Block::with_capacity(ZERO_HASH, Target::MAX, capacity);
        let mut rejected = 0;
        for tx in generator.by_ref().take(attempts) {
            match block.add_transaction(tx) {
                Ok(()) => {}
                Err(Error::CapacityExceeded { capacity: c }) => {
                    assert_eq!(c, capacity);
                    rejected += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
        assert_eq!(block.len(), attempts.min(capacity));
        assert_eq!(rejected, attempts.saturating_sub(capacity));
    }
    Ok(())
}

#[test]
fn test_aggregate_hash_is_reproducible() {
    let mut a = filled_block(ZERO_HASH, Target::MAX, 25, &mut TransactionGenerator::new());
    let b = filled_block(ZERO_HASH, Target::MAX, 25, &mut TransactionGenerator::new());
    assert_eq!(a.aggregate_hash(), b.aggregate_hash());
    assert_eq!(a.rendered_state(), b.rendered_state());
    assert_eq!(a.mining_step(), Ok(MiningStep::Success));
}

#[test]
fn test_mismatched_chain_is_rejected() {
    let mut generator = TransactionGenerator::new();
    let mut chain = BlockChain::new();
    chain
        .push(mined_block(ZERO_HASH, Target::MAX, 2, &mut generator))
        .unwrap();
    let orphan = mined_block(ZERO_HASH, Target::MAX, 2, &mut generator);
    assert!(matches!(
        chain.push(orphan),
        Err(Error::InvalidChainLink { .. })
    ));
    assert_eq!(chain.len(), 1);
}

#[test]
fn test_sequential_and_parallel_agree_on_validity() -> anyhow::Result<()> {
    let target = target_with_prefix("00");
    let mut sequential = filled_block(ZERO_HASH, target, 8, &mut TransactionGenerator::new());
    let mut parallel = sequential.clone();

    let report = mine(&mut sequential, &MiningBudget::unbounded())?;
    assert_eq!(report.status, MiningStatus::Mined);

    let stop = AtomicBool::new(false);
    let report = mine_parallel(&mut parallel, &stop)?;
    assert_eq!(report.status, MiningStatus::Mined);

    assert!(sequential.meets_target()?);
    assert!(parallel.meets_target()?);
    // The sequential scan finds the smallest qualifying nonce.
    assert!(sequential.nonce() <= parallel.nonce());
    Ok(())
}

#[test]
fn test_interrupted_search_resumes() -> anyhow::Result<()> {
    let target = target_with_prefix("00");
    let mut uninterrupted = filled_block(ZERO_HASH, target, 8, &mut TransactionGenerator::new());
    let mut resumed = uninterrupted.clone();

    mine(&mut uninterrupted, &MiningBudget::unbounded())?;

    let budget = MiningBudget::steps(7);
    while mine(&mut resumed, &budget)?.status != MiningStatus::Mined {}
    assert_eq!(resumed.nonce(), uninterrupted.nonce());
    assert_eq!(resumed.hash()?, uninterrupted.hash()?);
    Ok(())
}
