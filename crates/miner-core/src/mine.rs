use crate::{
    block::render,
    digest,
    pow::{MiningReport, MiningStatus},
    Block, Error, Result,
};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, warn};

/// Searches nonces in parallel, starting from the block's current nonce, until
/// a rendered-state hash falls below the target or `stop` is raised.
/// Seals the block with whichever qualifying nonce a worker reports first, so
/// the winner is not necessarily the smallest one.
///
/// Unlike [`crate::pow::mine`] the search does not resume: workers cover the
/// range out of order, so a cancelled or exhausted call leaves the block at
/// its starting nonce and a later call scans from there again.
pub fn mine_parallel(block: &mut Block, stop: &AtomicBool) -> Result<MiningReport> {
    block.ensure_minable()?;

    let aggregate = block
        .aggregate_hash()
        .ok_or(Error::UnpreparedBlock)?
        .to_owned();
    let target = *block.target();
    let start = block.nonce();
    let attempts = AtomicU64::new(0);

    // Rayon splits the range across threads; a raised stop flag makes every
    // worker return immediately so `find_any` unwinds.
    let found = (start..u64::MAX).into_par_iter().find_any(|nonce| {
        if stop.load(Ordering::Relaxed) {
            return true;
        }
        attempts.fetch_add(1, Ordering::Relaxed);
        target.is_met_by(&digest(render(&aggregate, *nonce)))
    });
    let steps = attempts.into_inner();

    let status = match found {
        Some(nonce) if block.seal_at(nonce)? => {
            debug!(nonce, steps, "parallel search found a nonce");
            MiningStatus::Mined
        }
        Some(_) => {
            warn!(steps, "parallel nonce search cancelled");
            MiningStatus::Cancelled
        }
        None => MiningStatus::Exhausted,
    };

    Ok(MiningReport {
        status,
        steps,
        nonce: block.nonce(),
    })
}
