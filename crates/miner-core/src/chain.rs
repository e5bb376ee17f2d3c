use serde::Serialize;
use tracing::debug;

use crate::{Block, Error, Result};

/// Append-only sequence of mined blocks. Every block after the first carries
/// the hash of its predecessor's rendered state.
#[derive(Clone, Debug, Default)]
pub struct BlockChain {
    blocks: Vec<Block>,
}

impl BlockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mined block. The first block may carry any previous hash;
    /// later ones must link to the current tip.
    pub fn push(&mut self, block: Block) -> Result<()> {
        if !block.is_mined() {
            return Err(Error::BlockNotMined);
        }
        if let Some(tip) = self.blocks.last() {
            let expected = tip.hash()?;
            if block.previous_hash() != expected {
                return Err(Error::InvalidChainLink {
                    expected,
                    found: block.previous_hash().to_owned(),
                });
            }
        }
        debug!(
            height = self.blocks.len(),
            nonce = block.nonce(),
            transactions = block.len(),
            "block appended"
        );
        self.blocks.push(block);
        Ok(())
    }

    pub fn last(&self) -> Result<&Block> {
        self.blocks.last().ok_or(Error::EmptyChain)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Previous hash the next block has to carry.
    pub fn next_previous_hash(&self) -> Result<String> {
        self.last()?.hash()
    }

    /// Re-check every proof of work and every link.
    pub fn verify(&self) -> Result<()> {
        for (i, block) in self.blocks.iter().enumerate() {
            if !block.is_mined() || !block.meets_target()? {
                return Err(Error::BlockNotMined);
            }
            if i > 0 {
                let expected = self.blocks[i - 1].hash()?;
                if block.previous_hash() != expected {
                    return Err(Error::InvalidChainLink {
                        expected,
                        found: block.previous_hash().to_owned(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn summaries(&self) -> Result<Vec<BlockSummary>> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| BlockSummary::from_block(index, block))
            .collect()
    }
}

impl<'a> IntoIterator for &'a BlockChain {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// What gets announced once a block is sealed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub index: usize,
    pub previous_hash: String,
    pub aggregate_hash: String,
    pub nonce: u64,
    pub transactions: usize,
    pub target: String,
    pub hash: String,
}

impl BlockSummary {
    pub fn from_block(index: usize, block: &Block) -> Result<Self> {
        Ok(Self {
            index,
            previous_hash: block.previous_hash().to_owned(),
            aggregate_hash: block
                .aggregate_hash()
                .ok_or(Error::UnpreparedBlock)?
                .to_owned(),
            nonce: block.nonce(),
            transactions: block.len(),
            target: block.target().to_string(),
            hash: block.hash()?,
        })
    }
}
