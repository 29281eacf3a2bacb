use crate::canonical::hash_block;
use crate::error::{ChainError, Result};
use crate::miner::ProofOfWork;
use tracing::warn;

use super::chain::Block;

/// Checks that `current` links to `previous` by hash and carries a proof valid
/// against `previous.proof`.
pub fn validate_link(previous: &Block, current: &Block, pow: &ProofOfWork) -> Result<()> {
    if current.previous_hash != hash_block(previous)? {
        return Err(ChainError::InvalidBlockLinkage {
            index: current.index,
        });
    }
    if !pow.is_valid(previous.proof, current.proof) {
        return Err(ChainError::InvalidProofOfWork {
            index: current.index,
        });
    }
    Ok(())
}

/// Walks every consecutive pair, stopping at the first failure. Each block is
/// re-hashed on every call.
pub fn validate_chain(blocks: &[Block], pow: &ProofOfWork) -> Result<()> {
    for pair in blocks.windows(2) {
        if let Err(e) = validate_link(&pair[0], &pair[1], pow) {
            warn!(index = pair[1].index, error = %e, "chain validation failed");
            return Err(e);
        }
    }
    Ok(())
}

pub fn is_chain_valid(blocks: &[Block], pow: &ProofOfWork) -> bool {
    validate_chain(blocks, pow).is_ok()
}
