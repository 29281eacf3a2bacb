//! Thread-safe handle around a [`Ledger`].
//!
//! Every mutation goes through one lock so that appending a block and
//! clearing the pending buffer are never observed separately.

use crate::blockchain::{Block, Ledger};
use crate::error::Result;
use crate::miner::{CancelToken, Miner};
use crate::record::Record;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn add_record(&self, record: Record) -> Result<u64> {
        self.inner.lock().add_record(record)
    }

    pub fn create_block(&self, proof: u64, previous_hash: impl Into<String>) -> Block {
        self.inner.lock().create_block(proof, previous_hash)
    }

    /// Mines without holding the lock. If another caller extends the chain
    /// while the search runs, the search restarts from the new last block.
    pub fn mine_block_with(&self, miner: &Miner, cancel: &CancelToken) -> Result<Block> {
        loop {
            let (previous_proof, previous_hash, pow) = {
                let ledger = self.inner.lock();
                let (proof, hash) = ledger.last_link()?;
                (proof, hash, *ledger.proof_of_work())
            };

            let proof = miner.mine(&pow, previous_proof, cancel)?;

            let mut ledger = self.inner.lock();
            if ledger.last_link()?.1 == previous_hash {
                return Ok(ledger.create_block(proof, previous_hash));
            }
            debug!("chain advanced during proof search; retrying");
        }
    }

    pub fn is_chain_valid(&self) -> bool {
        self.inner.lock().is_chain_valid()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Copy of the current blocks.
    pub fn snapshot(&self) -> Vec<Block> {
        self.inner.lock().blocks().to_vec()
    }

    /// Runs `f` with shared access while holding the lock.
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&self.inner.lock())
    }
}
