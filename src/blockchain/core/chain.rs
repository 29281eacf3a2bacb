use crate::canonical::hash_block;
use crate::config::LedgerConfig;
use crate::error::{ChainError, Result};
use crate::miner::{CancelToken, Miner, ProofOfWork};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::pending::PendingRecords;
use super::validation::{validate_chain, validate_link};

/// Index of the first block in every chain.
pub const GENESIS_INDEX: u64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Unix seconds, microsecond resolution.
    pub timestamp: f64,
    pub data: Vec<Record>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// Builds a block stamped with the current time.
    pub fn new(index: u64, data: Vec<Record>, proof: u64, previous_hash: impl Into<String>) -> Self {
        Block {
            index,
            timestamp: current_timestamp(),
            data,
            proof,
            previous_hash: previous_hash.into(),
        }
    }

    /// Canonical SHA-256 hex digest of this block.
    pub fn hash(&self) -> Result<String> {
        hash_block(self)
    }

    pub fn check_canonical(&self) -> Result<()> {
        if !self.timestamp.is_finite() {
            return Err(ChainError::Serialization(format!(
                "block {} has a non-finite timestamp",
                self.index
            )));
        }
        self.data.iter().try_for_each(Record::check_canonical)
    }

    /// Field-name to value mapping for display or transport.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        self.check_canonical()?;
        Ok(serde_json::to_value(self)?)
    }
}

fn current_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Append-only chain of blocks plus the records waiting for the next one.
#[derive(Debug, Clone)]
pub struct Ledger {
    blocks: Vec<Block>,
    pending: PendingRecords,
    pow: ProofOfWork,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Creates a ledger at the default difficulty with the reference genesis block
    /// (`proof = 100`, `previous_hash = "1"`).
    pub fn new() -> Self {
        let defaults = LedgerConfig::default();
        Self::with_genesis(
            ProofOfWork::default(),
            defaults.genesis_proof,
            defaults.genesis_previous_hash,
        )
    }

    pub fn with_config(config: &LedgerConfig) -> Result<Self> {
        let pow = ProofOfWork::new(config.difficulty)?;
        Ok(Self::with_genesis(
            pow,
            config.genesis_proof,
            config.genesis_previous_hash.clone(),
        ))
    }

    fn with_genesis(pow: ProofOfWork, proof: u64, previous_hash: String) -> Self {
        let mut ledger = Ledger {
            blocks: Vec::new(),
            pending: PendingRecords::new(),
            pow,
        };
        ledger.create_block(proof, previous_hash);
        ledger
    }

    /// Rebuilds a ledger around blocks produced elsewhere. The blocks are taken
    /// as-is; use [`Ledger::validate_chain`] to check them.
    pub fn from_blocks(blocks: Vec<Block>, config: &LedgerConfig) -> Result<Self> {
        if blocks.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        Ok(Ledger {
            blocks,
            pending: PendingRecords::new(),
            pow: ProofOfWork::new(config.difficulty)?,
        })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn pending(&self) -> &[Record] {
        self.pending.as_slice()
    }

    pub fn proof_of_work(&self) -> &ProofOfWork {
        &self.pow
    }

    /// Buffers a record and returns the index of the block it will land in.
    pub fn add_record(&mut self, record: Record) -> Result<u64> {
        let next_index = self.get_last_block()?.index + 1;
        self.pending.push(record)?;
        Ok(next_index)
    }

    pub fn add_patient_data(
        &mut self,
        patient_id: &str,
        name: &str,
        age: u32,
        diagnosis: &str,
    ) -> Result<u64> {
        self.add_record(Record::patient(patient_id, name, age, diagnosis))
    }

    /// Appends a block holding every pending record, without checking `proof`
    /// or `previous_hash`. This is the raw primitive; [`Ledger::mine_block`]
    /// and [`Ledger::append_block`] are the checked paths.
    pub fn create_block(&mut self, proof: u64, previous_hash: impl Into<String>) -> Block {
        let index = self.blocks.len() as u64 + 1;
        let block = Block::new(index, self.pending.take(), proof, previous_hash);
        info!(index, records = block.data.len(), proof, "created block");
        self.blocks.push(block.clone());
        block
    }

    pub fn get_last_block(&self) -> Result<&Block> {
        self.blocks.last().ok_or(ChainError::EmptyChain)
    }

    /// Finds the proof for the last block with a sequential scan and appends a
    /// correctly linked block.
    pub fn mine_block(&mut self) -> Result<Block> {
        let (previous_proof, previous_hash) = self.last_link()?;
        let proof = self.pow.search(previous_proof);
        Ok(self.create_block(proof, previous_hash))
    }

    /// Like [`Ledger::mine_block`], using the miner's thread count and deadline.
    /// Pending records stay buffered if the search is cancelled.
    pub fn mine_block_with(&mut self, miner: &Miner, cancel: &CancelToken) -> Result<Block> {
        let (previous_proof, previous_hash) = self.last_link()?;
        let proof = miner.mine(&self.pow, previous_proof, cancel)?;
        Ok(self.create_block(proof, previous_hash))
    }

    /// Proof and hash of the last block: what the next block must build on.
    pub fn last_link(&self) -> Result<(u64, String)> {
        let last = self.get_last_block()?;
        Ok((last.proof, last.hash()?))
    }

    /// Appends a block built outside this ledger if it extends the chain correctly.
    pub fn append_block(&mut self, block: Block) -> Result<()> {
        let last = self.get_last_block()?;

        if block.index != last.index + 1 {
            return Err(ChainError::InvalidBlock(format!(
                "Invalid block index. Expected {}, but got {}.",
                last.index + 1,
                block.index
            )));
        }

        block.check_canonical()?;
        validate_link(last, &block, &self.pow).map_err(|e| ChainError::InvalidBlock(e.to_string()))?;

        info!(index = block.index, records = block.data.len(), "appended block");
        self.blocks.push(block);
        Ok(())
    }

    pub fn validate_chain(&self) -> Result<()> {
        validate_chain(&self.blocks, &self.pow)
    }

    pub fn is_chain_valid(&self) -> bool {
        self.validate_chain().is_ok()
    }
}
