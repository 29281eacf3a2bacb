//! Proof-of-work mining.
//!
//! A proof is valid for a previous proof when
//! `sha256(format!("{previous}{proof}"))`, written in hex, starts with
//! `difficulty` zero characters. Every search strategy here returns the
//! smallest valid proof, so sequential and parallel mining agree.

use crate::config::MinerConfig;
use crate::error::{ChainError, Result};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Leading hex zeros required by default (~1 in 65536 candidates).
pub const DEFAULT_DIFFICULTY: u32 = 4;
/// A SHA-256 hex digest has 64 nibbles.
pub const MAX_DIFFICULTY: u32 = 64;

/// Candidates tried between cancellation checks in the sequential search.
const CANCEL_CHECK_INTERVAL: u64 = 1024;
/// Candidates per worker thread in each parallel window.
const PARALLEL_WINDOW_PER_THREAD: u64 = 1 << 14;

/// Shared flag that aborts a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The difficulty predicate and the searches over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: u32,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> Result<Self> {
        if difficulty > MAX_DIFFICULTY {
            return Err(ChainError::Config(format!(
                "difficulty must be at most {} nibbles, got {}",
                MAX_DIFFICULTY, difficulty
            )));
        }
        Ok(Self { difficulty })
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn is_valid(&self, previous_proof: u64, proof: u64) -> bool {
        let guess = format!("{}{}", previous_proof, proof);
        meets_difficulty(&Sha256::digest(guess.as_bytes()), self.difficulty)
    }

    /// Plain sequential scan from zero. Unbounded.
    pub fn search(&self, previous_proof: u64) -> u64 {
        let mut proof = 0u64;
        while !self.is_valid(previous_proof, proof) {
            proof += 1;
        }
        proof
    }

    /// Sequential scan that stops with [`ChainError::Cancelled`] once `cancel`
    /// fires or `deadline` passes.
    pub fn search_cancellable(
        &self,
        previous_proof: u64,
        cancel: &CancelToken,
        deadline: Option<Instant>,
    ) -> Result<u64> {
        let mut proof = 0u64;
        loop {
            if proof % CANCEL_CHECK_INTERVAL == 0 && should_stop(cancel, deadline) {
                debug!(previous_proof, tried = proof, "proof search cancelled");
                return Err(ChainError::Cancelled);
            }
            if self.is_valid(previous_proof, proof) {
                return Ok(proof);
            }
            proof += 1;
        }
    }

    /// Splits the candidate space into consecutive windows and scans each
    /// window across `threads` workers. The first window containing a valid
    /// proof yields its smallest one.
    pub fn search_parallel(
        &self,
        previous_proof: u64,
        threads: usize,
        cancel: &CancelToken,
        deadline: Option<Instant>,
    ) -> Result<u64> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| ChainError::Config(format!("Failed to build mining thread pool: {}", e)))?;
        let window = PARALLEL_WINDOW_PER_THREAD * threads as u64;

        pool.install(|| {
            let mut start = 0u64;
            loop {
                if should_stop(cancel, deadline) {
                    debug!(previous_proof, tried = start, "parallel proof search cancelled");
                    return Err(ChainError::Cancelled);
                }
                let end = start.saturating_add(window);
                let found = (start..end)
                    .into_par_iter()
                    .find_first(|&candidate| self.is_valid(previous_proof, candidate));
                if let Some(proof) = found {
                    return Ok(proof);
                }
                start = end;
            }
        })
    }
}

fn should_stop(cancel: &CancelToken, deadline: Option<Instant>) -> bool {
    cancel.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d)
}

fn meets_difficulty(digest: &[u8], nibbles: u32) -> bool {
    let full_bytes = (nibbles / 2) as usize;
    if digest.iter().take(full_bytes).any(|b| *b != 0) {
        return false;
    }
    nibbles % 2 == 0 || digest.get(full_bytes).is_some_and(|b| b >> 4 == 0)
}

/// Picks a search strategy from the miner settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Miner {
    pub threads: usize,
    pub timeout: Option<Duration>,
}

impl Default for Miner {
    fn default() -> Self {
        Self {
            threads: 1,
            timeout: None,
        }
    }
}

impl Miner {
    pub fn from_config(config: &MinerConfig) -> Self {
        Self {
            threads: config.threads,
            timeout: config.timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn mine(&self, pow: &ProofOfWork, previous_proof: u64, cancel: &CancelToken) -> Result<u64> {
        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);
        let proof = if self.threads > 1 {
            pow.search_parallel(previous_proof, self.threads, cancel, deadline)?
        } else {
            pow.search_cancellable(previous_proof, cancel, deadline)?
        };
        info!(
            previous_proof,
            proof,
            threads = self.threads,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "found proof of work"
        );
        Ok(proof)
    }
}

/// Checks a proof against the default difficulty.
pub fn valid_proof(previous_proof: u64, proof: u64) -> bool {
    ProofOfWork::default().is_valid(previous_proof, proof)
}

/// Smallest proof valid for `previous_proof` at the default difficulty.
pub fn proof_of_work(previous_proof: u64) -> u64 {
    ProofOfWork::default().search(previous_proof)
}
