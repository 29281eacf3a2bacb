//! PatientChain - a tamper-evident ledger of patient records
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the ledger, pending records and chain validation
//! - [`record`] - Record payloads stored in blocks
//!
//! ## Hashing & Consensus
//! - [`canonical`] - Canonical block encoding and SHA-256 hashing
//! - [`miner`] - Proof-of-work predicate and proof search
//!
//! ## Concurrency
//! - [`shared`] - Lock-guarded ledger handle for multi-threaded callers
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```no_run
//! use patientchain::blockchain::Ledger;
//! use patientchain::{hash_block, proof_of_work};
//!
//! let mut ledger = Ledger::new();
//! ledger.add_patient_data("P001", "Surya", 30, "Fever")?;
//!
//! let last = ledger.get_last_block()?.clone();
//! let proof = proof_of_work(last.proof);
//! ledger.create_block(proof, hash_block(&last)?);
//! assert!(ledger.is_chain_valid());
//! # Ok::<(), patientchain::error::ChainError>(())
//! ```

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod record;

// ============================================================================
// Hashing & Consensus
// ============================================================================
pub mod canonical;
pub mod miner;

// ============================================================================
// Concurrency
// ============================================================================
pub mod shared;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use blockchain::{Block, Ledger};
pub use canonical::hash_block;
pub use error::{ChainError, Result};
pub use miner::{proof_of_work, valid_proof, CancelToken, Miner, ProofOfWork};
pub use record::{FieldValue, Record};
pub use shared::SharedLedger;
