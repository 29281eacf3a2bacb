// Thin re-export module: implementation lives in `blockchain/core.rs`, split
// into the chain itself, the pending-record buffer and chain validation.

pub mod core;
pub use self::core::*;
