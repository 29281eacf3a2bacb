// core.rs splits ledger responsibilities into submodules.
pub mod chain;
pub mod pending;
pub mod validation;

pub use chain::*;
pub use pending::*;
pub use validation::*;
