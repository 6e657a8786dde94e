//! Adapters layer (Hexagonal Architecture)
//!
//! In-process implementations of the outbound ports. Hosts with a real token
//! contract or database swap these out behind the same traits.

mod clock;
mod memory_store;
mod signature;
mod snapshot;
mod token_ledger;

pub use clock::*;
pub use memory_store::*;
pub use signature::*;
pub use token_ledger::*;
