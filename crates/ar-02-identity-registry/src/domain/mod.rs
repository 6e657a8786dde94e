//! Domain layer for the Identity Registry
//!
//! Pure state-machine logic; no I/O and no locking. The service layer reads
//! current records from the store, runs them through these functions, and
//! commits the returned records.

mod accounting;
mod config;
mod entities;
mod errors;
mod identity_key;
mod lifecycle;
mod vouching;

pub use accounting::*;
pub use config::*;
pub use entities::*;
pub use errors::*;
pub use identity_key::*;
pub use lifecycle::*;
pub use vouching::*;
