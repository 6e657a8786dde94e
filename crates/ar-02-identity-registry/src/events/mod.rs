//! Events layer
//!
//! Every committed mutation appends exactly one [`EventRecord`] in the same
//! atomic batch as its state change. Observers poll the log by sequence.

mod published;

pub use published::*;
