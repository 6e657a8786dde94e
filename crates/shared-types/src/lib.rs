//! # Shared Types Crate
//!
//! Primitive types used across the Agent Registry subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: byte widths for hashes and addresses are
//!   defined once here.
//! - **Text Form**: addresses and hashes travel as `0x`-prefixed lowercase hex
//!   outside the process; [`encoding`] owns that conversion.

pub mod encoding;
pub mod entities;
pub mod errors;

pub use encoding::*;
pub use entities::*;
pub use errors::*;
