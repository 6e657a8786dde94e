//! # Agent Registry Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── integration/      # Cross-crate scenarios
//! │   ├── lifecycle.rs  # Persistence across restarts
//! │   ├── signatures.rs # Real keys through the registry
//! │   └── node.rs       # JSON-lines sessions against the node
//! │
//! └── properties.rs     # proptest invariants over random operation sequences
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ar-tests
//!
//! # By category
//! cargo test -p ar-tests integration::
//! cargo test -p ar-tests properties::
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod properties;
