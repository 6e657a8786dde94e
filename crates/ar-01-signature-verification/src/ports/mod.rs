//! # Ports Layer
//!
//! - **Inbound (Driving)**: API that the registry and hosts call

pub mod inbound;
