//! # Registry Node Library
//!
//! This library exposes the internal modules of the registry node for testing.
//! The main entry point is the `main.rs` binary.
//!
//! - `config` - environment-driven [`NodeConfig`]
//! - `commands` - JSON-lines request/response protocol
//! - `runtime` - service wiring and line handling

pub mod commands;
pub mod config;
pub mod runtime;

pub use commands::{dispatch, Command, Reply, Response};
pub use config::{load_config, ConfigError, NodeConfig};
pub use runtime::{NodeError, NodeService, RegistryNode};
