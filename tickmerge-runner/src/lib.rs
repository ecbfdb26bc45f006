//! tickmerge runner: run orchestration on top of `tickmerge-core`.
//!
//! This crate provides:
//! - Flat `key=value` config loading into a typed `MergeConfig`
//! - Input file discovery by name prefix
//! - The merge runner (readers, coordinator, CSV output)
//! - Run summaries with a BLAKE3 digest of the output

pub mod config;
pub mod discovery;
pub mod runner;
pub mod summary;

pub use config::{load_config, parse_config, ConfigError, ConfigMap, MergeConfig};
pub use discovery::{discover_inputs, DiscoveryError};
pub use runner::{run_merge, RunError};
pub use summary::{digest_file, RunSummary, SCHEMA_VERSION};
