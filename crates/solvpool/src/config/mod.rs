//! Pool configuration
//!
//! A [`PoolConfig`] selects the distribution semantics of a pool (version
//! comparison scheme, architecture conventions, lazy file provides policy)
//! and the optional index features. Values are merged from these sources,
//! highest priority first:
//!
//! 1. Environment variables (`SOLVPOOL_*`)
//! 2. A JSON configuration file
//! 3. Built-in defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use solvpool::config::{DistType, PoolConfig};
//! use std::path::Path;
//!
//! let config = PoolConfig::build(Some(Path::new("/etc/solvpool.json")), true).unwrap();
//! if config.dist_type == DistType::Deb {
//!     println!("using dpkg version ordering");
//! }
//! ```

mod pool_config;
mod source;

pub use pool_config::{DistType, PoolConfig};
pub use source::{ConfigLoader, ConfigSource};
