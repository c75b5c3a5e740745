use std::collections::TryReserveError;

use thiserror::Error;

use crate::repo::RepoId;
use crate::solvable::SolvableId;
use crate::whatprovides::{ProviderList, StaleReason};

#[derive(Error, Debug)]
pub enum PoolError {
    // Index lifecycle errors
    #[error("WhatProvides index has not been built")]
    IndexNotBuilt,

    #[error("WhatProvides index is stale ({0}), rebuild it first")]
    IndexStale(StaleReason),

    #[error("Provider list handle {handle:?} is from an older index generation (current {current})")]
    StaleHandle { handle: ProviderList, current: u64 },

    // Resource errors
    #[error("Failed to allocate {what}: {source}")]
    Allocation {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    // Store errors
    #[error("Unknown solvable: {0}")]
    UnknownSolvable(SolvableId),

    #[error("Unknown repository: {0}")]
    UnknownRepo(RepoId),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file filter pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl PoolError {
    pub(crate) fn alloc(what: &'static str) -> impl FnOnce(TryReserveError) -> Self {
        move |source| PoolError::Allocation { what, source }
    }
}

pub type Result<T> = std::result::Result<T, PoolError>;
