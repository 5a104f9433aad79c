//! Error types for the core crate
//!
//! `RegistryError` is the closed set of business outcomes the registry can
//! reject a request with. `CoreError` wraps it together with the failures of
//! the surrounding plumbing (configuration, snapshots, locking).

use thiserror::Error;
use std::io;

use crate::models::BatchId;

/// Rejection returned by a registry operation
///
/// Variants are listed in the order `verify` evaluates them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Caller is not the registry admin
    #[error("Caller is not authorized to verify batches")]
    NotAuthorized,

    /// No batch exists for the given id
    #[error("Batch not found: {0}")]
    NotFound(BatchId),

    /// Batch has already been verified
    #[error("Batch already verified: {0}")]
    AlreadyVerified(BatchId),
}

impl RegistryError {
    /// Stable numeric code for transports that cannot carry the variant
    pub fn code(&self) -> u32 {
        match self {
            RegistryError::NotAuthorized => 100,
            RegistryError::NotFound(_) => 101,
            RegistryError::AlreadyVerified(_) => 102,
        }
    }

    /// Symbolic name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::NotAuthorized => "ERR-NOT-AUTHORIZED",
            RegistryError::NotFound(_) => "ERR-NOT-FOUND",
            RegistryError::AlreadyVerified(_) => "ERR-ALREADY-VERIFIED",
        }
    }
}

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Registry rejected the request
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot could not be restored
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// State management error
    #[error("State management error: {0}")]
    State(String),
}

/// Result type for the core crate
pub type Result<T> = std::result::Result<T, CoreError>;
