//! # Crop Registry Core
//!
//! State machine and data structures for tracking the provenance of
//! agricultural crop batches. Producers register batches; a single admin
//! principal verifies them, once.
//!
//! Transport and persistence are left to the host: the [`Registry`] is a
//! plain value, [`SharedRegistry`] adds locking for concurrent callers, and
//! [`RegistrySnapshot`] carries state across restarts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod registry;
pub mod snapshot;
pub mod state;

/// Re-export common types for ease of use
pub use config::RegistryConfig;
pub use error::{CoreError, RegistryError, Result};
pub use models::{BatchId, BatchStatus, CropBatch, Principal};
pub use registry::Registry;
pub use snapshot::{RegistrySnapshot, SnapshotLock};
pub use state::{SharedRegistry, SharedRegistryHandle, create_shared_registry};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
