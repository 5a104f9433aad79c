//! Data models for the Crop Registry
//!
//! This module provides the identifier types and the crop batch record
//! stored by the registry.

mod batch;
mod ids;

pub use batch::{BatchStatus, CropBatch};
pub use ids::{BatchId, Principal};

/// Domain constants for data models
pub mod domains {
    /// Domain for crop batch fingerprints
    pub const CROP_BATCH: &str = "CROPREGISTRY_BATCH";
}
