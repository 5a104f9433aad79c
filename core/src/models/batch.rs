//! Crop batch record
//!
//! A `CropBatch` is one provenance claim submitted by a producer. Every field
//! except `is_verified` is fixed at registration.

use serde::{Serialize, Deserialize};

use crate::crypto;
use super::domains;
use super::ids::{BatchId, Principal};

/// Verification state of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    /// Registered, awaiting attestation by the admin
    Unverified,

    /// Attested by the admin; terminal
    Verified,
}

/// A registered crop batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropBatch {
    /// Principal that registered the batch
    pub farmer: Principal,

    /// Free-form crop label (e.g. "Tomatoes")
    pub crop_type: String,

    /// Free-form origin descriptor
    pub location: String,

    /// Harvest time in Unix epoch seconds, as claimed by the farmer
    pub harvest_date: i64,

    /// Reference to supporting certificates (e.g. a content hash)
    pub cert_hash: String,

    /// Whether the admin has verified this batch
    pub is_verified: bool,
}

impl CropBatch {
    /// Create a new, unverified batch
    pub fn new(
        farmer: Principal,
        crop_type: impl Into<String>,
        location: impl Into<String>,
        harvest_date: i64,
        cert_hash: impl Into<String>,
    ) -> Self {
        CropBatch {
            farmer,
            crop_type: crop_type.into(),
            location: location.into(),
            harvest_date,
            cert_hash: cert_hash.into(),
            is_verified: false,
        }
    }

    /// Current state of the batch
    pub fn status(&self) -> BatchStatus {
        if self.is_verified {
            BatchStatus::Verified
        } else {
            BatchStatus::Unverified
        }
    }

    /// Domain-separated hash of the claim stored under `id`
    ///
    /// Covers the immutable fields only, so verification does not change it.
    pub fn fingerprint(&self, id: BatchId) -> [u8; 32] {
        let id_bytes = id.value().to_be_bytes();
        let harvest_bytes = self.harvest_date.to_be_bytes();

        crypto::secure_hash_multiple(
            domains::CROP_BATCH,
            &[
                &id_bytes,
                self.farmer.as_str().as_bytes(),
                self.crop_type.as_bytes(),
                self.location.as_bytes(),
                &harvest_bytes,
                self.cert_hash.as_bytes(),
            ],
        )
    }

    /// Hex form of [`CropBatch::fingerprint`]
    pub fn fingerprint_hex(&self, id: BatchId) -> String {
        hex::encode(self.fingerprint(id))
    }

    /// Compare a fingerprint against this claim in constant time
    pub fn matches_fingerprint(&self, id: BatchId, fingerprint: &[u8; 32]) -> bool {
        crypto::verify_hash(fingerprint, &self.fingerprint(id))
    }
}
