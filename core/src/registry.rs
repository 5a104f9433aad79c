//! Crop registry state machine
//!
//! The registry owns every batch record, allocates batch ids and decides who
//! may move a batch from unverified to verified. It performs no I/O; hosts
//! that need persistence use [`Registry::snapshot`] and [`Registry::restore`].

use std::collections::BTreeMap;
use log::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::models::{BatchId, CropBatch, Principal};
use crate::snapshot::RegistrySnapshot;

/// In-memory crop registry
#[derive(Debug, Clone)]
pub struct Registry {
    /// Principal allowed to verify; fixed for the registry's lifetime
    admin: Principal,

    /// Batch records keyed by id
    batches: BTreeMap<BatchId, CropBatch>,

    /// Id handed to the next registration
    next_id: BatchId,
}

impl Registry {
    /// Create an empty registry administered by `admin`
    pub fn new(admin: impl Into<Principal>) -> Self {
        Registry {
            admin: admin.into(),
            batches: BTreeMap::new(),
            next_id: BatchId::FIRST,
        }
    }

    /// Create an empty registry from a validated configuration
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.admin.clone()))
    }

    /// The admin principal
    pub fn admin(&self) -> &Principal {
        &self.admin
    }

    /// Whether `caller` is the admin
    pub fn is_admin(&self, caller: &Principal) -> bool {
        *caller == self.admin
    }

    /// Id the next registration will receive
    pub fn next_id(&self) -> BatchId {
        self.next_id
    }

    /// Number of registered batches
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether no batch has been registered
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Register a new batch on behalf of `caller`
    ///
    /// Open to any principal. Field contents are recorded as claimed; nothing
    /// is validated.
    ///
    /// # Arguments
    ///
    /// * `caller` - Authenticated principal, recorded as the batch's farmer
    /// * `crop_type` - Claimed crop type
    /// * `location` - Claimed growing location
    /// * `harvest_date` - Claimed harvest time in Unix epoch seconds
    /// * `cert_hash` - Reference to an off-registry certificate
    ///
    /// # Returns
    ///
    /// The id assigned to the new batch, one greater than the previous one
    pub fn register(
        &mut self,
        caller: &Principal,
        crop_type: impl Into<String>,
        location: impl Into<String>,
        harvest_date: i64,
        cert_hash: impl Into<String>,
    ) -> BatchId {
        let id = self.next_id;
        let batch = CropBatch::new(caller.clone(), crop_type, location, harvest_date, cert_hash);

        self.batches.insert(id, batch);
        self.next_id = id.successor();

        debug!("Registered batch {} for {}", id, caller);
        id
    }

    /// Mark a batch as verified
    ///
    /// Checks run in a fixed order: authorization, then existence, then
    /// current status. A non-admin caller learns nothing about the batch.
    ///
    /// # Arguments
    ///
    /// * `caller` - Authenticated principal requesting verification
    /// * `id` - Batch to verify
    ///
    /// # Returns
    ///
    /// `Ok(())` once the batch is verified, or `NotAuthorized`, `NotFound` or
    /// `AlreadyVerified`, whichever check fails first
    pub fn verify(&mut self, caller: &Principal, id: BatchId) -> std::result::Result<(), RegistryError> {
        if !self.is_admin(caller) {
            warn!("Rejected verification of batch {} by non-admin {}", id, caller);
            return Err(RegistryError::NotAuthorized);
        }

        let batch = self.batches.get_mut(&id).ok_or_else(|| {
            warn!("Verification requested for unknown batch {}", id);
            RegistryError::NotFound(id)
        })?;

        if batch.is_verified {
            warn!("Batch {} is already verified", id);
            return Err(RegistryError::AlreadyVerified(id));
        }

        batch.is_verified = true;
        info!("Verified batch {} ({} from {})", id, batch.crop_type, batch.location);
        Ok(())
    }

    /// Look up a batch by id
    ///
    /// # Arguments
    ///
    /// * `id` - Batch to look up
    ///
    /// # Returns
    ///
    /// A copy of the batch record, or `NotFound` if no batch has this id
    pub fn get(&self, id: BatchId) -> std::result::Result<CropBatch, RegistryError> {
        debug!("Looking up batch {}", id);
        self.batches.get(&id).cloned().ok_or(RegistryError::NotFound(id))
    }

    /// Iterate over all batches in id order
    pub fn iter(&self) -> impl Iterator<Item = (BatchId, &CropBatch)> + '_ {
        self.batches.iter().map(|(id, batch)| (*id, batch))
    }

    /// All batches registered by `farmer`, in id order
    pub fn batches_by_farmer(&self, farmer: &Principal) -> Vec<(BatchId, CropBatch)> {
        self.iter()
            .filter(|(_, batch)| batch.farmer == *farmer)
            .map(|(id, batch)| (id, batch.clone()))
            .collect()
    }

    /// Capture the full registry state
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot::new(
            self.admin.clone(),
            self.next_id,
            self.iter().map(|(id, batch)| (id, batch.clone())).collect(),
        )
    }

    /// Rebuild a registry from a snapshot
    ///
    /// Fails if the snapshot could lead to an id being handed out twice.
    pub fn restore(snapshot: RegistrySnapshot) -> Result<Self> {
        snapshot.validate()?;

        let batches: BTreeMap<BatchId, CropBatch> = snapshot.batches.into_iter().collect();

        info!(
            "Restored registry with {} batches, next id {}",
            batches.len(),
            snapshot.next_id
        );

        Ok(Registry {
            admin: snapshot.admin,
            batches,
            next_id: snapshot.next_id,
        })
    }
}
