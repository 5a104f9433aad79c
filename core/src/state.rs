//! Shared registry state
//!
//! `SharedRegistry` puts a [`Registry`] behind a single `RwLock` so one
//! instance can serve concurrent callers. Mutations hold the write lock for
//! the whole check-and-apply step; reads share the read lock.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::RegistryConfig;
use crate::error::{CoreError, Result};
use crate::models::{BatchId, CropBatch, Principal};
use crate::registry::Registry;
use crate::snapshot::RegistrySnapshot;

/// Registry guarded for concurrent access
#[derive(Debug)]
pub struct SharedRegistry {
    /// Registry state
    registry: RwLock<Registry>,
}

impl SharedRegistry {
    /// Create a new shared registry
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let registry = Registry::from_config(config)?;

        Ok(SharedRegistry {
            registry: RwLock::new(registry),
        })
    }

    /// Create a shared registry from a snapshot
    ///
    /// The snapshot's admin must match the configured one.
    pub fn from_snapshot(config: &RegistryConfig, snapshot: RegistrySnapshot) -> Result<Self> {
        config.validate()?;
        if snapshot.admin != config.admin {
            return Err(CoreError::Config(format!(
                "snapshot admin {} does not match configured admin {}",
                snapshot.admin, config.admin
            )));
        }

        Ok(SharedRegistry {
            registry: RwLock::new(Registry::restore(snapshot)?),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Registry>> {
        self.registry.read()
            .map_err(|e| CoreError::State(format!("Failed to read registry: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Registry>> {
        self.registry.write()
            .map_err(|e| CoreError::State(format!("Failed to write registry: {}", e)))
    }

    /// Register a new batch
    pub fn register(
        &self,
        caller: &Principal,
        crop_type: &str,
        location: &str,
        harvest_date: i64,
        cert_hash: &str,
    ) -> Result<BatchId> {
        let mut registry = self.write()?;
        Ok(registry.register(caller, crop_type, location, harvest_date, cert_hash))
    }

    /// Verify a batch
    pub fn verify(&self, caller: &Principal, id: BatchId) -> Result<()> {
        let mut registry = self.write()?;
        registry.verify(caller, id)?;
        Ok(())
    }

    /// Get a batch
    pub fn get(&self, id: BatchId) -> Result<CropBatch> {
        let registry = self.read()?;
        Ok(registry.get(id)?)
    }

    /// All batches registered by `farmer`
    pub fn batches_by_farmer(&self, farmer: &Principal) -> Result<Vec<(BatchId, CropBatch)>> {
        let registry = self.read()?;
        Ok(registry.batches_by_farmer(farmer))
    }

    /// Number of registered batches
    pub fn len(&self) -> Result<usize> {
        let registry = self.read()?;
        Ok(registry.len())
    }

    /// Whether no batch has been registered
    pub fn is_empty(&self) -> Result<bool> {
        let registry = self.read()?;
        Ok(registry.is_empty())
    }

    /// Id the next registration will receive
    pub fn next_id(&self) -> Result<BatchId> {
        let registry = self.read()?;
        Ok(registry.next_id())
    }

    /// Capture a consistent snapshot
    pub fn snapshot(&self) -> Result<RegistrySnapshot> {
        let registry = self.read()?;
        Ok(registry.snapshot())
    }
}

/// Thread-safe registry handle
pub type SharedRegistryHandle = Arc<SharedRegistry>;

/// Create a new shared registry handle
pub fn create_shared_registry(config: &RegistryConfig) -> Result<SharedRegistryHandle> {
    let registry = SharedRegistry::new(config)?;
    Ok(Arc::new(registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use std::collections::HashSet;
    use std::thread;

    const ADMIN: &str = "ST1ADMIN000000000000000000000000000000000";

    fn farmer() -> Principal {
        Principal::new("ST2FARMER00000000000000000000000000000000")
    }

    #[test]
    fn test_shared_registry_operations() {
        let registry = SharedRegistry::new(&RegistryConfig::testing(ADMIN)).unwrap();

        let id = registry.register(&farmer(), "Tomatoes", "USA", 1_700_000_000, "QmHash123").unwrap();
        assert_eq!(id, BatchId::FIRST);
        assert!(!registry.get(id).unwrap().is_verified);

        registry.verify(&Principal::new(ADMIN), id).unwrap();
        assert!(registry.get(id).unwrap().is_verified);

        match registry.verify(&Principal::new(ADMIN), id) {
            Err(CoreError::Registry(RegistryError::AlreadyVerified(got))) => assert_eq!(got, id),
            other => panic!("Expected AlreadyVerified, got {:?}", other),
        }

        match registry.get(BatchId::new(2)) {
            Err(CoreError::Registry(RegistryError::NotFound(_))) => {}
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            SharedRegistry::new(&RegistryConfig::new("")),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_concurrent_registrations_get_unique_ids() {
        let registry = create_shared_registry(&RegistryConfig::new(ADMIN)).unwrap();
        let threads = 8;
        let per_thread = 50;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let caller = Principal::new(format!("ST{}FARMER", t));
                    (0..per_thread)
                        .map(|_| registry.register(&caller, "Corn", "India", 0, "h").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id));
            }
        }

        let total = (threads * per_thread) as u64;
        assert_eq!(ids.len() as u64, total);
        assert!(ids.iter().all(|id| (1..=total).contains(&id.value())));
        assert_eq!(registry.next_id().unwrap(), BatchId::new(total + 1));
    }

    #[test]
    fn test_concurrent_verification_succeeds_once() {
        let registry = create_shared_registry(&RegistryConfig::new(ADMIN)).unwrap();
        let id = registry.register(&farmer(), "Beans", "Mexico", 0, "HashBean").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.verify(&Principal::new(ADMIN), id).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn test_from_snapshot() {
        let registry = SharedRegistry::new(&RegistryConfig::new(ADMIN)).unwrap();
        registry.register(&farmer(), "Rice", "Brazil", 0, "HashXYZ").unwrap();
        let snapshot = registry.snapshot().unwrap();

        let restored = SharedRegistry::from_snapshot(&RegistryConfig::new(ADMIN), snapshot.clone()).unwrap();
        assert_eq!(restored.len().unwrap(), 1);
        assert!(!restored.is_empty().unwrap());
        assert_eq!(restored.batches_by_farmer(&farmer()).unwrap().len(), 1);

        assert!(matches!(
            SharedRegistry::from_snapshot(&RegistryConfig::new("ST9SOMEONEELSE"), snapshot),
            Err(CoreError::Config(_))
        ));
    }
}
