//! Registry snapshots
//!
//! A snapshot is the complete registry state in a serializable form. Hosts
//! that persist the registry write one after every mutation and restore from
//! it on start-up. The id counter travels with the batches so ids are never
//! reissued across a restart.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Serialize, Deserialize};
use tempfile::NamedTempFile;

use crate::error::{CoreError, Result};
use crate::models::{BatchId, CropBatch, Principal};

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Serializable registry state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Format version
    pub format_version: u32,

    /// Admin principal
    pub admin: Principal,

    /// Id the next registration will receive
    pub next_id: BatchId,

    /// Every batch, in id order
    pub batches: Vec<(BatchId, CropBatch)>,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}

impl RegistrySnapshot {
    /// Create a snapshot stamped with the current time
    pub fn new(admin: Principal, next_id: BatchId, batches: Vec<(BatchId, CropBatch)>) -> Self {
        RegistrySnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            admin,
            next_id,
            batches,
            taken_at: Utc::now(),
        }
    }

    /// Check that restoring this snapshot keeps every registry invariant
    pub fn validate(&self) -> Result<()> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(CoreError::Snapshot(format!(
                "unsupported format version {}",
                self.format_version
            )));
        }

        if self.admin.is_empty() {
            return Err(CoreError::Snapshot("admin principal is empty".to_string()));
        }

        if self.next_id.value() == 0 {
            return Err(CoreError::Snapshot("next id must be positive".to_string()));
        }

        if self.next_id > BatchId::LIMIT {
            return Err(CoreError::Snapshot(format!(
                "next id {} exceeds the id limit {}",
                self.next_id,
                BatchId::LIMIT
            )));
        }

        let mut seen = HashSet::with_capacity(self.batches.len());
        for (id, _) in &self.batches {
            if id.value() == 0 {
                return Err(CoreError::Snapshot("batch id 0 is not valid".to_string()));
            }
            if *id >= self.next_id {
                return Err(CoreError::Snapshot(format!(
                    "batch id {} is not below next id {}",
                    id, self.next_id
                )));
            }
            if !seen.insert(*id) {
                return Err(CoreError::Snapshot(format!("duplicate batch id {}", id)));
            }
        }

        Ok(())
    }

    /// Load a snapshot from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let snapshot: RegistrySnapshot = serde_json::from_reader(BufReader::new(file))?;

        debug!("Loaded snapshot from {} ({} batches)", path.display(), snapshot.batches.len());
        Ok(snapshot)
    }

    /// Write the snapshot to a JSON file
    ///
    /// The data is written and synced to a uniquely named temporary file in
    /// the same directory, then renamed over `path`, so a reader never sees a
    /// partial snapshot and concurrent writers never share a temporary file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;

        info!(
            "Saved snapshot to {} ({} batches, next id {})",
            path.display(),
            self.batches.len(),
            self.next_id
        );
        Ok(())
    }
}

/// Advisory lock on a snapshot file
///
/// The lock is taken on a sibling `<name>.lock` file rather than the snapshot
/// itself, because `to_file` replaces the snapshot's inode on every write.
/// Hosts that run load, mutate and save as separate steps hold an exclusive
/// lock across all three. The lock is released when the guard is dropped.
#[derive(Debug)]
pub struct SnapshotLock {
    file: File,
    path: PathBuf,
}

impl SnapshotLock {
    /// Block until the exclusive lock for `snapshot_path` is held
    pub fn exclusive(snapshot_path: impl AsRef<Path>) -> Result<Self> {
        let lock = Self::open(snapshot_path.as_ref())?;
        FileExt::lock_exclusive(&lock.file)?;

        debug!("Acquired exclusive lock {}", lock.path.display());
        Ok(lock)
    }

    /// Block until a shared lock for `snapshot_path` is held
    pub fn shared(snapshot_path: impl AsRef<Path>) -> Result<Self> {
        let lock = Self::open(snapshot_path.as_ref())?;
        FileExt::lock_shared(&lock.file)?;

        debug!("Acquired shared lock {}", lock.path.display());
        Ok(lock)
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(snapshot_path: &Path) -> Result<Self> {
        let mut name = snapshot_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        let path = snapshot_path.with_file_name(name);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        Ok(SnapshotLock { file, path })
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}
