//! Persisted Frame Storage
//!
//! Rendered transition frames live outside the process heap behind the
//! [`FrameStore`] contract (`put` / `get` / `delete`). [`StoredFrame`] is
//! the owning handle: constructing one performs the `put`, and disposing or
//! dropping it performs the matching `delete` exactly once.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{DatabendError, Result};

/// External storage for rendered frames
///
/// Each id has at most one writer: it is put once and deleted once.
pub trait FrameStore: Send + Sync {
    fn put(&self, id: &str, bytes: &[u8]) -> Result<()>;

    fn get(&self, id: &str) -> Result<Vec<u8>>;

    fn delete(&self, id: &str) -> Result<()>;
}

fn poisoned() -> DatabendError {
    DatabendError::StorageError {
        reason: "frame store lock poisoned".to_string(),
    }
}

/// In-memory frame store
#[derive(Debug, Default)]
pub struct MemoryFrameStore {
    frames: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames currently held
    pub fn len(&self) -> usize {
        self.frames.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FrameStore for MemoryFrameStore {
    fn put(&self, id: &str, bytes: &[u8]) -> Result<()> {
        self.frames
            .lock()
            .map_err(|_| poisoned())?
            .insert(id.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Vec<u8>> {
        self.frames
            .lock()
            .map_err(|_| poisoned())?
            .get(id)
            .cloned()
            .ok_or_else(|| DatabendError::FrameNotFound { id: id.to_string() })
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.frames
            .lock()
            .map_err(|_| poisoned())?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DatabendError::FrameNotFound { id: id.to_string() })
    }
}

/// Frame store backed by one file per frame
///
/// A SHA-256 digest is recorded on `put` and checked on `get`.
pub struct DiskFrameStore {
    dir: PathBuf,
    checksums: Mutex<HashMap<String, String>>,
}

impl DiskFrameStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            checksums: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn frame_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.frame", id))
    }

    fn checksum(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }
}

impl FrameStore for DiskFrameStore {
    fn put(&self, id: &str, bytes: &[u8]) -> Result<()> {
        fs::write(self.frame_path(id), bytes)?;
        self.checksums
            .lock()
            .map_err(|_| poisoned())?
            .insert(id.to_string(), Self::checksum(bytes));
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Vec<u8>> {
        let expected = self
            .checksums
            .lock()
            .map_err(|_| poisoned())?
            .get(id)
            .cloned()
            .ok_or_else(|| DatabendError::FrameNotFound { id: id.to_string() })?;

        let bytes = fs::read(self.frame_path(id))?;
        if Self::checksum(&bytes) != expected {
            return Err(DatabendError::CorruptFrame { id: id.to_string() });
        }
        Ok(bytes)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let known = self
            .checksums
            .lock()
            .map_err(|_| poisoned())?
            .remove(id)
            .is_some();
        if !known {
            return Err(DatabendError::FrameNotFound { id: id.to_string() });
        }
        fs::remove_file(self.frame_path(id))?;
        Ok(())
    }
}

/// Owning handle to one persisted frame
pub struct StoredFrame {
    id: String,
    store: Arc<dyn FrameStore>,
    released: bool,
}

impl StoredFrame {
    /// Persist `bytes` under a fresh id
    pub fn put(store: Arc<dyn FrameStore>, bytes: &[u8]) -> Result<Self> {
        let id = Uuid::new_v4().to_string();
        store.put(&id, bytes)?;
        debug!("stored frame {} ({} bytes)", id, bytes.len());
        Ok(Self {
            id,
            store,
            released: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Read the frame back
    pub fn load(&self) -> Result<Vec<u8>> {
        self.store.get(&self.id)
    }

    /// Delete the frame from the store
    pub fn dispose(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.store.delete(&self.id)
    }
}

impl fmt::Debug for StoredFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredFrame")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

impl Drop for StoredFrame {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("failed to delete stored frame {}: {}", self.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_contract() {
        let store = MemoryFrameStore::new();
        store.put("a", &[1, 2, 3]).unwrap();
        assert_eq!(store.get("a").unwrap(), vec![1, 2, 3]);
        store.delete("a").unwrap();
        assert!(store.is_empty());
        assert_eq!(store.get("a").unwrap_err().error_code(), "FRAME_NOT_FOUND");
        assert!(store.delete("a").is_err());
    }

    #[test]
    fn test_disk_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFrameStore::new(&dir.path().join("frames")).unwrap();

        store.put("frame-1", &[9, 8, 7]).unwrap();
        assert!(store.dir().join("frame-1.frame").exists());
        assert_eq!(store.get("frame-1").unwrap(), vec![9, 8, 7]);

        store.delete("frame-1").unwrap();
        assert!(!store.dir().join("frame-1.frame").exists());
        assert!(store.get("frame-1").is_err());
    }

    #[test]
    fn test_disk_store_detects_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFrameStore::new(dir.path()).unwrap();
        store.put("x", &[1, 2, 3, 4]).unwrap();
        fs::write(dir.path().join("x.frame"), [0u8; 4]).unwrap();

        let err = store.get("x").unwrap_err();
        assert_eq!(err.error_code(), "CORRUPT_FRAME");
    }

    #[test]
    fn test_handle_pairs_put_and_delete() {
        let store = Arc::new(MemoryFrameStore::new());
        let frame = StoredFrame::put(store.clone(), &[5; 16]).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(frame.load().unwrap(), vec![5; 16]);

        frame.dispose().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_handle_deletes_on_drop() {
        let store = Arc::new(MemoryFrameStore::new());
        {
            let _a = StoredFrame::put(store.clone(), &[1]).unwrap();
            let _b = StoredFrame::put(store.clone(), &[2]).unwrap();
            assert_eq!(store.len(), 2);
        }
        assert!(store.is_empty());
    }
}
