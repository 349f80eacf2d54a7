//! Content-addressed record storage on local disk
//!
//! Records are stored in canonical encoding, one file per CID, sharded by
//! the last characters of the CID. Reads verify the content hash.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dispatch_core::link::{canonical_bytes, cid_for_bytes, parse_cid};
use dispatch_core::{ObjectStore, StoreError};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

/// Characters of the CID used as shard directory
const SHARD_LEN: usize = 2;

pub struct FsStore {
    root_dir: PathBuf,
}

impl FsStore {
    /// Open a store at the given directory, creating it if needed.
    pub async fn new<P: AsRef<Path>>(root_dir: P) -> Result<Self, StoreError> {
        let root_dir = root_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir).await?;

        info!(path = %root_dir.display(), "Initialized record store");

        Ok(Self { root_dir })
    }

    /// Path of a record file. Rejects anything that is not a CID.
    fn object_path(&self, cid: &str) -> Result<PathBuf, StoreError> {
        parse_cid(cid).map_err(|e| StoreError::InvalidCid {
            cid: cid.to_string(),
            reason: e.to_string(),
        })?;
        let shard = &cid[cid.len().saturating_sub(SHARD_LEN)..];
        Ok(self.root_dir.join(shard).join(format!("{cid}.json")))
    }

    pub async fn exists(&self, cid: &str) -> bool {
        match self.object_path(cid) {
            Ok(path) => fs::metadata(path).await.is_ok(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn get(&self, cid: &str) -> Result<Value, StoreError> {
        let path = self.object_path(cid)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::unavailable(cid, "not found in local store"));
            }
            Err(e) => return Err(StoreError::unavailable(cid, e)),
        };

        let actual = cid_for_bytes(&bytes)?;
        if actual != cid {
            return Err(StoreError::HashMismatch {
                expected: cid.to_string(),
                actual,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn put(&self, value: &Value) -> Result<String, StoreError> {
        let bytes = canonical_bytes(value)?;
        let cid = cid_for_bytes(&bytes)?;
        let path = self.object_path(&cid)?;

        if fs::metadata(&path).await.is_ok() {
            debug!(cid = %cid, "Record already exists");
            return Ok(cid);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &bytes).await?;

        debug!(cid = %cid, size = bytes.len(), "Stored record");
        Ok(cid)
    }
}
