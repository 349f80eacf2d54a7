//! Content-addressed object store contract.
//!
//! Stores hold immutable JSON records keyed by CID. Lookup only needs
//! `get` and `ensure_full_dag`; `put` exists for publishing and fixtures.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::error::CidError;
use crate::link::{canonicalize, compute_cid, links};

/// Error types for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Object could not be retrieved, locally or remotely
    #[error("Content unavailable: {cid}: {reason}")]
    Unavailable { cid: String, reason: String },

    /// Not a valid content identifier
    #[error("Invalid CID {cid}: {reason}")]
    InvalidCid { cid: String, reason: String },

    /// Stored bytes do not hash to the requested CID
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// Backend failure not tied to one record
    #[error("Store backend error: {0}")]
    Backend(String),

    /// No gateway configured to complete a missing DAG
    #[error("Unknown gateway (while trying to retrieve {0})")]
    UnknownGateway(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    Cid(#[from] CidError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn unavailable(cid: &str, reason: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            cid: cid.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the record stored under `cid`.
    async fn get(&self, cid: &str) -> Result<Value, StoreError>;

    /// Store a record, returning its CID.
    async fn put(&self, value: &Value) -> Result<String, StoreError>;

    /// Make sure `cid` and every record it transitively links to can be
    /// fetched.
    ///
    /// The default walks the DAG through `get` and fails on the first
    /// missing link.
    async fn ensure_full_dag(&self, cid: &str) -> Result<(), StoreError> {
        let mut pending = vec![cid.to_string()];
        let mut seen = HashSet::new();

        while let Some(next) = pending.pop() {
            if !seen.insert(next.clone()) {
                continue;
            }
            let value = self.get(&next).await?;
            pending.extend(links(&value));
        }

        tracing::trace!(cid = %cid, records = seen.len(), "DAG complete");
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Store a value under an arbitrary key, bypassing content addressing.
    ///
    /// Only useful to simulate foreign or corrupted content.
    pub fn insert_raw(&self, cid: impl Into<String>, value: Value) {
        self.objects.insert(cid.into(), value);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, cid: &str) -> Result<Value, StoreError> {
        self.objects
            .get(cid)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::unavailable(cid, "not found in memory store"))
    }

    async fn put(&self, value: &Value) -> Result<String, StoreError> {
        let cid = compute_cid(value)?;
        self.objects
            .entry(cid.clone())
            .or_insert_with(|| canonicalize(value));
        Ok(cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_is_content_addressed() {
        let store = MemoryStore::new();
        let a = store.put(&json!({"format": "tool", "content": "z3"})).await.unwrap();
        let b = store.put(&json!({"content": "z3", "format": "tool"})).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&a).await.unwrap()["content"], "z3");
    }

    #[tokio::test]
    async fn test_missing_is_unavailable() {
        let store = MemoryStore::new();
        let err = store.get("bagaaieramissing").await.unwrap_err();

        assert!(matches!(err, StoreError::Unavailable { ref cid, .. } if cid == "bagaaieramissing"));
    }

    #[tokio::test]
    async fn test_ensure_full_dag() {
        let store = MemoryStore::new();
        let lang = store.put(&json!({"format": "language", "content": "fol"})).await.unwrap();
        let formula = store
            .put(&json!({
                "format": "formula",
                "language": {"/": lang},
                "content": "p",
                "context": []
            }))
            .await
            .unwrap();
        let dangling = store
            .put(&json!({
                "format": "sequent",
                "dependencies": [{"/": "bagaaieragone"}],
                "conclusion": {"/": formula}
            }))
            .await
            .unwrap();

        assert!(store.ensure_full_dag(&formula).await.is_ok());

        let err = store.ensure_full_dag(&dangling).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { ref cid, .. } if cid == "bagaaieragone"));
    }
}
