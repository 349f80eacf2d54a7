//! Links and content identifiers.
//!
//! A record's CID is a CIDv1 with the dag-json codec and a SHA2-256
//! multihash over the record's canonical encoding: compact JSON with object
//! keys in lexicographic order.

use cid::multihash::Multihash;
use cid::Cid;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::CidError;

/// Multicodec code for dag-json
pub const DAG_JSON: u64 = 0x0129;

/// Multihash code for SHA2-256
pub const SHA2_256: u64 = 0x12;

/// Key of the single field of a link object
pub const LINK_KEY: &str = "/";

/// A reference to another record by CID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    #[serde(rename = "/")]
    pub cid: String,
}

impl Link {
    pub fn new(cid: impl Into<String>) -> Self {
        Self { cid: cid.into() }
    }

    pub fn cid(&self) -> &str {
        &self.cid
    }
}

/// Read a value as a link, returning the target CID.
pub fn as_link(value: &Value) -> Option<&str> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    obj.get(LINK_KEY)?.as_str()
}

/// Every link target reachable inside a value, in document order.
pub fn links(value: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_links(value, &mut found);
    found
}

fn collect_links(value: &Value, found: &mut Vec<String>) {
    if let Some(cid) = as_link(value) {
        found.push(cid.to_string());
        return;
    }
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_links(item, found)),
        Value::Object(fields) => fields.values().for_each(|field| collect_links(field, found)),
        _ => {}
    }
}

/// Rebuild a value with every object's keys in lexicographic order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Object(fields) => {
            let mut keys: Vec<&String> = fields.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&fields[key]));
            }
            Value::Object(sorted)
        }
        other => other.clone(),
    }
}

/// Canonical byte encoding of a record.
pub fn canonical_bytes(value: &Value) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&canonicalize(value))
}

/// Compute the CID of a record.
pub fn compute_cid(value: &Value) -> Result<String, CidError> {
    let bytes = canonical_bytes(value)?;
    cid_for_bytes(&bytes)
}

/// CID of already-canonical bytes.
pub fn cid_for_bytes(bytes: &[u8]) -> Result<String, CidError> {
    let digest = Sha256::digest(bytes);
    let hash = Multihash::<64>::wrap(SHA2_256, &digest)?;
    Ok(Cid::new_v1(DAG_JSON, hash).to_string())
}

/// Parse a CID string.
pub fn parse_cid(cid: &str) -> Result<Cid, cid::Error> {
    Cid::try_from(cid)
}
