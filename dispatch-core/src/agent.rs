//! Agent identities: assertion signatures and fingerprints.
//!
//! An assertion is signed over the CID string of its claim, not over the
//! claim's content, so the signature binds to the claim's identity. Agents
//! are Ed25519 public keys in SPKI PEM form; signatures are pure Ed25519
//! (no pre-hash), hex encoded.

use std::collections::HashMap;

use ed25519_dalek::pkcs8::DecodePublicKey;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::record::Assertion;

/// Reasons an assertion signature does not verify.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("Invalid public key: {0}")]
    PublicKey(String),

    #[error("Invalid signature encoding: {0}")]
    Encoding(#[from] hex::FromHexError),

    #[error("Signature verification failed: {0}")]
    Verification(#[from] ed25519_dalek::SignatureError),
}

/// Verify an assertion's signature over its claim CID.
pub fn verify_assertion(assertion: &Assertion) -> Result<(), SignatureError> {
    let key = VerifyingKey::from_public_key_pem(&assertion.agent)
        .map_err(|e| SignatureError::PublicKey(e.to_string()))?;
    let bytes = hex::decode(&assertion.signature)?;
    let signature = Signature::from_slice(&bytes)?;

    key.verify(assertion.claim.cid().as_bytes(), &signature)?;
    Ok(())
}

/// Whether an assertion carries a valid signature.
pub fn is_valid_signature(assertion: &Assertion) -> bool {
    match verify_assertion(assertion) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(claim = %assertion.claim.cid(), error = %e, "Rejected assertion signature");
            false
        }
    }
}

/// Fingerprint of an agent: SHA256 of its public key text, hex encoded.
pub fn fingerprint(agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(agent.as_bytes());
    hex::encode(hasher.finalize())
}

/// Session-scoped fingerprint cache.
///
/// Owned by one ingestion session; nothing is shared between sessions.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    known: HashMap<String, String>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint an agent, computing it on first sight.
    pub fn fingerprint(&mut self, agent: &str) -> String {
        self.known
            .entry(agent.to_string())
            .or_insert_with(|| fingerprint(agent))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
