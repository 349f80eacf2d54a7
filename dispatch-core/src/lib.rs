//! Core record model for the dispatch claim graph.
//!
//! The claim graph is a content-addressed DAG of JSON records:
//!
//! - **Formulas** and the **contexts** they are stated in
//! - **Sequents** relating premise formulas to a conclusion
//! - **Productions** stating how a sequent was obtained (axiom, conjecture, tool)
//! - **Assertions**: an agent's Ed25519 signature over a production's CID
//! - **Collections** and **annotated** wrappers, transparent to lookup
//!
//! Records reference each other through links (`{"/": "<cid>"}`), never by
//! inline copies, so structurally identical records share one identity.
//!
//! # Key Components
//!
//! - [`Record`]: closed sum type over every record kind, built by [`Record::from_value`]
//! - [`validate`]: shape predicates (`is_formula`, `is_annotated_production`, ...)
//! - [`is_valid_signature`]: assertion signature check
//! - [`ObjectStore`]: the content-addressed store contract, with [`MemoryStore`]

pub mod agent;
pub mod error;
pub mod link;
pub mod record;
pub mod store;
pub mod validate;

// Re-export main types
pub use agent::{fingerprint, is_valid_signature, verify_assertion, FingerprintCache, SignatureError};
pub use error::{CidError, RecordError};
pub use link::{compute_cid, links, Link};
pub use record::*;
pub use store::{MemoryStore, ObjectStore, StoreError};
