//! Dispatch Lookup - justification search over signed assertions
//!
//! Answers: "by which chains of signed derivations, and from which
//! unresolved premises, could this formula be justified?"
//!
//! ## Pipeline
//!
//! ```text
//! assertion CIDs ──► Ingestor ──► DerivationIndex ──► Resolver ──► <formula>.json
//!                      │                                 │
//!                 ObjectStore                   memo + path per frame
//! ```
//!
//! - **Ingestion** validates each candidate assertion and its signature,
//!   dereferences its claim down to the sequent, and indexes it by conclusion.
//! - **Resolution** enumerates every alternative justification of the target,
//!   combining premise alternatives across multi-premise derivations and
//!   skipping derivations that would close a cycle.
//!
//! Resolution enumerates; it does not rank or check proofs.

pub mod config;
pub mod error;
pub mod ingest;
pub mod lookup;
pub mod resolve;
pub mod sink;
pub mod store;
pub mod types;

// Re-exports
pub use config::{LookupConfig, StoreBackend};
pub use error::LookupError;
pub use ingest::{build_index, Ingestor};
pub use lookup::{load_assertion_list, lookup, lookup_candidates, LookupOutcome};
pub use resolve::{resolve, Resolver};
pub use sink::{read_result, write_result};
pub use store::{FsStore, IpfsStore};
pub use types::*;
