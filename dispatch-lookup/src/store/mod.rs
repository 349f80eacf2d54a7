//! Object store backends.
//!
//! - [`FsStore`]: content-addressed directory on local disk
//! - [`IpfsStore`]: IPFS node RPC API, with gateway completion of missing DAGs
//!
//! [`dispatch_core::MemoryStore`] covers tests and embedding.

pub mod fs;
pub mod ipfs;

pub use fs::FsStore;
pub use ipfs::IpfsStore;
