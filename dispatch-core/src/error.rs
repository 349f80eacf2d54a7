//! Error types for record decoding

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record is not a JSON object")]
    NotAnObject,

    #[error("Record has no string `format` tag")]
    MissingFormat,

    #[error("Unknown record format: {0}")]
    UnknownFormat(String),

    #[error("Malformed {format} record: {reason}")]
    Shape { format: String, reason: String },

    #[error("Malformed {format} record: {source}")]
    Field {
        format: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure computing a record's CID.
#[derive(Error, Debug)]
pub enum CidError {
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Multihash error: {0}")]
    Multihash(#[from] cid::multihash::Error),
}
