//! Decode error taxonomy for `credlens`
//!
//! Fixed-size layout shortfalls are fatal to the decode that hit them, since
//! a short field corrupts every subsequent offset. Malformed CBOR is fatal
//! only to the sub-decode that produced it. Trailing data and client-data
//! JSON failures are informational; they surface as diagnostic strings at
//! the serialization boundary, never as aborts.

/// Errors produced while decoding authenticator byte blobs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A fixed-size field was shorter than the layout requires
    #[error("{field} requires {required} bytes, only {available} available")]
    Truncated {
        field: &'static str,
        required: usize,
        available: usize,
    },

    /// Invalid CBOR encoding, with the byte offset where decoding failed
    #[error("malformed CBOR at byte {offset}: {reason}")]
    MalformedCbor { offset: usize, reason: String },

    /// Leftover bytes not explained by any flag (informational)
    #[error("{len} unexpected trailing byte(s) at offset {offset}")]
    UnexpectedTrailingData { offset: usize, len: usize },

    /// Client data JSON that could not be decoded (informational)
    #[error("invalid client data JSON: {0}")]
    JsonDecode(String),
}

impl DecodeError {
    /// Shift any byte offset by `base`, so errors from an embedded item
    /// point into the enclosing buffer instead of the sub-slice.
    pub(crate) fn rebase(self, base: usize) -> Self {
        match self {
            Self::MalformedCbor { offset, reason } => Self::MalformedCbor {
                offset: offset + base,
                reason,
            },
            Self::UnexpectedTrailingData { offset, len } => Self::UnexpectedTrailingData {
                offset: offset + base,
                len,
            },
            other => other,
        }
    }
}
