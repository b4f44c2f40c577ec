//! Best-effort client data JSON decoding
//!
//! The client data blob is UTF-8 JSON produced by the browser. Decoding it
//! exists purely to aid human inspection: any failure becomes a typed error
//! the boundary turns into a diagnostic string, never an abort.

use crate::errors::DecodeError;
use serde::{Deserialize, Serialize};

/// The client data fields shown in debug output
///
/// Every field is optional; a blob missing fields still decodes, since the
/// viewer prefers a partial record over a diagnostic string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientData {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub challenge: Option<String>,
    pub origin: Option<String>,
    #[serde(rename = "crossOrigin")]
    pub cross_origin: Option<bool>,
}

impl ClientData {
    /// Decode UTF-8 JSON bytes into the client data record
    ///
    /// # Errors
    /// Returns [`DecodeError::JsonDecode`] if the bytes are not valid UTF-8
    /// JSON of the expected shape.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(bytes).map_err(|e| DecodeError::JsonDecode(e.to_string()))
    }
}
