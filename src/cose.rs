//! COSE public key projection
//!
//! A COSE key is a CBOR map keyed by small integer labels (RFC 9052 §7).
//! The viewer displays the five labels below; everything else a key may
//! carry is ignored by the projection.

use crate::cbor::{self, CborValue};
use crate::errors::DecodeError;
use crate::schema::{project, ProjectedRecord, Schema};

/// COSE key labels and the field names they are displayed under
pub const COSE_KEY_SCHEMA: Schema = &[
    ("1", "keyType"),
    ("3", "algorithm"),
    ("-1", "curve"),
    ("-2", "x"),
    ("-3", "y"),
];

/// Decode raw COSE key bytes into the projected display record
///
/// # Errors
/// Returns [`DecodeError::MalformedCbor`] if the bytes do not hold a
/// well-formed CBOR map.
pub fn decode_cose_key(bytes: &[u8]) -> Result<ProjectedRecord, DecodeError> {
    let (value, _) = cbor::decode_item(bytes)?;
    let CborValue::Map(entries) = value else {
        return Err(DecodeError::MalformedCbor {
            offset: 0,
            reason: "COSE key is not a map".to_string(),
        });
    };
    Ok(project(COSE_KEY_SCHEMA, &cbor::flatten_map(&entries)))
}
