//! Attestation object decoding
//!
//! A registration response carries a CBOR map `{fmt, attStmt, authData}`.
//! The format-specific attestation statement is not interpreted here; it
//! passes through as an opaque tree for display. The `authData` bytes are
//! handed back so callers can run the authenticator data parser on them
//! and attach the result as a synthesized `decodedAuthData` field.

use crate::cbor::{self, CborValue};
use crate::errors::DecodeError;
use crate::schema::{project, FieldValue, ProjectedRecord, Schema};

/// The attestation object labels the viewer displays
pub const ATTESTATION_OBJECT_SCHEMA: Schema =
    &[("fmt", "fmt"), ("attStmt", "attStmt"), ("authData", "authData")];

/// The projected attestation object plus its raw authenticator data
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationObject {
    /// `fmt`/`attStmt`/`authData` as found in the outer map
    pub record: ProjectedRecord,
    /// The `authData` byte string, when present and actually bytes
    pub auth_data_bytes: Option<Vec<u8>>,
}

/// Decode the outer CBOR map of an attestation object
///
/// # Errors
/// Returns [`DecodeError::MalformedCbor`] if the bytes do not hold a
/// well-formed CBOR map.
pub fn decode_attestation_object(bytes: &[u8]) -> Result<AttestationObject, DecodeError> {
    let (value, _) = cbor::decode_item(bytes)?;
    let CborValue::Map(entries) = value else {
        return Err(DecodeError::MalformedCbor {
            offset: 0,
            reason: "attestation object is not a map".to_string(),
        });
    };

    let record = project(ATTESTATION_OBJECT_SCHEMA, &cbor::flatten_map(&entries));
    let auth_data_bytes = match record.get("authData") {
        Some(FieldValue::Value(CborValue::Bytes(bytes))) => Some(bytes.clone()),
        _ => None,
    };

    Ok(AttestationObject {
        record,
        auth_data_bytes,
    })
}
