//! Serialization boundary for decoded records
//!
//! Everything here is JSON-ready and failure-tolerant: each fallible slot
//! holds either its decoded value or the diagnostic string that took its
//! place. Decode failures never escape this module as errors or panics,
//! since the display layer is explanatory, not authoritative — the
//! verification result it annotates must always reach the caller.

use crate::attestation;
use crate::authenticator::AuthenticatorData;
use crate::cbor::{self, CborValue};
use crate::client_data::ClientData;
use crate::cose;
use crate::errors::DecodeError;
use crate::schema::ProjectedRecord;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::warn;
use serde::Serialize;

/// A decoded value, or the diagnostic string that took its place
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Decoded<T> {
    Ok(T),
    Failed(String),
}

impl<T> Decoded<T> {
    fn from_result(context: &str, result: Result<T, DecodeError>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(err) => Self::failed(context, &err),
        }
    }

    fn failed(context: &str, err: &DecodeError) -> Self {
        warn!("{context}: {err}");
        Self::Failed(format!("Could not decode: {err}"))
    }
}

/// Flag booleans under the names the debug UI expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagsView {
    #[serde(rename = "userPresent")]
    pub user_present: bool,
    #[serde(rename = "userVerified")]
    pub user_verified: bool,
    #[serde(rename = "attestedCredentialData")]
    pub attested_credential_data: bool,
    #[serde(rename = "extensionDataIncluded")]
    pub extension_data_included: bool,
}

/// JSON-ready authenticator data record
///
/// Byte fields are base64url, the AAGUID is a hyphenated UUID, and the
/// embedded COSE key is projected onto its named fields. Anomalies the
/// parser recorded surface as warning strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticatorDataView {
    #[serde(rename = "rpIdHash")]
    pub rp_id_hash: String,
    pub flags: FlagsView,
    pub counter: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aaguid: Option<String>,
    #[serde(rename = "credentialId", skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Decoded<ProjectedRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<CborValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<&AuthenticatorData> for AuthenticatorDataView {
    fn from(data: &AuthenticatorData) -> Self {
        let attested = data.attested_credential_data.as_ref();
        Self {
            rp_id_hash: URL_SAFE_NO_PAD.encode(data.rp_id_hash),
            flags: FlagsView {
                user_present: data.flags.user_present,
                user_verified: data.flags.user_verified,
                attested_credential_data: data.flags.attested_credential_data_included,
                extension_data_included: data.flags.extension_data_included,
            },
            counter: data.sign_count,
            aaguid: attested.map(|a| a.aaguid.to_string()),
            credential_id: attested.map(|a| URL_SAFE_NO_PAD.encode(&a.credential_id)),
            key: attested.map(|a| {
                Decoded::from_result(
                    "credentialPublicKey",
                    cose::decode_cose_key(&a.credential_public_key),
                )
            }),
            extensions: data.extensions.clone(),
            warnings: data
                .anomalies
                .iter()
                .map(|anomaly| anomaly.to_string())
                .collect(),
        }
    }
}

/// JSON-ready attestation object: `fmt`, `attStmt`, `authData` plus the
/// synthesized `decodedAuthData`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttestationObjectView(ProjectedRecord);

/// The debug payload for a registration response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationView {
    #[serde(rename = "attestationObject")]
    pub attestation_object: Decoded<AttestationObjectView>,
    /// The embedded COSE key projected on its own, when reachable
    #[serde(rename = "publicKey", skip_serializing_if = "Option::is_none")]
    pub public_key: Option<Decoded<ProjectedRecord>>,
    #[serde(rename = "clientDataJSON")]
    pub client_data: Decoded<ClientData>,
}

/// The debug payload for an assertion response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertionView {
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: Decoded<AuthenticatorDataView>,
    #[serde(rename = "clientDataJSON")]
    pub client_data: Decoded<ClientData>,
}

/// One entry of a flattened CBOR map dump
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapEntryView {
    pub label: Option<String>,
    pub value: CborValue,
}

/// Decode raw authenticator data bytes for display.
#[must_use]
pub fn inspect_authenticator_data(bytes: &[u8]) -> Decoded<AuthenticatorDataView> {
    Decoded::from_result(
        "authenticatorData",
        AuthenticatorData::parse(bytes).map(|data| AuthenticatorDataView::from(&data)),
    )
}

/// Decode a raw attestation object for display, including the synthesized
/// `decodedAuthData` field.
#[must_use]
pub fn inspect_attestation_object(bytes: &[u8]) -> Decoded<AttestationObjectView> {
    match attestation_view(bytes) {
        Ok((view, _)) => Decoded::Ok(view),
        Err(err) => Decoded::failed("attestationObject", &err),
    }
}

/// Decode raw COSE key bytes for display.
#[must_use]
pub fn inspect_cose_key(bytes: &[u8]) -> Decoded<ProjectedRecord> {
    Decoded::from_result("publicKey", cose::decode_cose_key(bytes))
}

/// Decode client data JSON bytes for display.
#[must_use]
pub fn inspect_client_data(bytes: &[u8]) -> Decoded<ClientData> {
    Decoded::from_result("clientDataJSON", ClientData::decode(bytes))
}

/// Dump a CBOR map as its ordered (label, value) listing.
#[must_use]
pub fn inspect_cbor_map(bytes: &[u8]) -> Decoded<Vec<MapEntryView>> {
    let result = cbor::decode_item(bytes).and_then(|(value, _)| {
        let CborValue::Map(entries) = value else {
            return Err(DecodeError::MalformedCbor {
                offset: 0,
                reason: "not a CBOR map".to_string(),
            });
        };
        Ok(cbor::flatten_map(&entries)
            .into_iter()
            .map(|(label, value)| MapEntryView { label, value })
            .collect())
    });
    Decoded::from_result("cborMap", result)
}

/// Build the full registration debug payload from the raw attestation
/// object and client data bytes (already base64url-decoded by the caller).
#[must_use]
pub fn inspect_registration(attestation_object: &[u8], client_data_json: &[u8]) -> RegistrationView {
    let (attestation_object, key_bytes) = match attestation_view(attestation_object) {
        Ok((view, key_bytes)) => (Decoded::Ok(view), key_bytes),
        Err(err) => (Decoded::failed("attestationObject", &err), None),
    };
    RegistrationView {
        attestation_object,
        public_key: key_bytes.map(|bytes| inspect_cose_key(&bytes)),
        client_data: inspect_client_data(client_data_json),
    }
}

/// Build the full assertion debug payload from the raw authenticator data
/// and client data bytes (already base64url-decoded by the caller).
#[must_use]
pub fn inspect_assertion(authenticator_data: &[u8], client_data_json: &[u8]) -> AssertionView {
    AssertionView {
        authenticator_data: inspect_authenticator_data(authenticator_data),
        client_data: inspect_client_data(client_data_json),
    }
}

/// Decode an attestation object into its display record, returning the
/// embedded COSE key bytes alongside when they are reachable.
fn attestation_view(
    bytes: &[u8],
) -> Result<(AttestationObjectView, Option<Vec<u8>>), DecodeError> {
    let object = attestation::decode_attestation_object(bytes)?;
    let mut record = object.record;

    let (decoded_auth_data, key_bytes) = match object.auth_data_bytes.as_deref() {
        Some(auth_data) => match AuthenticatorData::parse(auth_data) {
            Ok(data) => {
                let key_bytes = data
                    .attested_credential_data
                    .as_ref()
                    .map(|a| a.credential_public_key.clone());
                (Decoded::Ok(AuthenticatorDataView::from(&data)), key_bytes)
            }
            Err(err) => (Decoded::failed("authData", &err), None),
        },
        None => (
            Decoded::Failed("Could not decode: authData missing or not a byte string".to_string()),
            None,
        ),
    };

    record.set_nested(
        "decodedAuthData",
        serde_json::to_value(&decoded_auth_data).unwrap_or(serde_json::Value::Null),
    );

    Ok((AttestationObjectView(record), key_bytes))
}

#[cfg(test)]
mod tests {
    use super::{
        inspect_authenticator_data, inspect_cbor_map, inspect_client_data, inspect_cose_key,
        Decoded,
    };

    #[test]
    fn test_truncated_buffer_becomes_diagnostic_string() {
        let decoded = inspect_authenticator_data(&[0u8; 12]);
        let Decoded::Failed(message) = decoded else {
            panic!("expected a diagnostic, got {decoded:?}");
        };
        assert_eq!(
            message,
            "Could not decode: rpIdHash requires 32 bytes, only 12 available"
        );
    }

    #[test]
    fn test_view_serializes_wire_field_names() {
        let mut data = vec![0x24u8; 32];
        data.push(0x05); // UP + UV
        data.extend_from_slice(&[0x00, 0x00, 0x01, 0x00]);

        let json = serde_json::to_value(inspect_authenticator_data(&data)).unwrap();
        assert_eq!(json["counter"], 256);
        assert_eq!(json["flags"]["userPresent"], true);
        assert_eq!(json["flags"]["userVerified"], true);
        assert_eq!(json["flags"]["attestedCredentialData"], false);
        assert_eq!(json["flags"]["extensionDataIncluded"], false);
        // No attested block: the optional fields stay out of the JSON
        assert!(json.get("aaguid").is_none());
        assert!(json.get("credentialId").is_none());
        assert!(json.get("key").is_none());
    }

    #[test]
    fn test_trailing_bytes_surface_as_warning() {
        let mut data = vec![0x24u8; 32];
        data.push(0x01);
        data.extend_from_slice(&[0, 0, 0, 1]);
        data.extend_from_slice(&[0xFF, 0xFF]);

        let json = serde_json::to_value(inspect_authenticator_data(&data)).unwrap();
        assert_eq!(
            json["warnings"][0],
            "2 unexpected trailing byte(s) at offset 37"
        );
    }

    #[test]
    fn test_client_data_garbage_degrades_to_string() {
        let json = serde_json::to_value(inspect_client_data(&[0x00, 0xFF])).unwrap();
        let message = json.as_str().expect("diagnostic must be a string");
        assert!(message.starts_with("Could not decode: "));
    }

    #[test]
    fn test_cose_key_garbage_degrades_to_string() {
        let json = serde_json::to_value(inspect_cose_key(&[0xFF, 0xFF])).unwrap();
        assert!(json.as_str().is_some());
    }

    #[test]
    fn test_cbor_map_dump_keeps_order() {
        // {3: -7, "fmt": "none"}
        let mut bytes = vec![0xA2, 0x03, 0x26, 0x63];
        bytes.extend_from_slice(b"fmt");
        bytes.push(0x64);
        bytes.extend_from_slice(b"none");

        let Decoded::Ok(entries) = inspect_cbor_map(&bytes) else {
            panic!("expected a decoded map");
        };
        assert_eq!(entries[0].label.as_deref(), Some("3"));
        assert_eq!(entries[1].label.as_deref(), Some("fmt"));
    }
}
