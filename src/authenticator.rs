//! `WebAuthn` authenticator data parsing
//!
//! Authenticator data is a fixed-and-variable-length byte layout:
//!
//! - 32 bytes: RP ID hash
//! - 1 byte: flags
//! - 4 bytes: signature counter (big-endian)
//! - if the AT flag is set:
//!   - 16 bytes: AAGUID
//!   - 2 bytes: credential ID length (big-endian)
//!   - L bytes: credential ID
//!   - one CBOR item: COSE public key
//! - if the ED flag is set: one CBOR map of extensions
//!
//! Byte consumption is strictly sequential and exact. A short fixed-size
//! field corrupts every subsequent offset, so it fails the whole parse with
//! no partial result. Malformed embedded CBOR and unexplained trailing
//! bytes are recorded as anomalies on the returned record instead; the
//! fields already parsed stay available for display.

use crate::cbor::{self, CborValue};
use crate::errors::DecodeError;
use uuid::Uuid;

const FLAG_USER_PRESENT: u8 = 1;
// bit 1 reserved (RFU1)
const FLAG_USER_VERIFIED: u8 = 1 << 2;
// bits 3-5 reserved (RFU2)
const FLAG_ATTESTED_CREDENTIAL_DATA: u8 = 1 << 6;
const FLAG_EXTENSION_DATA: u8 = 1 << 7;

/// The four meaningful bits of the flags byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatorFlags {
    pub user_present: bool,
    pub user_verified: bool,
    pub attested_credential_data_included: bool,
    pub extension_data_included: bool,
}

impl AuthenticatorFlags {
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        Self {
            user_present: byte & FLAG_USER_PRESENT != 0,
            user_verified: byte & FLAG_USER_VERIFIED != 0,
            attested_credential_data_included: byte & FLAG_ATTESTED_CREDENTIAL_DATA != 0,
            extension_data_included: byte & FLAG_EXTENSION_DATA != 0,
        }
    }
}

/// The attested credential block, present when the AT flag is set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredentialData {
    pub aaguid: Uuid,
    pub credential_id: Vec<u8>,
    /// Exact bytes of the embedded COSE key CBOR item. When that item is
    /// malformed, the remainder of the buffer lands here and the failure
    /// is recorded as an anomaly.
    pub credential_public_key: Vec<u8>,
}

/// A parsed authenticator data record
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: AuthenticatorFlags,
    pub sign_count: u32,
    pub attested_credential_data: Option<AttestedCredentialData>,
    pub extensions: Option<CborValue>,
    /// Non-fatal findings: malformed embedded CBOR, unexplained trailing
    /// bytes. Surfaced for debugging rather than dropped, since they
    /// indicate protocol-version drift or an authenticator bug.
    pub anomalies: Vec<DecodeError>,
}

impl AuthenticatorData {
    /// Parse the authenticator data byte layout
    ///
    /// # Errors
    /// Returns [`DecodeError::Truncated`] when a fixed-size field is
    /// shorter than required; no partial record is produced in that case.
    pub fn parse(input: &[u8]) -> Result<Self, DecodeError> {
        let mut buf = input;
        let mut anomalies = Vec::new();

        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(take(&mut buf, 32, "rpIdHash")?);

        let flags = AuthenticatorFlags::from_byte(take(&mut buf, 1, "flags")?[0]);

        // Big-endian per the wire format, like every other multi-byte
        // integer in this layout.
        let counter = take(&mut buf, 4, "signCount")?;
        let sign_count = u32::from_be_bytes([counter[0], counter[1], counter[2], counter[3]]);

        let mut consumed = 37;

        let attested_credential_data = if flags.attested_credential_data_included {
            let mut aaguid = [0u8; 16];
            aaguid.copy_from_slice(take(&mut buf, 16, "aaguid")?);

            let len = take(&mut buf, 2, "credentialIdLength")?;
            let credential_id_length = usize::from(u16::from_be_bytes([len[0], len[1]]));
            let credential_id = take(&mut buf, credential_id_length, "credentialId")?.to_vec();
            consumed += 18 + credential_id_length;

            // One well-formed CBOR item; its consumed-byte count locates
            // the start of any extension data.
            let credential_public_key = match cbor::decode_item(buf) {
                Ok((_, item_len)) => {
                    let bytes = buf[..item_len].to_vec();
                    buf = &buf[item_len..];
                    consumed += item_len;
                    bytes
                }
                Err(err) => {
                    anomalies.push(err.rebase(consumed));
                    consumed += buf.len();
                    let bytes = buf.to_vec();
                    buf = &[];
                    bytes
                }
            };

            Some(AttestedCredentialData {
                aaguid: Uuid::from_bytes(aaguid),
                credential_id,
                credential_public_key,
            })
        } else {
            None
        };

        let extensions = if flags.extension_data_included && !buf.is_empty() {
            match cbor::decode_item(buf) {
                Ok((CborValue::Map(entries), item_len)) => {
                    buf = &buf[item_len..];
                    consumed += item_len;
                    Some(CborValue::Map(entries))
                }
                Ok((_, item_len)) => {
                    anomalies.push(DecodeError::MalformedCbor {
                        offset: consumed,
                        reason: "extension data is not a CBOR map".to_string(),
                    });
                    buf = &buf[item_len..];
                    consumed += item_len;
                    None
                }
                Err(err) => {
                    // The ED flag claims the remainder; consume it so the
                    // same bytes are not also reported as trailing data.
                    anomalies.push(err.rebase(consumed));
                    consumed += buf.len();
                    buf = &[];
                    None
                }
            }
        } else {
            None
        };

        if !buf.is_empty() {
            anomalies.push(DecodeError::UnexpectedTrailingData {
                offset: consumed,
                len: buf.len(),
            });
        }

        Ok(Self {
            rp_id_hash,
            flags,
            sign_count,
            attested_credential_data,
            extensions,
            anomalies,
        })
    }
}

/// Slice off `count` bytes for the named field, or fail the whole parse.
fn take<'a>(
    buf: &mut &'a [u8],
    count: usize,
    field: &'static str,
) -> Result<&'a [u8], DecodeError> {
    if buf.len() < count {
        return Err(DecodeError::Truncated {
            field,
            required: count,
            available: buf.len(),
        });
    }
    let (head, rest) = buf.split_at(count);
    *buf = rest;
    Ok(head)
}
