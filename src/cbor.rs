//! CBOR decoding for `WebAuthn` byte blobs
//!
//! This module builds a generic tagged value tree from a byte buffer holding
//! one well-formed CBOR data item, and flattens CBOR maps into ordered
//! (label, value) listings for debug display. Authenticator payloads use
//! CTAP2 canonical CBOR, so indefinite lengths are rejected.

use crate::errors::DecodeError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_TAG: u8 = 6;
const MAJOR_SIMPLE: u8 = 7;

const SIMPLE_FALSE: u8 = 20;
const SIMPLE_TRUE: u8 = 21;
const SIMPLE_NULL: u8 = 22;
const FLOAT16: u8 = 25;
const FLOAT32: u8 = 26;
const FLOAT64: u8 = 27;
const INDEFINITE: u8 = 31;

/// Nesting limit; authenticator payloads are shallow in practice.
const MAX_DEPTH: usize = 32;

/// A decoded CBOR data item
///
/// Every consumer handles each case explicitly; there is no dynamic
/// dispatch anywhere in the decode path.
#[derive(Debug, Clone, PartialEq)]
pub enum CborValue {
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    Bool(bool),
    Float(f64),
    Array(Vec<CborValue>),
    Map(Vec<(CborValue, CborValue)>),
    /// Tags and simple values, passed through opaquely
    Other(Opaque),
}

/// CBOR items the viewer has no dedicated shape for
#[derive(Debug, Clone, PartialEq)]
pub enum Opaque {
    /// A tagged item: tag number plus the enclosed item
    Tag(u64, Box<CborValue>),
    /// A simple value by number (22 is null, 23 is undefined)
    Simple(u8),
}

/// Decode exactly one CBOR data item from the front of `input`
///
/// Returns the decoded tree plus the count of bytes the item consumed, so
/// callers decoding an item embedded mid-stream (the COSE public key inside
/// authenticator data) know where it ends. Bytes past the item are left
/// untouched; the caller decides whether they are expected.
///
/// # Errors
/// Returns [`DecodeError::MalformedCbor`] with the byte offset where
/// decoding failed: truncated headers or content, reserved additional
/// information, indefinite lengths, invalid UTF-8 in text strings, integers
/// outside `i64`, or nesting past a fixed depth limit.
pub fn decode_item(input: &[u8]) -> Result<(CborValue, usize), DecodeError> {
    let mut reader = Reader { input, pos: 0 };
    let value = reader.item(0)?;
    Ok((value, reader.pos))
}

/// Shallow, single-level flatten of a CBOR map's entries
///
/// Produces one (label, value) pair per entry, preserving buffer order.
/// `Text` keys keep their string, `Int` keys become their base-10 string,
/// any other key type yields `None` — the pair is still emitted, so no
/// entries are dropped. Values pass through unchanged; scalar variants
/// already hold their native representation.
#[must_use]
pub fn flatten_map(entries: &[(CborValue, CborValue)]) -> Vec<(Option<String>, CborValue)> {
    entries
        .iter()
        .map(|(key, value)| (label_of(key), value.clone()))
        .collect()
}

/// Normalize a map key into the string label used for projection.
pub(crate) fn label_of(key: &CborValue) -> Option<String> {
    match key {
        CborValue::Text(text) => Some(text.clone()),
        CborValue::Int(n) => Some(n.to_string()),
        _ => None,
    }
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn malformed(&self, reason: impl Into<String>) -> DecodeError {
        DecodeError::MalformedCbor {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let b = *self
            .input
            .get(self.pos)
            .ok_or_else(|| self.malformed("unexpected end of input"))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| self.malformed("unexpected end of input"))?;
        let slice = &self.input[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Resolve the additional-information argument that follows the
    /// initial byte: small immediate values or 1/2/4/8-byte big-endian.
    fn argument(&mut self, info: u8) -> Result<u64, DecodeError> {
        match info {
            0..=23 => Ok(u64::from(info)),
            24 => Ok(u64::from(self.byte()?)),
            25 => {
                let b = self.take(2)?;
                Ok(u64::from(u16::from_be_bytes([b[0], b[1]])))
            }
            26 => {
                let b = self.take(4)?;
                Ok(u64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]])))
            }
            27 => {
                let b = self.take(8)?;
                Ok(u64::from_be_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ]))
            }
            INDEFINITE => Err(self.malformed("indefinite lengths are not supported")),
            _ => Err(self.malformed(format!("reserved additional information {info}"))),
        }
    }

    fn length(&mut self, info: u8) -> Result<usize, DecodeError> {
        let n = self.argument(info)?;
        usize::try_from(n).map_err(|_| self.malformed("length does not fit in usize"))
    }

    fn item(&mut self, depth: usize) -> Result<CborValue, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(self.malformed("nesting too deep"));
        }

        let initial = self.byte()?;
        let major = initial >> 5;
        let info = initial & 0x1f;

        match major {
            MAJOR_UNSIGNED => {
                let n = self.argument(info)?;
                let n = i64::try_from(n).map_err(|_| self.malformed("integer overflows i64"))?;
                Ok(CborValue::Int(n))
            }
            MAJOR_NEGATIVE => {
                let n = self.argument(info)?;
                let n = i64::try_from(n).map_err(|_| self.malformed("integer overflows i64"))?;
                Ok(CborValue::Int(-1 - n))
            }
            MAJOR_BYTES => {
                let len = self.length(info)?;
                Ok(CborValue::Bytes(self.take(len)?.to_vec()))
            }
            MAJOR_TEXT => {
                let len = self.length(info)?;
                let bytes = self.take(len)?;
                let text = std::str::from_utf8(bytes)
                    .map_err(|_| self.malformed("invalid UTF-8 in text string"))?;
                Ok(CborValue::Text(text.to_string()))
            }
            MAJOR_ARRAY => {
                let len = self.length(info)?;
                let mut items = Vec::new();
                for _ in 0..len {
                    items.push(self.item(depth + 1)?);
                }
                Ok(CborValue::Array(items))
            }
            MAJOR_MAP => {
                let len = self.length(info)?;
                let mut entries = Vec::new();
                for _ in 0..len {
                    let key = self.item(depth + 1)?;
                    let value = self.item(depth + 1)?;
                    entries.push((key, value));
                }
                Ok(CborValue::Map(entries))
            }
            MAJOR_TAG => {
                let tag = self.argument(info)?;
                let inner = self.item(depth + 1)?;
                Ok(CborValue::Other(Opaque::Tag(tag, Box::new(inner))))
            }
            MAJOR_SIMPLE => self.simple(info),
            _ => unreachable!("major type is three bits"),
        }
    }

    fn simple(&mut self, info: u8) -> Result<CborValue, DecodeError> {
        match info {
            SIMPLE_FALSE => Ok(CborValue::Bool(false)),
            SIMPLE_TRUE => Ok(CborValue::Bool(true)),
            24 => Ok(CborValue::Other(Opaque::Simple(self.byte()?))),
            FLOAT16 => {
                let b = self.take(2)?;
                Ok(CborValue::Float(half_to_f64(u16::from_be_bytes([
                    b[0], b[1],
                ]))))
            }
            FLOAT32 => {
                let b = self.take(4)?;
                Ok(CborValue::Float(f64::from(f32::from_be_bytes([
                    b[0], b[1], b[2], b[3],
                ]))))
            }
            FLOAT64 => {
                let b = self.take(8)?;
                Ok(CborValue::Float(f64::from_be_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ])))
            }
            INDEFINITE => Err(self.malformed("indefinite lengths are not supported")),
            28..=30 => Err(self.malformed(format!("reserved additional information {info}"))),
            n => Ok(CborValue::Other(Opaque::Simple(n))),
        }
    }
}

/// Half-precision float decoding per RFC 8949 appendix D.
fn half_to_f64(half: u16) -> f64 {
    let exponent = (half >> 10) & 0x1f;
    let mantissa = f64::from(half & 0x3ff);
    let magnitude = match exponent {
        0 => mantissa * (-24f64).exp2(),
        31 => {
            if mantissa == 0.0 {
                f64::INFINITY
            } else {
                f64::NAN
            }
        }
        _ => (mantissa + 1024.0) * f64::from(i32::from(exponent) - 25).exp2(),
    };
    if half & 0x8000 == 0 {
        magnitude
    } else {
        -magnitude
    }
}

/// Display-oriented JSON shape: byte strings become base64url text, map
/// keys are normalized to their label form, tags and simple values keep
/// their numbers visible.
impl Serialize for CborValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Bytes(bytes) => serializer.serialize_str(&URL_SAFE_NO_PAD.encode(bytes)),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    let label = label_of(key).unwrap_or_else(|| "(non-scalar key)".to_string());
                    map.serialize_entry(&label, value)?;
                }
                map.end()
            }
            Self::Other(Opaque::Tag(tag, inner)) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("tag", tag)?;
                map.serialize_entry("value", inner.as_ref())?;
                map.end()
            }
            Self::Other(Opaque::Simple(SIMPLE_NULL)) => serializer.serialize_none(),
            Self::Other(Opaque::Simple(n)) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("simple", n)?;
                map.end()
            }
        }
    }
}
