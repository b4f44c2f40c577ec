#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

//! # credlens
//!
//! Decodes the raw byte blobs a `WebAuthn` exchange produces — authenticator
//! data, attestation objects, COSE public keys, client data JSON — into
//! structured, JSON-serializable records for debug display.
//!
//! This crate only decodes bytes; it never judges authenticity. Signature
//! verification, attestation trust-chain validation and credential storage
//! belong to the verification engine whose outputs this crate annotates.
//!
//! All decoding is synchronous, side-effect-free and a pure function of the
//! input buffer: no locks, no I/O, no state across calls.

/// Version of the credlens library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod attestation;
pub mod authenticator;
pub mod cbor;
pub mod client_data;
pub mod cose;
pub mod errors;
pub mod schema;
pub mod view;

/// Re-export commonly used items
pub use authenticator::{AttestedCredentialData, AuthenticatorData, AuthenticatorFlags};
pub use cbor::{decode_item, flatten_map, CborValue};
pub use client_data::ClientData;
pub use errors::DecodeError;
pub use schema::{project, FieldValue, ProjectedRecord, Schema};
pub use view::{
    inspect_assertion, inspect_attestation_object, inspect_authenticator_data, inspect_cbor_map,
    inspect_client_data, inspect_cose_key, inspect_registration, Decoded,
};
