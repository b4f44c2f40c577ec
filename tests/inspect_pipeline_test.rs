//! End-to-end decoding tests: raw registration and assertion blobs in,
//! JSON-ready debug payloads out.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use credlens::{inspect_assertion, inspect_registration};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// EC2 P-256 COSE key: {1: 2, 3: -7, -1: 1, -2: x, -3: y}
fn cose_key_bytes(x: &[u8; 32], y: &[u8; 32]) -> Vec<u8> {
    let mut out = vec![0xA5, 0x01, 0x02, 0x03, 0x26, 0x20, 0x01];
    out.extend_from_slice(&[0x21, 0x58, 0x20]);
    out.extend_from_slice(x);
    out.extend_from_slice(&[0x22, 0x58, 0x20]);
    out.extend_from_slice(y);
    out
}

fn auth_data_with_credential(sign_count: u32, credential_id: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = vec![0xAB; 32]; // rpIdHash
    out.push(0x45); // UP + UV + AT
    out.extend_from_slice(&sign_count.to_be_bytes());
    out.extend_from_slice(&[
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE,
        0xFF,
    ]);
    out.extend_from_slice(&u16::try_from(credential_id.len()).unwrap().to_be_bytes());
    out.extend_from_slice(credential_id);
    out.extend_from_slice(key);
    out
}

/// {"fmt": "none", "attStmt": {}, "authData": <bytes>}
fn attestation_object_bytes(auth_data: &[u8]) -> Vec<u8> {
    let mut out = vec![0xA3, 0x63];
    out.extend_from_slice(b"fmt");
    out.push(0x64);
    out.extend_from_slice(b"none");
    out.push(0x67);
    out.extend_from_slice(b"attStmt");
    out.push(0xA0);
    out.push(0x68);
    out.extend_from_slice(b"authData");
    out.push(0x58);
    out.push(u8::try_from(auth_data.len()).unwrap());
    out.extend_from_slice(auth_data);
    out
}

#[test]
fn test_registration_pipeline_decodes_every_layer() {
    init_logging();

    let x = [0x0A; 32];
    let y = [0x0B; 32];
    let key = cose_key_bytes(&x, &y);
    let credential_id = [0xDE, 0xAD, 0xBE, 0xEF];
    let auth_data = auth_data_with_credential(7, &credential_id, &key);
    let attestation_object = attestation_object_bytes(&auth_data);
    let client_data =
        br#"{"type":"webauthn.create","challenge":"c2FtcGxl","origin":"https://example.com"}"#;

    let view = inspect_registration(&attestation_object, client_data);
    let json = serde_json::to_value(&view).unwrap();

    // Outer attestation object fields pass through
    assert_eq!(json["attestationObject"]["fmt"], "none");
    assert_eq!(
        json["attestationObject"]["attStmt"],
        serde_json::json!({})
    );
    assert_eq!(
        json["attestationObject"]["authData"],
        URL_SAFE_NO_PAD.encode(&auth_data)
    );

    // Synthesized decodedAuthData
    let decoded = &json["attestationObject"]["decodedAuthData"];
    assert_eq!(decoded["rpIdHash"], URL_SAFE_NO_PAD.encode([0xAB; 32]));
    assert_eq!(decoded["counter"], 7);
    assert_eq!(decoded["flags"]["userPresent"], true);
    assert_eq!(decoded["flags"]["userVerified"], true);
    assert_eq!(decoded["flags"]["attestedCredentialData"], true);
    assert_eq!(decoded["flags"]["extensionDataIncluded"], false);
    assert_eq!(decoded["aaguid"], "00112233-4455-6677-8899-aabbccddeeff");
    assert_eq!(
        decoded["credentialId"],
        URL_SAFE_NO_PAD.encode(credential_id)
    );

    // COSE key projected onto named fields, both embedded and standalone
    for key_json in [&decoded["key"], &json["publicKey"]] {
        assert_eq!(key_json["keyType"], 2);
        assert_eq!(key_json["algorithm"], -7);
        assert_eq!(key_json["curve"], 1);
        assert_eq!(key_json["x"], URL_SAFE_NO_PAD.encode(x));
        assert_eq!(key_json["y"], URL_SAFE_NO_PAD.encode(y));
    }

    assert_eq!(json["clientDataJSON"]["type"], "webauthn.create");
    assert_eq!(json["clientDataJSON"]["origin"], "https://example.com");
}

#[test]
fn test_assertion_pipeline_decodes_both_blobs() {
    init_logging();

    let mut auth_data = vec![0x24u8; 32];
    auth_data.push(0x01); // UP only
    auth_data.extend_from_slice(&[0x00, 0x00, 0x01, 0x2C]); // 300, big-endian
    let client_data = br#"{"type":"webauthn.get","origin":"https://example.com"}"#;

    let json = serde_json::to_value(inspect_assertion(&auth_data, client_data)).unwrap();

    assert_eq!(json["authenticatorData"]["counter"], 300);
    assert_eq!(json["authenticatorData"]["flags"]["userPresent"], true);
    assert_eq!(json["authenticatorData"]["flags"]["userVerified"], false);
    assert_eq!(json["clientDataJSON"]["type"], "webauthn.get");
}

#[test]
fn test_registration_with_garbage_degrades_per_slot() {
    init_logging();

    let view = inspect_registration(&[0xFF, 0x00], b"not json");
    let json = serde_json::to_value(&view).unwrap();

    let attestation = json["attestationObject"].as_str().unwrap();
    assert!(attestation.starts_with("Could not decode: "));
    let client_data = json["clientDataJSON"].as_str().unwrap();
    assert!(client_data.starts_with("Could not decode: "));
    // No attestation object means no reachable public key
    assert!(json.get("publicKey").is_none());
}

#[test]
fn test_truncated_auth_data_inside_valid_attestation_object() {
    init_logging();

    // Well-formed outer map, but authData stops inside the counter
    let attestation_object = attestation_object_bytes(&[0x24; 35]);
    let json = serde_json::to_value(inspect_registration(&attestation_object, b"{}")).unwrap();

    assert_eq!(json["attestationObject"]["fmt"], "none");
    let decoded = json["attestationObject"]["decodedAuthData"].as_str().unwrap();
    assert_eq!(
        decoded,
        "Could not decode: signCount requires 4 bytes, only 2 available"
    );
}

#[test]
fn test_malformed_embedded_key_keeps_outer_record() {
    init_logging();

    // AT flag set, but the credential key bytes are not valid CBOR
    let auth_data = auth_data_with_credential(1, &[0x01, 0x02], &[0xFF, 0xFF, 0xFF]);
    let attestation_object = attestation_object_bytes(&auth_data);
    let json = serde_json::to_value(inspect_registration(&attestation_object, b"{}")).unwrap();

    let decoded = &json["attestationObject"]["decodedAuthData"];
    assert_eq!(decoded["counter"], 1);
    assert!(decoded["key"].as_str().unwrap().starts_with("Could not decode: "));
    assert!(!decoded["warnings"].as_array().unwrap().is_empty());
}
