//! Check the encoder against golden vectors stored in `test-vectors/`.
//!
//! The text vectors were produced by the reference zlib (level 6) with the
//! framing stripped, so they pin both stages: the raw DEFLATE payload and
//! the 6-bit packing. The packing vectors pin the second stage on its own,
//! including both kinds of partial final group.

use plantuml_core::encoding::{self, ALPHABET};

fn vectors() -> serde_json::Value {
    let raw = include_str!("../../test-vectors/encoding.json");
    serde_json::from_str(raw).unwrap()
}

fn unhex(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

#[test]
fn alphabet_matches_vectors() {
    let vectors = vectors();
    assert_eq!(vectors["alphabet"].as_str().unwrap().as_bytes(), ALPHABET);
}

// ---------------------------------------------------------------------------
// Packing
// ---------------------------------------------------------------------------

#[test]
fn packing_test_vectors() {
    let vectors = vectors();
    for case in vectors["packing"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let bytes = unhex(case["bytes"].as_str().unwrap());
        let token = case["token"].as_str().unwrap();

        assert_eq!(encoding::encode_bytes(&bytes), token, "{name}: encode");
        assert_eq!(token.len() % 4, 0, "{name}: no padding symbols");

        let unpacked = encoding::decode_bytes(token).unwrap();
        assert_eq!(&unpacked[..bytes.len()], &bytes[..], "{name}: decode prefix");
        assert!(
            unpacked[bytes.len()..].iter().all(|&b| b == 0),
            "{name}: zero fill"
        );
    }
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[test]
fn text_test_vectors() {
    let vectors = vectors();
    for case in vectors["texts"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let text = case["text"].as_str().unwrap();
        let token = case["token"].as_str().unwrap();

        if let Some(deflated) = case.get("deflated") {
            let expected = unhex(deflated.as_str().unwrap());
            assert_eq!(encoding::deflate(text.as_bytes()), expected, "{name}: deflate");
        }
        assert_eq!(encoding::encode(text), token, "{name}: encode");
        assert_eq!(encoding::decode(token).unwrap(), text, "{name}: decode");
    }
}

#[test]
fn vectors_cover_both_partial_group_sizes() {
    let vectors = vectors();
    let remainders: Vec<usize> = vectors["texts"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|case| case.get("deflated"))
        .map(|hex| hex.as_str().unwrap().len() / 2 % 3)
        .collect();
    assert!(remainders.contains(&1));
    assert!(remainders.contains(&2));
}
