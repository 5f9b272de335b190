//! Diagram text to URL token encoding.
//!
//! # Design
//! Encoding runs in two deterministic stages:
//!
//! 1. **Deflate.** The UTF-8 bytes are zlib-compressed, then the 2-byte zlib
//!    header and the 4-byte Adler-32 trailer are cut off. What remains is the
//!    raw DEFLATE payload the server inflates. The zlib backend is used so
//!    the payload matches the reference zlib output byte for byte.
//! 2. **Pack.** The payload is packed 3 bytes → 4 symbols, 6 bits per symbol,
//!    over the alphabet `0-9A-Za-z-_`. A short final group is zero-filled and
//!    still emits 4 symbols, so no padding character ever appears.
//!
//! Decoding is the exact inverse and is mainly useful for diagnostics and
//! tests: a token taken from a URL can be turned back into diagram text.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::PlantUmlError;

/// The 64 symbols of the token alphabet, indexed by 6-bit value.
pub const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

const ZLIB_HEADER_LEN: usize = 2;
const ZLIB_TRAILER_LEN: usize = 4;

/// Encode diagram text into a URL-safe token.
///
/// Empty text yields the empty token.
pub fn encode(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    encode_bytes(&deflate(text.as_bytes()))
}

/// Compress `data` and return the raw DEFLATE payload without zlib framing.
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .expect("writing to an in-memory buffer cannot fail");
    let mut framed = encoder
        .finish()
        .expect("finishing an in-memory buffer cannot fail");

    // zlib always emits both the header and the trailer.
    framed.truncate(framed.len() - ZLIB_TRAILER_LEN);
    framed.drain(..ZLIB_HEADER_LEN);
    framed
}

/// Pack arbitrary bytes into alphabet symbols, 3 bytes → 4 symbols.
pub fn encode_bytes(data: &[u8]) -> String {
    let mut token = String::with_capacity(data.len().div_ceil(3) * 4);
    for group in data.chunks(3) {
        let b0 = group[0];
        let b1 = group.get(1).copied().unwrap_or(0);
        let b2 = group.get(2).copied().unwrap_or(0);
        let sextets = [
            b0 >> 2,
            ((b0 & 0x03) << 4) | (b1 >> 4),
            ((b1 & 0x0f) << 2) | (b2 >> 6),
            b2 & 0x3f,
        ];
        for sextet in sextets {
            token.push(char::from(ALPHABET[usize::from(sextet)]));
        }
    }
    token
}

/// Unpack alphabet symbols back into bytes, 4 symbols → 3 bytes.
///
/// Tokens produced by [`encode_bytes`] decode to the original bytes followed
/// by the zero bytes that filled the last group. A trailing group of 2 or 3
/// symbols is accepted and yields 1 or 2 bytes.
pub fn decode_bytes(token: &str) -> Result<Vec<u8>, PlantUmlError> {
    let sextets = token
        .char_indices()
        .map(|(offset, c)| {
            symbol_value(c).ok_or_else(|| {
                PlantUmlError::InvalidToken(format!("character {c:?} at offset {offset} is not in the alphabet"))
            })
        })
        .collect::<Result<Vec<u8>, _>>()?;

    if sextets.len() % 4 == 1 {
        return Err(PlantUmlError::InvalidToken(format!(
            "token length {} leaves a dangling symbol",
            sextets.len()
        )));
    }

    let mut data = Vec::with_capacity(sextets.len() / 4 * 3 + 2);
    for group in sextets.chunks(4) {
        let s = |i: usize| group.get(i).copied().unwrap_or(0);
        let bytes = [
            (s(0) << 2) | (s(1) >> 4),
            (s(1) << 4) | (s(2) >> 2),
            (s(2) << 6) | s(3),
        ];
        data.extend_from_slice(&bytes[..group.len() - 1]);
    }
    Ok(data)
}

/// Decode a token back into diagram text.
pub fn decode(token: &str) -> Result<String, PlantUmlError> {
    if token.is_empty() {
        return Ok(String::new());
    }
    let payload = decode_bytes(token)?;
    let mut text = String::new();
    DeflateDecoder::new(payload.as_slice())
        .read_to_string(&mut text)
        .map_err(|e| PlantUmlError::InvalidToken(format!("payload does not inflate to UTF-8 text: {e}")))?;
    Ok(text)
}

fn symbol_value(c: char) -> Option<u8> {
    let value = match c {
        '0'..='9' => c as u8 - b'0',
        'A'..='Z' => c as u8 - b'A' + 10,
        'a'..='z' => c as u8 - b'a' + 36,
        '-' => 62,
        '_' => 63,
        _ => return None,
    };
    Some(value)
}
