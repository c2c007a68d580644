//! Decode and encode table files under a known [`EncodingInfo`].
//!
//! `encoding_rs` only encodes to ASCII-compatible targets, so UTF-16 output
//! is produced here directly.

use encoding_rs::{UTF_16BE, UTF_16LE, UTF_8};

use super::EncodingInfo;

/// Text produced by [`decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    /// The decoded characters, BOM removed.
    pub text: String,
    /// Number of replacement characters substituted for invalid input.
    pub replacements: usize,
    /// Number of characters in `text`.
    pub char_count: usize,
}

impl DecodedText {
    /// Whether any input sequence was invalid.
    pub fn had_errors(&self) -> bool {
        self.replacements > 0
    }
}

/// Decode `bytes` under `info`.
///
/// A BOM is stripped when `info.has_bom` is set and the bytes start with it.
/// Replacement characters already present in the source are counted the same
/// as substitutions; the corpus does not contain literal U+FFFD.
pub fn decode(bytes: &[u8], info: &EncodingInfo) -> DecodedText {
    let encoding = info.encoding();
    let bom = info.bom();
    let body = if !bom.is_empty() && bytes.starts_with(bom) {
        &bytes[bom.len()..]
    } else {
        bytes
    };

    let (text, _) = encoding.decode_without_bom_handling(body);
    let replacements = text.chars().filter(|&c| c == '\u{FFFD}').count();
    let char_count = text.chars().count();

    DecodedText {
        text: text.into_owned(),
        replacements,
        char_count,
    }
}

/// Encode `text` under `info`, writing the BOM when `info.has_bom` is set.
///
/// Characters the target cannot represent are written as numeric character
/// references by `encoding_rs`, which keeps XML exports well-formed.
pub fn encode(text: &str, info: &EncodingInfo) -> Vec<u8> {
    let encoding = info.encoding();
    let mut out = info.bom().to_vec();

    if encoding == UTF_16LE {
        out.extend(text.encode_utf16().flat_map(|unit| unit.to_le_bytes()));
    } else if encoding == UTF_16BE {
        out.extend(text.encode_utf16().flat_map(|unit| unit.to_be_bytes()));
    } else if encoding == UTF_8 {
        out.extend_from_slice(text.as_bytes());
    } else {
        let (bytes, _, _) = encoding.encode(text);
        out.extend_from_slice(&bytes);
    }

    out
}
