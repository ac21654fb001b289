//! Text encoding detection for uploaded files and archive members
//!
//! Detection order:
//! 1. Byte order mark (UTF-8, UTF-16LE, UTF-16BE)
//! 2. BOM-less UTF-16, recognized by NUL bytes in alternating positions
//! 3. Strict UTF-8
//! 4. Windows-1252 (covers Latin-1 as well)
//!
//! Decoding is strict for UTF-8 and UTF-16: malformed input is an error rather
//! than silently replaced, so callers can skip the member and move on.

use std::borrow::Cow;

use encoding_rs::{UTF_16BE, UTF_16LE, WINDOWS_1252};

use crate::error::{Error, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Share of NUL bytes in one lane above which BOM-less UTF-16 is assumed
const UTF16_NUL_RATIO: f64 = 0.3;

/// Supported text encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Windows1252,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
            Self::Windows1252 => "windows-1252",
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decoded text together with the encoding it was read as
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Guess the encoding of a byte buffer
pub fn detect(bytes: &[u8]) -> TextEncoding {
    if bytes.starts_with(UTF8_BOM) {
        return TextEncoding::Utf8;
    }
    if bytes.starts_with(UTF16LE_BOM) {
        return TextEncoding::Utf16Le;
    }
    if bytes.starts_with(UTF16BE_BOM) {
        return TextEncoding::Utf16Be;
    }

    if let Some(encoding) = sniff_utf16(bytes) {
        return encoding;
    }

    if std::str::from_utf8(bytes).is_ok() {
        TextEncoding::Utf8
    } else {
        TextEncoding::Windows1252
    }
}

/// Detect the encoding and decode
pub fn decode(bytes: &[u8]) -> Result<DecodedText> {
    let encoding = detect(bytes);
    let text = decode_as(bytes, encoding)?;
    Ok(DecodedText { text, encoding })
}

/// Decode with a known encoding, stripping any matching BOM
pub fn decode_as(bytes: &[u8], encoding: TextEncoding) -> Result<String> {
    match encoding {
        TextEncoding::Utf8 => {
            let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            std::str::from_utf8(body)
                .map(str::to_string)
                .map_err(|e| Error::Parse(format!("Invalid UTF-8 text: {}", e)))
        }
        TextEncoding::Utf16Le => {
            let body = bytes.strip_prefix(UTF16LE_BOM).unwrap_or(bytes);
            strict_utf16(UTF_16LE.decode_without_bom_handling_and_without_replacement(body), encoding)
        }
        TextEncoding::Utf16Be => {
            let body = bytes.strip_prefix(UTF16BE_BOM).unwrap_or(bytes);
            strict_utf16(UTF_16BE.decode_without_bom_handling_and_without_replacement(body), encoding)
        }
        TextEncoding::Windows1252 => {
            let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
            Ok(text.into_owned())
        }
    }
}

fn strict_utf16(decoded: Option<Cow<'_, str>>, encoding: TextEncoding) -> Result<String> {
    decoded
        .map(Cow::into_owned)
        .ok_or_else(|| Error::Parse(format!("Malformed {} text", encoding)))
}

/// ASCII-heavy UTF-16 has a NUL high byte in every other position
fn sniff_utf16(bytes: &[u8]) -> Option<TextEncoding> {
    let pairs = bytes.len() / 2;
    if pairs == 0 {
        return None;
    }

    let mut even_nuls = 0usize;
    let mut odd_nuls = 0usize;
    for pair in bytes.chunks_exact(2) {
        if pair[0] == 0 {
            even_nuls += 1;
        }
        if pair[1] == 0 {
            odd_nuls += 1;
        }
    }

    let threshold = (pairs as f64 * UTF16_NUL_RATIO).ceil() as usize;
    if odd_nuls >= threshold && odd_nuls > even_nuls {
        Some(TextEncoding::Utf16Le)
    } else if even_nuls >= threshold && even_nuls > odd_nuls {
        Some(TextEncoding::Utf16Be)
    } else {
        None
    }
}
