//! Encoding transparency layer.
//!
//! Decides how each exported table file must be decoded and re-encoded so a
//! read-modify-write cycle never corrupts its bytes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │  EncodingDetector │ ──▶ │ FallbackStrategy │ ──▶ │  MetadataCache   │
//! │  (BOM + DBCS scan)│     │ (confidence +    │     │  / MetadataStore │
//! └──────────────────┘     │  history)        │     └──────────────────┘
//!                          └──────────────────┘
//!                                   │
//!                                   ▼
//!                             ┌───────────┐
//!                             │   codec   │  decode on open, encode on save
//!                             └───────────┘
//! ```

pub mod codec;
pub mod detector;
pub mod fallback;

pub use codec::{decode, encode, DecodedText};
pub use detector::EncodingDetector;
pub use fallback::{calculate_confidence, DetectionOutcome, DetectionSource, FallbackStrategy};

use std::fmt;
use std::str::FromStr;

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

/// Label used when nothing better is known.
pub const DEFAULT_ENCODING_LABEL: &str = "UTF-8";

/// How a file's bytes are decoded and encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodingInfo {
    /// WHATWG canonical encoding name (e.g. `UTF-8`, `EUC-KR`).
    pub encoding_label: String,
    /// Whether the file starts with a byte-order mark.
    pub has_bom: bool,
}

impl EncodingInfo {
    pub fn new(encoding_label: impl Into<String>, has_bom: bool) -> Self {
        Self {
            encoding_label: encoding_label.into(),
            has_bom,
        }
    }

    /// UTF-8 without BOM.
    pub fn utf8() -> Self {
        Self::new(DEFAULT_ENCODING_LABEL, false)
    }

    /// Resolve the label to an `encoding_rs` encoding.
    ///
    /// Unknown labels resolve to UTF-8.
    pub fn encoding(&self) -> &'static Encoding {
        Encoding::for_label(self.encoding_label.as_bytes()).unwrap_or(encoding_rs::UTF_8)
    }

    /// The BOM bytes this encoding writes when `has_bom` is set.
    pub fn bom(&self) -> &'static [u8] {
        if !self.has_bom {
            return &[];
        }
        let encoding = self.encoding();
        if encoding == encoding_rs::UTF_16LE {
            &[0xFF, 0xFE]
        } else if encoding == encoding_rs::UTF_16BE {
            &[0xFE, 0xFF]
        } else if encoding == encoding_rs::UTF_8 {
            &[0xEF, 0xBB, 0xBF]
        } else {
            &[]
        }
    }
}

impl Default for EncodingInfo {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Display for EncodingInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_bom {
            write!(f, "{} (BOM)", self.encoding_label)
        } else {
            write!(f, "{}", self.encoding_label)
        }
    }
}

/// Legacy double-byte charsets the validity scan understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyCharset {
    /// Korean EUC-KR / CP949 (unified Hangul code).
    #[default]
    EucKr,
    /// Simplified Chinese GBK.
    Gbk,
    /// Japanese Shift_JIS.
    ShiftJis,
    /// Traditional Chinese Big5.
    Big5,
}

impl LegacyCharset {
    /// WHATWG canonical label for this charset.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EucKr => "EUC-KR",
            Self::Gbk => "GBK",
            Self::ShiftJis => "Shift_JIS",
            Self::Big5 => "Big5",
        }
    }

    /// Whether `byte` may start a two-byte sequence.
    pub fn is_lead(&self, byte: u8) -> bool {
        match self {
            Self::EucKr | Self::Gbk | Self::Big5 => (0x81..=0xFE).contains(&byte),
            Self::ShiftJis => matches!(byte, 0x81..=0x9F | 0xE0..=0xFC),
        }
    }

    /// Whether `byte` may follow a lead byte.
    pub fn is_trail(&self, byte: u8) -> bool {
        match self {
            Self::EucKr => matches!(byte, 0x41..=0x5A | 0x61..=0x7A | 0x81..=0xFE),
            Self::Gbk => matches!(byte, 0x40..=0x7E | 0x80..=0xFE),
            Self::ShiftJis => matches!(byte, 0x40..=0x7E | 0x80..=0xFC),
            Self::Big5 => matches!(byte, 0x40..=0x7E | 0xA1..=0xFE),
        }
    }

    /// Whether a high-bit `byte` is a complete character on its own.
    pub fn is_single_high(&self, byte: u8) -> bool {
        match self {
            // Half-width katakana.
            Self::ShiftJis => (0xA1..=0xDF).contains(&byte),
            _ => false,
        }
    }
}

/// Error returned when a charset name is not one of the legacy charsets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported legacy charset: {0}")]
pub struct UnknownCharset(pub String);

impl FromStr for LegacyCharset {
    type Err = UnknownCharset;

    /// Parse a user-supplied charset name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "euc_kr" | "euckr" | "cp949" | "uhc" | "korean" => Ok(Self::EucKr),
            "gbk" | "cp936" | "gb2312" => Ok(Self::Gbk),
            "shift_jis" | "shiftjis" | "sjis" | "cp932" => Ok(Self::ShiftJis),
            "big5" | "cp950" => Ok(Self::Big5),
            _ => Err(UnknownCharset(s.to_string())),
        }
    }
}
