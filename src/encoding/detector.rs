//! Single-file encoding guess.
//!
//! The detector never fails: a byte stream that fits no rule is reported as
//! UTF-8 without BOM and the fallback strategy decides how much to trust it.

use tracing::debug;

use super::{EncodingInfo, LegacyCharset};

/// Known byte-order marks, longest first.
const BOMS: &[(&[u8], &str)] = &[
    (&[0xEF, 0xBB, 0xBF], "UTF-8"),
    (&[0xFF, 0xFE], "UTF-16LE"),
    (&[0xFE, 0xFF], "UTF-16BE"),
];

/// BOM sniffing plus a legacy double-byte validity scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingDetector {
    legacy: LegacyCharset,
}

impl EncodingDetector {
    /// Create a detector that scans for the given legacy charset.
    pub fn new(legacy: LegacyCharset) -> Self {
        Self { legacy }
    }

    /// The legacy charset this detector scans for.
    pub fn legacy_charset(&self) -> LegacyCharset {
        self.legacy
    }

    /// Best-effort guess of how `bytes` are encoded.
    pub fn detect(&self, bytes: &[u8]) -> EncodingInfo {
        if let Some(label) = sniff_bom(bytes) {
            debug!(encoding = label, "byte-order mark found");
            return EncodingInfo::new(label, true);
        }

        if bytes.is_ascii() {
            return EncodingInfo::utf8();
        }

        if std::str::from_utf8(bytes).is_ok() {
            return EncodingInfo::utf8();
        }

        if self.scan_legacy(bytes) {
            debug!(encoding = self.legacy.label(), "legacy double-byte scan passed");
            return EncodingInfo::new(self.legacy.label(), false);
        }

        debug!("no encoding rule matched, assuming UTF-8");
        EncodingInfo::utf8()
    }

    /// Whether every high-bit byte in `bytes` forms a valid sequence under
    /// the legacy charset.
    pub fn scan_legacy(&self, bytes: &[u8]) -> bool {
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b < 0x80 {
                i += 1;
                continue;
            }
            if self.legacy.is_single_high(b) {
                i += 1;
                continue;
            }
            if !self.legacy.is_lead(b) {
                return false;
            }
            match bytes.get(i + 1) {
                Some(&trail) if self.legacy.is_trail(trail) => i += 2,
                _ => return false,
            }
        }
        true
    }
}

/// Return the encoding label for a leading byte-order mark, if any.
pub fn sniff_bom(bytes: &[u8]) -> Option<&'static str> {
    BOMS.iter()
        .find(|(bom, _)| bytes.starts_with(bom))
        .map(|(_, label)| *label)
}
