//! Packet checksum codec
//!
//! The checksum is the sum of the byte values of a span, truncated to 16 bits
//! and sent as four ASCII hex digits (uppercase when generated, either case
//! accepted when received).

use crate::markers::{self, CHECKSUM_LEN};

/// Which bytes a packet checksum is computed over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChecksumScope {
    /// Packet content only, markers excluded
    #[default]
    Content,
    /// Packet content plus the raw STX and ETX control codes, as signs
    /// compute it on transmission
    Transmission,
}

impl ChecksumScope {
    /// Sum the span this scope designates for `content`
    pub fn span_sum(self, content: &[u8]) -> u16 {
        let sum = sum(content);
        match self {
            ChecksumScope::Content => sum,
            ChecksumScope::Transmission => sum
                .wrapping_add(u16::from(markers::STX))
                .wrapping_add(u16::from(markers::ETX)),
        }
    }
}

/// Wrapping 16-bit sum of every byte in `data`
///
/// The wire is 7-bit; bytes above 0x7E are summed as-is.
pub fn sum(data: &[u8]) -> u16 {
    data.iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)))
}

/// Compute the four-digit uppercase hex checksum of `data`
pub fn compute(data: &[u8]) -> String {
    format!("{:04X}", sum(data))
}

/// Check `claimed` against the checksum of `data`, ignoring hex digit case
pub fn verify(data: &[u8], claimed: &[u8]) -> bool {
    Checksum::parse(claimed)
        .filter(|_| claimed.len() == CHECKSUM_LEN)
        .is_some_and(|c| c.value() == sum(data))
}

/// Checksum as carried on the wire
///
/// The digits are kept exactly as received so a parsed packet re-encodes
/// byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum {
    digits: [u8; CHECKSUM_LEN],
}

impl Checksum {
    /// Build a checksum from a value, uppercase digits
    pub fn from_value(value: u16) -> Self {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        let mut digits = [0u8; CHECKSUM_LEN];
        for (i, digit) in digits.iter_mut().enumerate() {
            let shift = 12 - 4 * i;
            *digit = HEX[usize::from((value >> shift) & 0xF)];
        }
        Self { digits }
    }

    /// Checksum of `data` with no scope adjustment
    pub fn compute(data: &[u8]) -> Self {
        Self::from_value(sum(data))
    }

    /// Checksum of packet `content` under `scope`
    pub fn for_content(content: &[u8], scope: ChecksumScope) -> Self {
        Self::from_value(scope.span_sum(content))
    }

    /// Parse the first four bytes of `bytes` as hex digits
    ///
    /// Returns `None` unless all four are hex digits.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let digits: [u8; CHECKSUM_LEN] = bytes.get(..CHECKSUM_LEN)?.try_into().ok()?;
        digits
            .iter()
            .all(u8::is_ascii_hexdigit)
            .then_some(Self { digits })
    }

    /// Numeric value of the checksum
    pub fn value(&self) -> u16 {
        self.digits.iter().fold(0u16, |acc, &d| {
            let nibble = match d {
                b'0'..=b'9' => d - b'0',
                b'a'..=b'f' => d - b'a' + 10,
                _ => d - b'A' + 10,
            };
            (acc << 4) | u16::from(nibble)
        })
    }

    /// Wire digits
    pub fn as_bytes(&self) -> &[u8; CHECKSUM_LEN] {
        &self.digits
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Digits are validated hex, always ASCII
        f.write_str(&String::from_utf8_lossy(&self.digits))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Checksum {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
