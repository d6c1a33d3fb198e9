//! Wire markers
//!
//! The sign accepts a printable rendering of its control codes: `]` followed
//! by the control code plus 0x20. Frames on this wire are built from these
//! two-byte markers.

/// Start-Of-Header (SOH, 0x01)
pub const START_OF_HEADER: &[u8; 2] = b"]!";
/// Start-Of-Text (STX, 0x02)
pub const START_OF_TEXT: &[u8; 2] = b"]\"";
/// End-Of-Text (ETX, 0x03)
pub const END_OF_TEXT: &[u8; 2] = b"]#";
/// End-Of-Transmission (EOT, 0x04)
pub const END_OF_TRANSMISSION: &[u8; 2] = b"]$";
/// Escape (ESC, 0x1B)
pub const ESCAPE: &[u8; 2] = b"];";

/// Padding byte accepted before and after a frame
pub const PAD: u8 = 0x00;
/// Separator between chained addresses
pub const ADDRESS_SEPARATOR: u8 = b',';
/// Address wildcard digit
pub const ADDRESS_WILDCARD: u8 = b'?';

/// Raw STX control code
pub const STX: u8 = 0x02;
/// Raw ETX control code
pub const ETX: u8 = 0x03;

/// Number of ASCII hex digits in a packet checksum
pub const CHECKSUM_LEN: usize = 4;

/// Printable ASCII range used by type codes, labels and mode bytes
pub fn is_printable(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte)
}

/// Find the first occurrence of `marker` in `haystack`
pub(crate) fn find(haystack: &[u8], marker: &[u8]) -> Option<usize> {
    if marker.is_empty() || haystack.len() < marker.len() {
        return None;
    }
    haystack.windows(marker.len()).position(|w| w == marker)
}
