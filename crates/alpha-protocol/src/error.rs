//! Error types for Alpha protocol parsing
//!
//! Errors are split by the layer that raises them. Grammar errors abort the
//! frame being parsed, command errors are scoped to a single packet, and a
//! checksum mismatch is only ever advisory.

use thiserror::Error;

/// Structural failures of the frame grammar
///
/// Offsets are positions in the input buffer handed to the parser.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Start-Of-Header marker, type code or address missing or malformed
    #[error("malformed header at offset {offset}")]
    MalformedHeader { offset: usize },

    /// Header parsed but no Start-Of-Text packet follows it
    #[error("no packets in frame at offset {offset}")]
    NoPackets { offset: usize },

    /// Packets parsed but no End-Of-Transmission marker follows them
    #[error("missing End-Of-Transmission marker at offset {offset}")]
    MissingTrailer { offset: usize },

    /// Start-Of-Text marker with no End-Of-Text marker before end of input
    #[error("unterminated packet starting at offset {offset}")]
    UnterminatedPacket { offset: usize },
}

impl FrameError {
    /// Offset in the input buffer where the failure was detected
    pub fn offset(&self) -> usize {
        match self {
            FrameError::MalformedHeader { offset }
            | FrameError::NoPackets { offset }
            | FrameError::MissingTrailer { offset }
            | FrameError::UnterminatedPacket { offset } => *offset,
        }
    }
}

/// Failures decoding the command carried by one packet
///
/// Offsets are positions within the packet content (the command byte is 0).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Packet content too short for the command
    #[error("insufficient data at offset {offset}: need {needed} more bytes")]
    InsufficientData { offset: usize, needed: usize },

    /// File label outside the valid range or reserved
    #[error("invalid file label 0x{label:02X} at offset {offset}")]
    InvalidFileLabel { offset: usize, label: u8 },

    /// Mode field recognised but incomplete or carrying an unknown identifier
    #[error("invalid mode field at offset {offset}: {reason}")]
    InvalidModeField { offset: usize, reason: String },

    /// No decoder registered for the command byte
    #[error("unknown command 0x{code:02X}")]
    UnknownCommand { code: u8 },
}

impl CommandError {
    /// Offset within the packet content where the failure was detected
    pub fn offset(&self) -> usize {
        match self {
            CommandError::InsufficientData { offset, .. }
            | CommandError::InvalidFileLabel { offset, .. }
            | CommandError::InvalidModeField { offset, .. } => *offset,
            CommandError::UnknownCommand { .. } => 0,
        }
    }
}

/// Packet checksum does not match its content
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("checksum mismatch: expected {expected:04X}, got {actual:04X}")]
pub struct ChecksumMismatch {
    /// Checksum computed from the packet content
    pub expected: u16,
    /// Checksum carried on the wire
    pub actual: u16,
}

/// Packet content that would end the packet early once encoded
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("packet content contains an End-Of-Text marker at offset {offset}")]
pub struct EmbeddedTerminator {
    /// Offset of the marker within the content
    pub offset: usize,
}

/// Higher-level protocol errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame grammar error
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Command decoding error
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Checksum verification failed
    #[error(transparent)]
    Checksum(#[from] ChecksumMismatch),

    /// Content cannot be carried in a packet
    #[error(transparent)]
    Content(#[from] EmbeddedTerminator),
}

/// Non-fatal findings collected while parsing a frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Diagnostic {
    /// Bytes other than NUL padding after the End-Of-Transmission marker
    TrailingGarbage { offset: usize, bytes: Vec<u8> },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::TrailingGarbage { offset, bytes } => {
                write!(f, "{} trailing garbage bytes at offset {}", bytes.len(), offset)
            }
        }
    }
}
