//! Packet extraction
//!
//! A packet runs from a Start-Of-Text marker to the first End-Of-Text marker
//! after it, optionally followed by a four-digit hex checksum.
//!
//! # Format
//! ```text
//! ]" <content> ]# [cccc]
//! ```

use crate::checksum::{Checksum, ChecksumScope};
use crate::error::{ChecksumMismatch, EmbeddedTerminator, FrameError};
use crate::markers::{self, CHECKSUM_LEN, END_OF_TEXT, START_OF_TEXT};

/// One packet of a frame
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Packet {
    /// Bytes between the Start-Of-Text and End-Of-Text markers
    pub content: Vec<u8>,
    /// Checksum following the End-Of-Text marker, if any
    pub checksum: Option<Checksum>,
}

/// Result of checking a packet's checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ChecksumStatus {
    /// Packet carries no checksum
    Absent,
    /// Checksum matches the content
    Valid,
    /// Checksum does not match the content
    Mismatch(ChecksumMismatch),
}

impl ChecksumStatus {
    /// True unless the checksum is present and wrong
    pub fn is_acceptable(&self) -> bool {
        !matches!(self, ChecksumStatus::Mismatch(_))
    }
}

impl Packet {
    /// Create a packet without a checksum
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            checksum: None,
        }
    }

    /// Create a packet sealed with the checksum of its content
    pub fn with_checksum(content: impl Into<Vec<u8>>, scope: ChecksumScope) -> Self {
        let content = content.into();
        let checksum = Checksum::for_content(&content, scope);
        Self {
            content,
            checksum: Some(checksum),
        }
    }

    /// Create a packet, rejecting content that contains an End-Of-Text
    /// marker
    pub fn try_new(content: impl Into<Vec<u8>>) -> Result<Self, EmbeddedTerminator> {
        let content = content.into();
        check_content(&content)?;
        Ok(Self::new(content))
    }

    /// Create a sealed packet, rejecting content that contains an
    /// End-Of-Text marker
    pub fn try_with_checksum(
        content: impl Into<Vec<u8>>,
        scope: ChecksumScope,
    ) -> Result<Self, EmbeddedTerminator> {
        let content = content.into();
        check_content(&content)?;
        Ok(Self::with_checksum(content, scope))
    }

    /// Command byte (first content byte)
    pub fn command_byte(&self) -> Option<u8> {
        self.content.first().copied()
    }

    /// Compare the carried checksum against the content
    pub fn checksum_status(&self, scope: ChecksumScope) -> ChecksumStatus {
        match self.verify(scope) {
            Ok(()) if self.checksum.is_none() => ChecksumStatus::Absent,
            Ok(()) => ChecksumStatus::Valid,
            Err(mismatch) => ChecksumStatus::Mismatch(mismatch),
        }
    }

    /// Verify the carried checksum, if any
    pub fn verify(&self, scope: ChecksumScope) -> Result<(), ChecksumMismatch> {
        let Some(checksum) = self.checksum else {
            return Ok(());
        };
        let expected = scope.span_sum(&self.content);
        let actual = checksum.value();
        if expected == actual {
            Ok(())
        } else {
            Err(ChecksumMismatch { expected, actual })
        }
    }

    /// Number of bytes this packet occupies on the wire
    pub fn encoded_len(&self) -> usize {
        START_OF_TEXT.len()
            + self.content.len()
            + END_OF_TEXT.len()
            + self.checksum.map_or(0, |_| CHECKSUM_LEN)
    }

    /// Append the wire form of this packet to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(START_OF_TEXT);
        out.extend_from_slice(&self.content);
        out.extend_from_slice(END_OF_TEXT);
        if let Some(checksum) = &self.checksum {
            out.extend_from_slice(checksum.as_bytes());
        }
    }

    /// Wire form of this packet
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }
}

/// Content must not contain End-Of-Text, or the encoded packet ends there
fn check_content(content: &[u8]) -> Result<(), EmbeddedTerminator> {
    match markers::find(content, END_OF_TEXT) {
        Some(offset) => Err(EmbeddedTerminator { offset }),
        None => Ok(()),
    }
}

/// Extract the packet at the start of `bytes`
///
/// Returns `Ok(None)` when `bytes` does not begin with a Start-Of-Text
/// marker, otherwise the packet and the number of bytes it consumed. The
/// checksum is captured but not verified.
pub fn extract_packet(bytes: &[u8]) -> Result<Option<(Packet, usize)>, FrameError> {
    extract_at(bytes, 0)
}

pub(crate) fn extract_at(
    input: &[u8],
    start: usize,
) -> Result<Option<(Packet, usize)>, FrameError> {
    let rest = &input[start..];
    if !rest.starts_with(START_OF_TEXT) {
        return Ok(None);
    }

    let body = &rest[START_OF_TEXT.len()..];
    let end = markers::find(body, END_OF_TEXT)
        .ok_or(FrameError::UnterminatedPacket { offset: start })?;

    let content = body[..end].to_vec();
    let mut consumed = START_OF_TEXT.len() + end + END_OF_TEXT.len();

    let checksum = Checksum::parse(&rest[consumed..]);
    if checksum.is_some() {
        consumed += CHECKSUM_LEN;
    }

    tracing::trace!(
        offset = start,
        len = content.len(),
        checksum = ?checksum.map(|c| c.to_string()),
        "extracted packet"
    );

    Ok(Some((Packet { content, checksum }, consumed)))
}
