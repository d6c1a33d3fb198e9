//! Frame grammar
//!
//! # Frame Format
//! ```text
//! [00..] ]! <type> <addr addr> [, <type> <addr addr>]* <packet>+ ]$ [00..]
//! ```
//!
//! - `00`: NUL padding, any length
//! - `]!`: Start-Of-Header
//! - `type`: sign type code, one printable byte
//! - `addr`: two bytes, each a decimal digit or `?`
//! - `,`: further type/address pairs for multi-drop addressing
//! - `packet`: `]" ... ]# [cccc]`, see [`crate::packet`]
//! - `]$`: End-Of-Transmission
//!
//! Parsing runs the stages in order without backtracking. Grammar failures
//! abort the frame; bytes after the trailer that are not padding are kept
//! and reported as diagnostics.

use crate::checksum::ChecksumScope;
use crate::command::{Command, CommandRegistry};
use crate::error::{CommandError, Diagnostic, FrameError};
use crate::markers::{
    self, is_printable, ADDRESS_SEPARATOR, ADDRESS_WILDCARD, END_OF_TRANSMISSION, PAD,
    START_OF_HEADER,
};
use crate::packet::{self, ChecksumStatus, Packet};

/// Sign type code and two-character address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Address {
    pub type_code: u8,
    pub address: [u8; 2],
}

impl Address {
    /// Wire length of a type/address pair
    pub const LEN: usize = 3;

    pub fn new(type_code: u8, address: [u8; 2]) -> Self {
        Self { type_code, address }
    }

    /// Parse a type/address pair at the start of `bytes`
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let [type_code, a, b, ..] = *bytes else {
            return None;
        };
        let valid = is_printable(type_code) && is_address_byte(a) && is_address_byte(b);
        valid.then_some(Self::new(type_code, [a, b]))
    }

    /// Whether the address contains a wildcard digit
    pub fn is_wildcard(&self) -> bool {
        self.address.contains(&ADDRESS_WILDCARD)
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.type_code);
        out.extend_from_slice(&self.address);
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}",
            char::from(self.type_code),
            char::from(self.address[0]),
            char::from(self.address[1])
        )
    }
}

fn is_address_byte(b: u8) -> bool {
    b.is_ascii_digit() || b == ADDRESS_WILDCARD
}

/// One parsed frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Frame {
    /// Offset of the frame (including leading padding) in the parsed input
    pub offset: usize,
    /// Number of NUL bytes before the Start-Of-Header marker
    pub leading_pad: usize,
    pub header: Address,
    /// Further addresses chained after the header
    pub repeats: Vec<Address>,
    pub packets: Vec<Packet>,
    /// Bytes after the End-Of-Transmission marker: padding and any garbage
    pub trailing: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A packet of a frame with its checksum status and decoded command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket<'a> {
    /// Offset of the packet's Start-Of-Text marker in the parsed input
    pub offset: usize,
    pub packet: &'a Packet,
    pub checksum: ChecksumStatus,
    pub command: Result<Command, CommandError>,
}

impl Frame {
    /// Frame addressed to `header` carrying `packets`, without padding
    pub fn new(header: Address, packets: Vec<Packet>) -> Self {
        Self {
            offset: 0,
            leading_pad: 0,
            header,
            repeats: Vec::new(),
            packets,
            trailing: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Surround the frame with NUL padding
    pub fn with_padding(mut self, leading: usize, trailing: usize) -> Self {
        self.leading_pad = leading;
        self.trailing = vec![PAD; trailing];
        self
    }

    /// Chain an additional address after the header
    pub fn with_repeat(mut self, address: Address) -> Self {
        self.repeats.push(address);
        self
    }

    /// All addresses the frame is sent to
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        std::iter::once(&self.header).chain(self.repeats.iter())
    }

    /// Offset of each packet's Start-Of-Text marker in the parsed input
    pub fn packet_offsets(&self) -> Vec<usize> {
        let mut pos = self.offset
            + self.leading_pad
            + START_OF_HEADER.len()
            + Address::LEN
            + self.repeats.len() * (1 + Address::LEN);
        self.packets
            .iter()
            .map(|p| {
                let start = pos;
                pos += p.encoded_len();
                start
            })
            .collect()
    }

    /// Number of bytes the frame occupies on the wire
    pub fn encoded_len(&self) -> usize {
        self.leading_pad
            + START_OF_HEADER.len()
            + Address::LEN
            + self.repeats.len() * (1 + Address::LEN)
            + self.packets.iter().map(Packet::encoded_len).sum::<usize>()
            + END_OF_TRANSMISSION.len()
            + self.trailing.len()
    }

    /// Append the wire form of this frame to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.resize(out.len() + self.leading_pad, PAD);
        out.extend_from_slice(START_OF_HEADER);
        self.header.encode_into(out);
        for repeat in &self.repeats {
            out.push(ADDRESS_SEPARATOR);
            repeat.encode_into(out);
        }
        for packet in &self.packets {
            packet.encode_into(out);
        }
        out.extend_from_slice(END_OF_TRANSMISSION);
        out.extend_from_slice(&self.trailing);
    }

    /// Wire form of this frame
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    /// Check checksums and decode the command of every packet
    ///
    /// A packet that fails to decode does not affect its siblings.
    pub fn decode<'a>(
        &'a self,
        registry: &CommandRegistry,
        scope: ChecksumScope,
    ) -> Vec<DecodedPacket<'a>> {
        self.packets
            .iter()
            .zip(self.packet_offsets())
            .map(|(packet, offset)| {
                let checksum = packet.checksum_status(scope);
                if let ChecksumStatus::Mismatch(mismatch) = &checksum {
                    tracing::warn!(offset, %mismatch, "packet checksum mismatch");
                }
                let command = registry.decode_packet(packet);
                if let Err(e) = &command {
                    tracing::debug!(offset, error = %e, "packet command not decoded");
                }
                DecodedPacket {
                    offset,
                    packet,
                    checksum,
                    command,
                }
            })
            .collect()
    }
}

/// Parse one frame from the start of `bytes`
///
/// Every non-NUL byte after the End-Of-Transmission marker is reported as
/// trailing garbage.
pub fn parse_frame(bytes: &[u8]) -> Result<Frame, FrameError> {
    parse_at(bytes, 0, TrailingPolicy::ToEnd).map(|(frame, _)| frame)
}

/// Lazily parse back-to-back frames from `bytes`
///
/// Iteration stops after the first error; the rest of the input is not
/// examined. Cloning the iterator restarts from its current position.
pub fn parse_all_frames(bytes: &[u8]) -> Frames<'_> {
    Frames {
        input: bytes,
        pos: 0,
        done: false,
    }
}

/// Iterator over the frames of an input buffer
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    input: &'a [u8],
    pos: usize,
    done: bool,
}

impl Frames<'_> {
    /// Offset of the next unparsed byte
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for Frames<'_> {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.input.len() {
            return None;
        }

        match parse_at(self.input, self.pos, TrailingPolicy::UntilHeader) {
            Ok((frame, end)) => {
                self.pos = end;
                Some(Ok(frame))
            }
            Err(e) => {
                tracing::debug!(error = %e, "frame stream stopped");
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrailingPolicy {
    /// Everything to the end of input belongs to the frame
    ToEnd,
    /// Stop at the next Start-Of-Header marker
    UntilHeader,
}

/// Byte cursor over the input
struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    fn eat(&mut self, marker: &[u8]) -> bool {
        if self.rest().starts_with(marker) {
            self.pos += marker.len();
            true
        } else {
            false
        }
    }

    fn eat_pad(&mut self) -> usize {
        let n = self.rest().iter().take_while(|&&b| b == PAD).count();
        self.pos += n;
        n
    }

    fn eat_address(&mut self) -> Option<Address> {
        let address = Address::parse(self.rest())?;
        self.pos += Address::LEN;
        Some(address)
    }
}

fn parse_at(
    input: &[u8],
    start: usize,
    policy: TrailingPolicy,
) -> Result<(Frame, usize), FrameError> {
    let mut cur = Cursor { input, pos: start };

    let leading_pad = cur.eat_pad();

    let header_offset = cur.pos;
    if !cur.eat(START_OF_HEADER) {
        return Err(FrameError::MalformedHeader {
            offset: header_offset,
        });
    }
    let header = cur.eat_address().ok_or(FrameError::MalformedHeader {
        offset: header_offset,
    })?;

    let mut repeats = Vec::new();
    while cur.rest().first() == Some(&ADDRESS_SEPARATOR) {
        let Some(address) = Address::parse(&cur.rest()[1..]) else {
            break;
        };
        cur.pos += 1 + Address::LEN;
        repeats.push(address);
    }

    let mut packets = Vec::new();
    while let Some((packet, consumed)) = packet::extract_at(input, cur.pos)? {
        cur.pos += consumed;
        packets.push(packet);
    }
    if packets.is_empty() {
        return Err(FrameError::NoPackets { offset: cur.pos });
    }

    if !cur.eat(END_OF_TRANSMISSION) {
        return Err(FrameError::MissingTrailer { offset: cur.pos });
    }

    let trailing_start = cur.pos;
    let trailing_end = match policy {
        TrailingPolicy::ToEnd => input.len(),
        TrailingPolicy::UntilHeader => markers::find(cur.rest(), START_OF_HEADER)
            .map_or(input.len(), |i| trailing_start + i),
    };
    let trailing = input[trailing_start..trailing_end].to_vec();
    let diagnostics = garbage_spans(&trailing, trailing_start);
    for diagnostic in &diagnostics {
        tracing::warn!(%diagnostic, "ignoring bytes after frame");
    }

    tracing::trace!(
        offset = start,
        header = %header,
        repeats = repeats.len(),
        packets = packets.len(),
        "parsed frame"
    );

    let frame = Frame {
        offset: start,
        leading_pad,
        header,
        repeats,
        packets,
        trailing,
        diagnostics,
    };
    Ok((frame, trailing_end))
}

/// Report each run of non-NUL bytes in `trailing`
fn garbage_spans(trailing: &[u8], base: usize) -> Vec<Diagnostic> {
    let mut spans = Vec::new();
    let mut pos = 0;
    while pos < trailing.len() {
        if trailing[pos] == PAD {
            pos += 1;
            continue;
        }
        let len = trailing[pos..].iter().take_while(|&&b| b != PAD).count();
        spans.push(Diagnostic::TrailingGarbage {
            offset: base + pos,
            bytes: trailing[pos..pos + len].to_vec(),
        });
        pos += len;
    }
    spans
}
