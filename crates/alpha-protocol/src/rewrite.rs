//! Payload rewriting
//!
//! Removes a target byte string from packet content and reseals the packet
//! with a fresh checksum, then re-encodes frames through the same grammar.

use crate::checksum::ChecksumScope;
use crate::error::FrameError;
use crate::frame::{parse_all_frames, Frame};
use crate::markers;
use crate::packet::Packet;

/// Result of rewriting a byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Re-encoded stream
    pub bytes: Vec<u8>,
    /// Frames parsed from the input
    pub frames: usize,
    /// Packets whose content changed
    pub packets_rewritten: usize,
}

/// Removes every occurrence of a target from packet content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadRewriter {
    target: Vec<u8>,
    scope: ChecksumScope,
}

impl PayloadRewriter {
    /// Rewriter for `target`, resealing with [`ChecksumScope::Content`]
    pub fn new(target: impl Into<Vec<u8>>) -> Self {
        Self {
            target: target.into(),
            scope: ChecksumScope::default(),
        }
    }

    /// Use `scope` for recomputed checksums
    pub fn with_scope(mut self, scope: ChecksumScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn target(&self) -> &[u8] {
        &self.target
    }

    pub fn scope(&self) -> ChecksumScope {
        self.scope
    }

    /// Whether `content` contains the target
    pub fn matches(&self, content: &[u8]) -> bool {
        markers::find(content, &self.target).is_some()
    }

    /// Remove the target from `packet`
    ///
    /// A packet without the target is returned as-is, original checksum
    /// included. Otherwise the target is removed until none is left and the
    /// packet is sealed with a checksum of the new content. If the removal
    /// would join the surrounding bytes into an End-Of-Text marker the
    /// packet is also returned as-is.
    pub fn rewrite_packet(&self, packet: &Packet) -> Packet {
        if !self.matches(&packet.content) {
            return packet.clone();
        }

        let content = remove_all(&packet.content, &self.target);
        let removed = packet.content.len() - content.len();
        match Packet::try_with_checksum(content, self.scope) {
            Ok(rewritten) => {
                tracing::debug!(
                    removed,
                    old = ?packet.checksum.map(|c| c.to_string()),
                    new = ?rewritten.checksum.map(|c| c.to_string()),
                    "rewrote packet"
                );
                rewritten
            }
            Err(e) => {
                tracing::warn!(error = %e, "removal would end the packet early, keeping it unchanged");
                packet.clone()
            }
        }
    }

    /// Rewrite every packet of `frame`, returning the frame and the number
    /// of packets changed
    pub fn rewrite_frame(&self, frame: &Frame) -> (Frame, usize) {
        let mut changed = 0;
        let packets = frame
            .packets
            .iter()
            .map(|packet| {
                let rewritten = self.rewrite_packet(packet);
                if rewritten != *packet {
                    changed += 1;
                }
                rewritten
            })
            .collect();
        (
            Frame {
                packets,
                ..frame.clone()
            },
            changed,
        )
    }

    /// Parse `bytes` as back-to-back frames, rewrite them and re-encode
    pub fn rewrite_stream(&self, bytes: &[u8]) -> Result<RewriteOutcome, FrameError> {
        let mut out = Vec::with_capacity(bytes.len());
        let mut frames = 0;
        let mut packets_rewritten = 0;

        for frame in parse_all_frames(bytes) {
            let (frame, changed) = self.rewrite_frame(&frame?);
            frame.encode_into(&mut out);
            frames += 1;
            packets_rewritten += changed;
        }

        tracing::info!(frames, packets_rewritten, "rewrote stream");
        Ok(RewriteOutcome {
            bytes: out,
            frames,
            packets_rewritten,
        })
    }
}

/// Remove `needle` from `haystack` until it no longer occurs
///
/// A removal can join the bytes around it into a new occurrence, so passes
/// repeat until none is found. An empty needle removes nothing.
pub fn remove_all(haystack: &[u8], needle: &[u8]) -> Vec<u8> {
    let mut current = haystack.to_vec();
    if needle.is_empty() {
        return current;
    }

    while markers::find(&current, needle).is_some() {
        let mut next = Vec::with_capacity(current.len());
        let mut pos = 0;
        while let Some(i) = markers::find(&current[pos..], needle) {
            next.extend_from_slice(&current[pos..pos + i]);
            pos += i + needle.len();
        }
        next.extend_from_slice(&current[pos..]);
        current = next;
    }
    current
}
