//! Message body scanning
//!
//! Message bytes are literal characters interleaved with two-byte modifier
//! escapes. An Escape marker followed by a mode field starts a new display
//! segment within the same message.

use crate::markers::ESCAPE;
use crate::mode::{ModeField, ModeMatch};
use crate::tables::{ModifierEscape, Tables};

/// One display token of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MessageToken {
    /// Literal character
    Char(u8),
    /// Rendering attribute toggle
    Modifier(ModifierEscape),
}

impl std::fmt::Display for MessageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageToken::Char(b) if b.is_ascii_graphic() || *b == b' ' => {
                write!(f, "{}", char::from(*b))
            }
            MessageToken::Char(b) => write!(f, "\\x{b:02X}"),
            MessageToken::Modifier(m) => write!(f, "[{}]", m.name),
        }
    }
}

/// Lazy left-to-right scan of message bytes into tokens
#[derive(Debug, Clone)]
pub struct MessageTokens<'a> {
    bytes: &'a [u8],
    pos: usize,
    tables: &'a Tables,
}

impl<'a> MessageTokens<'a> {
    pub fn new(bytes: &'a [u8], tables: &'a Tables) -> Self {
        Self {
            bytes,
            pos: 0,
            tables,
        }
    }
}

impl Iterator for MessageTokens<'_> {
    type Item = MessageToken;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.bytes.get(self.pos..).filter(|r| !r.is_empty())?;

        if let Some(modifier) = self.tables.modifier(rest) {
            self.pos += 2;
            return Some(MessageToken::Modifier(*modifier));
        }

        self.pos += 1;
        Some(MessageToken::Char(rest[0]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bytes.len().saturating_sub(self.pos);
        (remaining.div_ceil(2), Some(remaining))
    }
}

/// Render tokens as readable text, modifiers shown in brackets
pub fn render(tokens: impl IntoIterator<Item = MessageToken>) -> String {
    tokens.into_iter().map(|t| t.to_string()).collect()
}

/// Run of message text shown with one mode
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Segment {
    /// Mode introduced by an Escape marker, or the packet's leading mode
    pub mode: Option<ModeField>,
    pub text: Vec<u8>,
}

impl Segment {
    pub fn tokens<'a>(&'a self, tables: &'a Tables) -> MessageTokens<'a> {
        MessageTokens::new(&self.text, tables)
    }
}

/// Split `message` at every Escape marker followed by a valid mode field
///
/// The first segment carries `leading`. Escape markers not followed by a
/// valid mode field stay in the text.
pub fn split_segments(message: &[u8], leading: Option<ModeField>, tables: &Tables) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = Segment {
        mode: leading,
        text: Vec::new(),
    };

    let mut pos = 0;
    while pos < message.len() {
        let rest = &message[pos..];
        if rest.starts_with(ESCAPE) {
            if let ModeMatch::Found { field, len } =
                ModeField::probe(&rest[ESCAPE.len()..], tables)
            {
                let next = Segment {
                    mode: Some(field),
                    text: Vec::new(),
                };
                segments.push(std::mem::replace(&mut current, next));
                pos += ESCAPE.len() + len;
                continue;
            }
        }
        current.text.push(rest[0]);
        pos += 1;
    }

    segments.push(current);
    segments
}
