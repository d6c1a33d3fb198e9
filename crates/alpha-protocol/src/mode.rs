//! Mode field parsing
//!
//! A mode field is a display-position byte and a mode byte, plus a special
//! identifier byte when the mode is SPECIAL. Its presence in a text packet
//! is inferred: there is no delimiter marking it.

use crate::tables::{DisplayPosition, ModeCode, SpecialIdentifier, Tables};

/// Display position, transition mode and optional animation graphic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModeField {
    pub display_position: DisplayPosition,
    pub mode: ModeCode,
    /// Present exactly when `mode.takes_identifier`
    pub special: Option<SpecialIdentifier>,
}

/// Outcome of probing bytes for a mode field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeMatch {
    /// The bytes do not start with a mode field
    NotPresent,
    /// A mode field occupying `len` bytes
    Found { field: ModeField, len: usize },
    /// Position and mode matched but the required identifier is missing or
    /// unknown; `offset` is relative to the probed bytes
    Invalid { offset: usize, reason: String },
}

impl ModeField {
    /// Probe the start of `bytes` for a mode field
    ///
    /// Both the position and the mode byte must be known for the field to
    /// count as present. A SPECIAL mode then requires a known identifier.
    pub fn probe(bytes: &[u8], tables: &Tables) -> ModeMatch {
        let [position, mode, rest @ ..] = bytes else {
            return ModeMatch::NotPresent;
        };
        let (Some(display_position), Some(mode)) =
            (tables.display_position(*position), tables.mode(*mode))
        else {
            return ModeMatch::NotPresent;
        };

        if !mode.takes_identifier {
            return ModeMatch::Found {
                field: ModeField {
                    display_position: *display_position,
                    mode: *mode,
                    special: None,
                },
                len: 2,
            };
        }

        match rest.first() {
            None => ModeMatch::Invalid {
                offset: 2,
                reason: format!("mode {} requires a special identifier", mode.name),
            },
            Some(&code) => match tables.special_identifier(code) {
                Some(special) => ModeMatch::Found {
                    field: ModeField {
                        display_position: *display_position,
                        mode: *mode,
                        special: Some(*special),
                    },
                    len: 3,
                },
                None => ModeMatch::Invalid {
                    offset: 2,
                    reason: format!("unknown special identifier 0x{code:02X}"),
                },
            },
        }
    }

    /// Number of bytes the field occupies on the wire
    pub fn encoded_len(&self) -> usize {
        if self.special.is_some() {
            3
        } else {
            2
        }
    }

    /// Append the wire form of this field to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.display_position.code);
        out.push(self.mode.code);
        if let Some(special) = &self.special {
            out.push(special.code);
        }
    }
}

impl std::fmt::Display for ModeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.display_position.name, self.mode.name)?;
        if let Some(special) = &self.special {
            write!(f, " / {}", special.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(bytes: &[u8]) -> ModeMatch {
        ModeField::probe(bytes, Tables::builtin())
    }

    #[test]
    fn test_two_byte_mode() {
        let ModeMatch::Found { field, len } = probe(b" bHello") else {
            panic!("expected mode field");
        };
        assert_eq!(len, 2);
        assert_eq!(field.display_position.name, "Middle Line");
        assert_eq!(field.mode.name, "HOLD");
        assert!(field.special.is_none());
        assert_eq!(field.to_string(), "Middle Line / HOLD");
    }

    #[test]
    fn test_special_mode() {
        let ModeMatch::Found { field, len } = probe(b"&nXBoom") else {
            panic!("expected mode field");
        };
        assert_eq!(len, 3);
        assert_eq!(field.special.unwrap().name, "FIREWORKS");

        let mut out = Vec::new();
        field.encode_into(&mut out);
        assert_eq!(out, b"&nX");
        assert_eq!(field.encoded_len(), 3);
    }

    #[test]
    fn test_special_mode_without_identifier() {
        assert!(matches!(
            probe(b" n"),
            ModeMatch::Invalid { offset: 2, .. }
        ));
        assert!(matches!(
            probe(b" n!"),
            ModeMatch::Invalid { offset: 2, .. }
        ));
    }

    #[test]
    fn test_not_present() {
        assert_eq!(probe(b"Hello"), ModeMatch::NotPresent);
        // Known position, unknown mode
        assert_eq!(probe(b"0H"), ModeMatch::NotPresent);
        assert_eq!(probe(b" "), ModeMatch::NotPresent);
        assert_eq!(probe(b""), ModeMatch::NotPresent);
    }
}
