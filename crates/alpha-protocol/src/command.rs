//! Command decoding
//!
//! The first content byte of a packet selects a command. Decoders are plain
//! functions kept in a [`CommandRegistry`] keyed by that byte, so new
//! commands can be added without touching frame or packet parsing.
//!
//! # Write Text File (`A`)
//! ```text
//! A <label> [<position> <mode> [<special>]] <message...>
//! ```
//! The mode field has no delimiter. It is taken to be present when the byte
//! after the label is printable and both the position and mode bytes are
//! known; otherwise those bytes are message text.
//!
//! # Write Special Function (`E`)
//! ```text
//! E <function label> <data...>
//! ```

use std::collections::BTreeMap;

use crate::error::CommandError;
use crate::markers::is_printable;
use crate::mode::{ModeField, ModeMatch};
use crate::packet::Packet;
use crate::tables::{is_valid_file_label, SpecialFunction, Tables};
use crate::text::{self, MessageToken, MessageTokens, Segment};

/// Command byte of Write Text File
pub const WRITE_TEXT_FILE: u8 = b'A';
/// Command byte of Write Special Function
pub const WRITE_SPECIAL_FUNCTION: u8 = b'E';

/// Offset of the first payload byte within packet content
const PAYLOAD_OFFSET: usize = 1;

/// Decoder for the payload of one command (content after the command byte)
///
/// Error offsets are relative to the packet content, so the first payload
/// byte is at offset 1.
pub type DecodeFn = fn(payload: &[u8], tables: &Tables) -> Result<Command, CommandError>;

/// Decoded packet command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Command {
    /// Write text to a file: `A`
    WriteTextFile(WriteTextFileCommand),
    /// Write special function: `E`
    WriteSpecialFunction(SpecialFunctionCommand),
    /// Command with no structured decoding
    Raw { code: u8, payload: Vec<u8> },
}

impl Command {
    /// Command byte
    pub fn code(&self) -> u8 {
        match self {
            Command::WriteTextFile(_) => WRITE_TEXT_FILE,
            Command::WriteSpecialFunction(_) => WRITE_SPECIAL_FUNCTION,
            Command::Raw { code, .. } => *code,
        }
    }

    /// Packet content carrying this command
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::WriteTextFile(cmd) => cmd.encode(),
            Command::WriteSpecialFunction(cmd) => cmd.encode(),
            Command::Raw { code, payload } => {
                let mut out = Vec::with_capacity(1 + payload.len());
                out.push(*code);
                out.extend_from_slice(payload);
                out
            }
        }
    }
}

/// Write Text File command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WriteTextFileCommand {
    pub file_label: u8,
    pub mode: Option<ModeField>,
    /// Raw message bytes, modifiers and escapes included
    pub message: Vec<u8>,
    /// Display tokens scanned from `message`
    pub tokens: Vec<MessageToken>,
}

impl WriteTextFileCommand {
    /// Build a command, scanning `message` with `tables`
    pub fn new(
        file_label: u8,
        mode: Option<ModeField>,
        message: impl Into<Vec<u8>>,
        tables: &Tables,
    ) -> Self {
        let message = message.into();
        let tokens = MessageTokens::new(&message, tables).collect();
        Self {
            file_label,
            mode,
            message,
            tokens,
        }
    }

    /// Rescan the stored message bytes
    pub fn scan<'a>(&'a self, tables: &'a Tables) -> MessageTokens<'a> {
        MessageTokens::new(&self.message, tables)
    }

    /// Message as readable text, modifiers in brackets
    pub fn text(&self) -> String {
        text::render(self.tokens.iter().copied())
    }

    /// Split the message at inline mode changes
    pub fn segments(&self, tables: &Tables) -> Vec<Segment> {
        text::split_segments(&self.message, self.mode, tables)
    }

    /// Packet content carrying this command
    ///
    /// A message without a mode field whose first bytes look like one does
    /// not decode back to the same command.
    pub fn encode(&self) -> Vec<u8> {
        let mode_len = self.mode.map_or(0, |m| m.encoded_len());
        let mut out = Vec::with_capacity(2 + mode_len + self.message.len());
        out.push(WRITE_TEXT_FILE);
        out.push(self.file_label);
        if let Some(mode) = &self.mode {
            mode.encode_into(&mut out);
        }
        out.extend_from_slice(&self.message);
        out
    }
}

/// Write Special Function command
///
/// Only the function is identified; its data is carried as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpecialFunctionCommand {
    pub label: u8,
    /// `None` when the label is not in the special-function table
    pub function: Option<SpecialFunction>,
    pub data: Vec<u8>,
}

impl SpecialFunctionCommand {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.data.len());
        out.push(WRITE_SPECIAL_FUNCTION);
        out.push(self.label);
        out.extend_from_slice(&self.data);
        out
    }
}

/// Decode a Write Text File payload
pub fn decode_write_text_file(payload: &[u8], tables: &Tables) -> Result<Command, CommandError> {
    if payload.len() < 2 {
        return Err(CommandError::InsufficientData {
            offset: PAYLOAD_OFFSET + payload.len(),
            needed: 2 - payload.len(),
        });
    }

    let file_label = payload[0];
    if !is_valid_file_label(file_label) {
        return Err(CommandError::InvalidFileLabel {
            offset: PAYLOAD_OFFSET,
            label: file_label,
        });
    }

    let rest = &payload[1..];
    let rest_offset = PAYLOAD_OFFSET + 1;
    let (mode, message) = match rest.first() {
        Some(&b) if is_printable(b) => match ModeField::probe(rest, tables) {
            ModeMatch::Found { field, len } => (Some(field), &rest[len..]),
            ModeMatch::NotPresent => {
                tracing::debug!(
                    label = file_label,
                    "no mode field, treating bytes after label as message"
                );
                (None, rest)
            }
            ModeMatch::Invalid { offset, reason } => {
                return Err(CommandError::InvalidModeField {
                    offset: rest_offset + offset,
                    reason,
                });
            }
        },
        _ => (None, rest),
    };

    Ok(Command::WriteTextFile(WriteTextFileCommand::new(
        file_label, mode, message, tables,
    )))
}

/// Decode a Write Special Function payload
pub fn decode_write_special_function(
    payload: &[u8],
    tables: &Tables,
) -> Result<Command, CommandError> {
    let Some((&label, data)) = payload.split_first() else {
        return Err(CommandError::InsufficientData {
            offset: PAYLOAD_OFFSET,
            needed: 1,
        });
    };

    let function = tables.special_function(label).copied();
    if function.is_none() {
        tracing::debug!(label, "special function label not in table");
    }

    Ok(Command::WriteSpecialFunction(SpecialFunctionCommand {
        label,
        function,
        data: data.to_vec(),
    }))
}

#[derive(Debug, Clone, Copy)]
struct RegisteredCommand {
    name: &'static str,
    decode: DecodeFn,
}

/// Command decoders keyed by command byte, with the tables they use
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    decoders: BTreeMap<u8, RegisteredCommand>,
    tables: Tables,
}

impl CommandRegistry {
    /// Registry with the built-in commands and tables
    pub fn new() -> Self {
        let mut registry = Self::with_tables(Tables::default());
        registry.register(WRITE_TEXT_FILE, "Write Text File", decode_write_text_file);
        registry.register(
            WRITE_SPECIAL_FUNCTION,
            "Write Special Function",
            decode_write_special_function,
        );
        registry
    }

    /// Registry with no commands
    pub fn with_tables(tables: Tables) -> Self {
        Self {
            decoders: BTreeMap::new(),
            tables,
        }
    }

    /// Register a decoder, returning true if it replaced an existing one
    pub fn register(&mut self, code: u8, name: &'static str, decode: DecodeFn) -> bool {
        self.decoders
            .insert(code, RegisteredCommand { name, decode })
            .is_some()
    }

    /// Name of the command registered for `code`
    pub fn name(&self, code: u8) -> Option<&'static str> {
        self.decoders.get(&code).map(|c| c.name)
    }

    /// Registered command bytes in ascending order
    pub fn codes(&self) -> impl Iterator<Item = u8> + '_ {
        self.decoders.keys().copied()
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }

    /// Decode packet content
    pub fn decode(&self, content: &[u8]) -> Result<Command, CommandError> {
        let Some((&code, payload)) = content.split_first() else {
            return Err(CommandError::InsufficientData {
                offset: 0,
                needed: 1,
            });
        };

        let command = self
            .decoders
            .get(&code)
            .ok_or(CommandError::UnknownCommand { code })?;
        (command.decode)(payload, &self.tables)
    }

    /// Decode the content of `packet`
    pub fn decode_packet(&self, packet: &Packet) -> Result<Command, CommandError> {
        self.decode(&packet.content)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
