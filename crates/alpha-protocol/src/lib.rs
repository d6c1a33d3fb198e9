//! Alpha Sign Protocol Library
//!
//! This crate provides parsing and encoding for the serial protocol spoken
//! by Alpha LED message-sign controllers: a framed, checksummed, mostly
//! printable-ASCII protocol.
//!
//! - **Frames**: padding, Start-Of-Header, sign type and address, packets,
//!   End-Of-Transmission
//! - **Packets**: Start-Of-Text, command content, End-Of-Text, optional
//!   4-digit hex checksum
//! - **Commands**: Write Text File (`A`) with mode fields and modifier
//!   escapes, Write Special Function (`E`), plus caller-registered decoders
//!
//! # Architecture
//!
//! Each layer is independent:
//! - [`frame`] walks the frame grammar and collects packets
//! - [`packet`] delimits packets and checks their checksums
//! - [`command`] dispatches packet content to decoders by command byte
//! - [`rewrite`] edits packet content and reseals the checksum
//!
//! Lookup tables ([`Tables`]) and decoders ([`CommandRegistry`]) are open
//! registries. Grammar errors abort a frame; command errors stay scoped to
//! one packet; checksum mismatches are only reported.
//!
//! The control codes are carried as printable two-byte markers:
//! `]!` SOH, `]"` STX, `]#` ETX, `]$` EOT, `];` ESC.
//!
//! # Example
//!
//! ```rust
//! use alpha_protocol::{parse_frame, ChecksumScope, Command, CommandRegistry};
//!
//! let frame = parse_frame(b"]!Z00]\"A1Hello]#]$").unwrap();
//! let registry = CommandRegistry::new();
//!
//! let decoded = frame.decode(&registry, ChecksumScope::Content);
//! match &decoded[0].command {
//!     Ok(Command::WriteTextFile(cmd)) => {
//!         assert_eq!(cmd.file_label, b'1');
//!         assert_eq!(cmd.text(), "Hello");
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod checksum;
pub mod command;
pub mod error;
pub mod frame;
pub mod markers;
pub mod mode;
pub mod packet;
pub mod rewrite;
pub mod tables;
pub mod text;

pub use checksum::{Checksum, ChecksumScope};
pub use command::{
    Command, CommandRegistry, DecodeFn, SpecialFunctionCommand, WriteTextFileCommand,
};
pub use error::{
    ChecksumMismatch, CommandError, Diagnostic, EmbeddedTerminator, FrameError, ProtocolError,
};
pub use frame::{parse_all_frames, parse_frame, Address, DecodedPacket, Frame, Frames};
pub use mode::{ModeField, ModeMatch};
pub use packet::{extract_packet, ChecksumStatus, Packet};
pub use rewrite::{PayloadRewriter, RewriteOutcome};
pub use tables::{
    DisplayPosition, ModeCode, ModifierEscape, SpecialFunction, SpecialIdentifier, Tables,
};
pub use text::{MessageToken, MessageTokens, Segment};
