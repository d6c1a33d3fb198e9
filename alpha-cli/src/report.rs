//! Inspection reports
//!
//! A report is built once from a capture and rendered either as text for a
//! terminal (`Display`) or as JSON.

use std::fmt;

use alpha_protocol::text::render;
use alpha_protocol::{
    parse_all_frames, ChecksumScope, ChecksumStatus, Command, CommandRegistry, Diagnostic, Frame,
    MessageToken,
};
use serde::Serialize;

/// Everything found in a capture
#[derive(Debug, Serialize)]
pub struct StreamReport {
    pub scope: ChecksumScope,
    pub frames: Vec<FrameReport>,
    /// Grammar error that stopped parsing, if any
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Serialize)]
pub struct FrameReport {
    pub offset: usize,
    pub leading_pad: usize,
    pub addresses: Vec<String>,
    pub packets: Vec<PacketReport>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
pub struct PacketReport {
    pub offset: usize,
    /// Content with non-printable bytes escaped
    pub content: String,
    pub checksum: Option<String>,
    pub checksum_status: ChecksumStatus,
    pub command: Option<Command>,
    pub command_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub offset: usize,
    pub message: String,
}

impl StreamReport {
    /// Parse and decode every frame of `bytes`
    pub fn build(bytes: &[u8], registry: &CommandRegistry, scope: ChecksumScope) -> Self {
        let mut frames = Vec::new();
        let mut error = None;

        for result in parse_all_frames(bytes) {
            match result {
                Ok(frame) => frames.push(FrameReport::build(&frame, registry, scope)),
                Err(e) => {
                    error = Some(ErrorReport {
                        offset: e.offset(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Self {
            scope,
            frames,
            error,
        }
    }

    /// Count of packets whose checksum is present and wrong
    pub fn mismatches(&self) -> usize {
        self.frames
            .iter()
            .flat_map(|f| &f.packets)
            .filter(|p| !p.checksum_status.is_acceptable())
            .count()
    }
}

impl fmt::Display for StreamReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            writeln!(
                f,
                "Frame {} @{} to {} ({} NUL pad)",
                i + 1,
                frame.offset,
                frame.addresses.join(", "),
                frame.leading_pad
            )?;
            for packet in &frame.packets {
                write!(f, "{packet}")?;
            }
            for diagnostic in &frame.diagnostics {
                writeln!(f, "  ! {diagnostic}")?;
            }
        }
        if let Some(error) = &self.error {
            writeln!(f, "Stopped: {}", error.message)?;
        }
        writeln!(
            f,
            "{} frame(s), {} checksum mismatch(es)",
            self.frames.len(),
            self.mismatches()
        )
    }
}

impl FrameReport {
    fn build(frame: &Frame, registry: &CommandRegistry, scope: ChecksumScope) -> Self {
        let packets = frame
            .decode(registry, scope)
            .into_iter()
            .map(|decoded| {
                let (command, command_error) = match decoded.command {
                    Ok(command) => (Some(command), None),
                    Err(e) => (None, Some(e.to_string())),
                };
                PacketReport {
                    offset: decoded.offset,
                    content: escape(&decoded.packet.content),
                    checksum: decoded.packet.checksum.map(|c| c.to_string()),
                    checksum_status: decoded.checksum,
                    command,
                    command_error,
                }
            })
            .collect();

        Self {
            offset: frame.offset,
            leading_pad: frame.leading_pad,
            addresses: frame.addresses().map(|a| a.to_string()).collect(),
            packets,
            diagnostics: frame.diagnostics.clone(),
        }
    }
}

impl fmt::Display for PacketReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.checksum_status {
            ChecksumStatus::Absent => "no checksum".to_string(),
            ChecksumStatus::Valid => format!("checksum {} ok", self.checksum.as_deref().unwrap_or("")),
            ChecksumStatus::Mismatch(m) => m.to_string(),
        };
        writeln!(f, "  Packet @{} [{}]", self.offset, status)?;

        match (&self.command, &self.command_error) {
            (Some(Command::WriteTextFile(cmd)), _) => {
                let mode = cmd.mode.map_or("no mode".to_string(), |m| m.to_string());
                writeln!(
                    f,
                    "    Write Text File '{}' ({}): {}",
                    char::from(cmd.file_label),
                    mode,
                    cmd.text()
                )
            }
            (Some(Command::WriteSpecialFunction(cmd)), _) => {
                let name = cmd.function.map_or("unknown function", |func| func.name);
                writeln!(
                    f,
                    "    Write Special Function '{}' ({}): {}",
                    char::from(cmd.label),
                    name,
                    escape(&cmd.data)
                )
            }
            (Some(Command::Raw { code, payload }), _) => {
                writeln!(f, "    Command 0x{code:02X}: {}", escape(payload))
            }
            (None, Some(error)) => writeln!(f, "    {error}: {}", self.content),
            (None, None) => Ok(()),
        }
    }
}

/// Printable bytes as-is, others as `\xNN`
pub fn escape(bytes: &[u8]) -> String {
    render(bytes.iter().map(|&b| MessageToken::Char(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_text() {
        let input = b"\0\0]!Z00]\"A1Hello]#]\"\x99x]#]$";
        let report = StreamReport::build(input, &CommandRegistry::new(), ChecksumScope::Content);
        assert_eq!(report.frames.len(), 1);
        assert!(report.error.is_none());

        let text = report.to_string();
        assert!(text.contains("Frame 1 @0 to Z00 (2 NUL pad)"));
        assert!(text.contains("Write Text File '1' (no mode): Hello"));
        assert!(text.contains("unknown command 0x99: \\x99x"));
        assert!(text.ends_with("1 frame(s), 0 checksum mismatch(es)\n"));
    }

    #[test]
    fn test_report_counts_mismatches() {
        let input = b"]!Z00]\"E2!A1]#010F]$";
        let content = StreamReport::build(input, &CommandRegistry::new(), ChecksumScope::Content);
        assert_eq!(content.mismatches(), 1);
        let transmission =
            StreamReport::build(input, &CommandRegistry::new(), ChecksumScope::Transmission);
        assert_eq!(transmission.mismatches(), 0);
    }

    #[test]
    fn test_report_stops_at_error() {
        let input = b"]!Z00]\"A1ok]#]$]!Z00";
        let report = StreamReport::build(input, &CommandRegistry::new(), ChecksumScope::Content);
        assert_eq!(report.frames.len(), 1);
        assert_eq!(report.error.as_ref().unwrap().offset, 20);
    }

    #[test]
    fn test_report_json() {
        let report = StreamReport::build(
            b"]!Z00]\"A1Hi]#]$",
            &CommandRegistry::new(),
            ChecksumScope::Content,
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scope"], "content");
        assert_eq!(json["frames"][0]["addresses"][0], "Z00");
        assert_eq!(json["frames"][0]["packets"][0]["content"], "A1Hi");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(b"a\x05b"), "a\\x05b");
    }
}
