//! Subcommand implementations

use std::io::Write as _;
use std::path::Path;

use alpha_protocol::tables::is_valid_file_label;
use alpha_protocol::{
    Address, Checksum, ChecksumScope, CommandRegistry, Frame, ModeField, Packet, PayloadRewriter,
    Tables, WriteTextFileCommand,
};
use anyhow::{bail, Context, Result};

use crate::cli::{ChecksumArgs, ComposeArgs, InspectArgs, OutputFormat, StripArgs};
use crate::report::StreamReport;
use crate::settings::Settings;

fn read_capture(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

pub fn inspect(args: &InspectArgs, format: OutputFormat, scope: ChecksumScope) -> Result<()> {
    let bytes = read_capture(&args.file)?;
    let report = StreamReport::build(&bytes, &CommandRegistry::new(), scope);

    if let Some(error) = &report.error {
        tracing::warn!(offset = error.offset, "{}", error.message);
    }

    match format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

pub fn strip(args: &StripArgs, settings: &Settings, scope: ChecksumScope) -> Result<()> {
    let targets = if args.target.is_empty() {
        &settings.strip_targets
    } else {
        &args.target
    };
    if targets.is_empty() {
        bail!("nothing to strip: pass --target or set strip_targets in the settings file");
    }

    let mut bytes = read_capture(&args.file)?;
    let mut rewritten = 0;
    for target in targets {
        let outcome = PayloadRewriter::new(target.as_bytes())
            .with_scope(scope)
            .rewrite_stream(&bytes)
            .with_context(|| format!("{} is not a valid capture", args.file.display()))?;
        tracing::debug!(target = %target, packets = outcome.packets_rewritten, "stripped target");
        rewritten += outcome.packets_rewritten;
        bytes = outcome.bytes;
    }

    if rewritten == 0 {
        tracing::info!("no packet contained a target, leaving file untouched");
        return Ok(());
    }

    let output = args.output.as_deref().unwrap_or(&args.file);
    write_bytes(output, &bytes)?;
    tracing::info!(packets = rewritten, output = %output.display(), "stripped capture");
    Ok(())
}

pub fn compose(args: &ComposeArgs, settings: &Settings, scope: ChecksumScope) -> Result<()> {
    let padding = args.padding.unwrap_or(settings.wake_up_padding);
    let frame = build_frame(args, padding, scope, Tables::builtin())?;
    let bytes = frame.encode();

    match &args.output {
        Some(path) => write_bytes(path, &bytes)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).context("failed to write frame")?;
            stdout.flush()?;
        }
    }
    tracing::info!(bytes = bytes.len(), "composed frame");
    Ok(())
}

pub fn checksum(args: &ChecksumArgs, format: OutputFormat, scope: ChecksumScope) -> Result<()> {
    let sum = Checksum::for_content(args.text.as_bytes(), scope);
    match format {
        OutputFormat::Text => println!("{sum}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "checksum": sum.to_string(), "value": sum.value(), "scope": scope })
        ),
    }
    Ok(())
}

/// Build the Write Text File frame described by `args`
pub fn build_frame(
    args: &ComposeArgs,
    padding: usize,
    scope: ChecksumScope,
    tables: &Tables,
) -> Result<Frame> {
    let label = ascii_byte(args.label, "file label")?;
    if !is_valid_file_label(label) {
        bail!("'{}' cannot be used as a file label", args.label);
    }

    let type_code = ascii_byte(args.type_code, "type code")?;
    let mut header = vec![type_code];
    header.extend_from_slice(args.address.as_bytes());
    let address = match Address::parse(&header) {
        Some(address) if header.len() == Address::LEN => address,
        _ => bail!("invalid sign address '{}'", args.address),
    };

    let mode = mode_field(args, tables)?;
    let command = WriteTextFileCommand::new(label, mode, args.text.as_bytes(), tables);
    let packet = Packet::try_with_checksum(command.encode(), scope)
        .context("message text cannot be sent in one packet")?;

    Ok(Frame::new(address, vec![packet]).with_padding(padding, 0))
}

fn mode_field(args: &ComposeArgs, tables: &Tables) -> Result<Option<ModeField>> {
    let Some(position) = &args.position else {
        return Ok(None);
    };
    let display_position = lookup(
        position,
        |name| {
            tables
                .display_position_by_name(name)
                .or_else(|| tables.display_position_by_name(&format!("{name} line")))
        },
        |code| tables.display_position(code),
    )
    .with_context(|| format!("unknown display position '{position}'"))?;

    let Some(mode) = &args.mode else {
        bail!("--position requires --mode");
    };
    let mode = lookup(mode, |name| tables.mode_by_name(name), |code| tables.mode(code))
        .with_context(|| format!("unknown mode '{mode}'"))?;

    let special = match (&args.special, mode.takes_identifier) {
        (Some(special), true) => Some(
            lookup(
                special,
                |name| tables.special_identifier_by_name(name),
                |code| tables.special_identifier(code),
            )
            .with_context(|| format!("unknown special graphic '{special}'"))?,
        ),
        (None, true) => bail!("mode {} requires --special", mode.name),
        (Some(_), false) => bail!("mode {} does not take a special graphic", mode.name),
        (None, false) => None,
    };

    Ok(Some(ModeField {
        display_position: *display_position,
        mode: *mode,
        special: special.copied(),
    }))
}

/// Resolve a table entry by name, or by its code when given one character
fn lookup<'t, T>(
    arg: &str,
    by_name: impl Fn(&str) -> Option<&'t T>,
    by_code: impl Fn(u8) -> Option<&'t T>,
) -> Option<&'t T> {
    by_name(arg).or_else(|| match arg.as_bytes() {
        [code] => by_code(*code),
        _ => None,
    })
}

fn ascii_byte(c: char, what: &str) -> Result<u8> {
    match u8::try_from(c) {
        Ok(b) if (0x20..=0x7E).contains(&b) => Ok(b),
        _ => bail!("{what} must be a printable ASCII character, got '{c}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alpha_protocol::{parse_frame, Command};

    fn args(label: char, position: Option<&str>, mode: Option<&str>, special: Option<&str>) -> ComposeArgs {
        ComposeArgs {
            label,
            position: position.map(str::to_string),
            mode: mode.map(str::to_string),
            special: special.map(str::to_string),
            type_code: 'Z',
            address: "00".to_string(),
            padding: None,
            output: None,
            text: "HELLO".to_string(),
        }
    }

    fn build(args: &ComposeArgs) -> Result<Frame> {
        build_frame(args, 5, ChecksumScope::Content, Tables::builtin())
    }

    #[test]
    fn test_compose_plain() {
        let frame = build(&args('A', None, None, None)).unwrap();
        let encoded = frame.encode();
        assert!(encoded.starts_with(b"\0\0\0\0\0]!Z00]\"AAHELLO]#"));

        let parsed = parse_frame(&encoded).unwrap();
        assert!(parsed.packets[0].verify(ChecksumScope::Content).is_ok());
    }

    #[test]
    fn test_compose_with_mode() {
        let frame = build(&args('A', Some("middle"), Some("hold"), None)).unwrap();
        assert_eq!(frame.packets[0].content, b"AA bHELLO");

        let frame = build(&args('B', Some("&"), Some("special"), Some("fireworks"))).unwrap();
        assert_eq!(frame.packets[0].content, b"AB&nXHELLO");

        let Ok(Command::WriteTextFile(cmd)) =
            CommandRegistry::new().decode_packet(&frame.packets[0])
        else {
            panic!("expected write text file");
        };
        assert_eq!(cmd.mode.unwrap().special.unwrap().name, "FIREWORKS");
        assert_eq!(cmd.message, b"HELLO");
    }

    #[test]
    fn test_compose_rejects_bad_input() {
        assert!(build(&args('0', None, None, None)).is_err());
        assert!(build(&args('é', None, None, None)).is_err());
        assert!(build(&args('A', Some("sideways"), Some("hold"), None)).is_err());
        assert!(build(&args('A', Some("fill"), Some("special"), None)).is_err());
        assert!(build(&args('A', Some("fill"), Some("hold"), Some("fireworks"))).is_err());

        let mut bad_address = args('A', None, None, None);
        bad_address.address = "0A".to_string();
        assert!(build(&bad_address).is_err());
        bad_address.address = "000".to_string();
        assert!(build(&bad_address).is_err());
    }

    #[test]
    fn test_compose_rejects_end_of_text_in_message() {
        let mut message = args('A', None, None, None);
        message.text = "a]#b".to_string();
        let err = build(&message).unwrap_err();
        assert!(format!("{err:#}").contains("End-Of-Text marker at offset 3"));

        message.text = "a]b#".to_string();
        let frame = build(&message).unwrap();
        let parsed = parse_frame(&frame.encode()).unwrap();
        assert_eq!(parsed.packets[0].content, b"AAa]b#");
    }
}
