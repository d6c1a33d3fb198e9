//! Command line interface for alphasign.

use std::path::PathBuf;

use alpha_protocol::ChecksumScope;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// alphasign - Alpha LED sign protocol tool
#[derive(Parser, Debug)]
#[command(
    name = "alphasign",
    author,
    version,
    about = "Inspect, strip and compose Alpha LED sign protocol captures",
    long_about = r#"
alphasign works on raw byte captures of the Alpha sign serial protocol:

  - Inspect frames, packets, checksums and decoded commands
  - Strip boilerplate messages and repair the packet checksums
  - Compose a padded Write Text File frame ready to send
  - Compute checksums by hand

EXAMPLES:
  alphasign inspect capture.bin
  alphasign strip capture.bin --target "Thank You" --output clean.bin
  alphasign compose --label A --position middle --mode hold "HELLO" > hello.bin
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter (overrides the settings file, e.g. "alphasign=debug")
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Bytes covered by packet checksums (overrides the settings file)
    #[arg(long, global = true)]
    pub scope: Option<ScopeArg>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the frames, packets and commands of a capture
    Inspect(InspectArgs),

    /// Remove boilerplate text from every packet and fix checksums
    Strip(StripArgs),

    /// Build a Write Text File frame
    Compose(ComposeArgs),

    /// Compute the checksum of some packet content
    Checksum(ChecksumArgs),
}

/// Inspect command arguments
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Capture file
    pub file: PathBuf,
}

/// Strip command arguments
#[derive(Args, Debug)]
pub struct StripArgs {
    /// Capture file
    pub file: PathBuf,

    /// Text to remove (can be specified multiple times; defaults to the
    /// settings file's strip targets)
    #[arg(short, long)]
    pub target: Vec<String>,

    /// Write the result here instead of replacing the input file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Compose command arguments
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// File label (one printable character, not '0' or '?')
    #[arg(short = 'L', long)]
    pub label: char,

    /// Display position, by name or code (e.g. "middle", "fill")
    #[arg(short, long)]
    pub position: Option<String>,

    /// Mode, by name or code (e.g. "hold", "rotate", "special")
    #[arg(short, long, requires = "position")]
    pub mode: Option<String>,

    /// Special graphic for the SPECIAL mode (e.g. "fireworks")
    #[arg(short, long, requires = "mode")]
    pub special: Option<String>,

    /// Sign type code
    #[arg(long, default_value = "Z")]
    pub type_code: char,

    /// Sign address (two digits or '?' wildcards)
    #[arg(short, long, default_value = "00")]
    pub address: String,

    /// Leading NUL bytes (defaults to the settings file's wake-up padding)
    #[arg(long)]
    pub padding: Option<usize>,

    /// Write the frame here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Message text
    pub text: String,
}

/// Checksum command arguments
#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// Packet content (between the Start-Of-Text and End-Of-Text markers)
    pub text: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeArg {
    /// Packet content only
    Content,
    /// Packet content plus the STX and ETX control codes
    Transmission,
}

impl From<ScopeArg> for ChecksumScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Content => ChecksumScope::Content,
            ScopeArg::Transmission => ChecksumScope::Transmission,
        }
    }
}
