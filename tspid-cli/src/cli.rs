use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "List the distinct packet identifiers (PIDs) found in an MPEG-TS stream",
    long_about = "Reads an MPEG transport stream from a file or stdin, aligns on the 188-byte\n\
                  packet boundaries and prints every distinct PID in ascending order.\n\
                  \n\
                  A stream ending in the middle of a packet is accepted unless --strict is given."
)]
pub struct CliArgs {
    /// Input file, or `-` for stdin
    #[arg(help = "Path to a transport stream file. Reads stdin when omitted or `-`")]
    pub input: Option<PathBuf>,

    /// Number of packets decoded per batch
    #[arg(
        short,
        long,
        default_value = "1000",
        help = "Number of packets decoded per batch (at least 3)"
    )]
    pub batch_size: usize,

    /// Fail on truncated streams
    #[arg(long, help = "Treat a stream ending in the middle of a packet as an error")]
    pub strict: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Hex)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One `0x%04x` PID per line
    #[default]
    Hex,
    /// JSON report with PIDs and stream counters
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Hex => write!(f, "hex"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
