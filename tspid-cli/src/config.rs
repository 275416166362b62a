use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::PathBuf,
};

use ts_packet::MIN_BATCH_SIZE;

use crate::{
    cli::{CliArgs, OutputFormat},
    error::{AppError, Result},
};

/// Where the transport stream is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// Open the source behind a buffered reader
    pub fn open(&self) -> Result<Box<dyn Read>> {
        match self {
            InputSource::Stdin => Ok(Box::new(BufReader::new(io::stdin().lock()))),
            InputSource::File(path) => {
                let file = File::open(path)?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSource::Stdin => write!(f, "<stdin>"),
            InputSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Configuration for the entire program
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    pub input: InputSource,

    /// Number of packet slots handed to the reader per batch
    pub batch_size: usize,

    /// Whether a stream ending inside a packet is an error
    pub strict: bool,

    pub format: OutputFormat,
}

impl TryFrom<&CliArgs> for ProgramConfig {
    type Error = AppError;

    fn try_from(args: &CliArgs) -> Result<Self> {
        if args.batch_size < MIN_BATCH_SIZE {
            return Err(AppError::InvalidInput(format!(
                "batch size must be at least {MIN_BATCH_SIZE}, got {}",
                args.batch_size
            )));
        }

        let input = match &args.input {
            Some(path) if path.as_os_str() != "-" => InputSource::File(path.clone()),
            _ => InputSource::Stdin,
        };

        Ok(ProgramConfig {
            input,
            batch_size: args.batch_size,
            strict: args.strict,
            format: args.format,
        })
    }
}
