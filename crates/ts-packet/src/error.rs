use thiserror::Error;

/// Errors that can occur while reading TS packets
#[derive(Error, Debug)]
pub enum TsError {
    #[error("buffer too small to parse packet: expected at least {expected} bytes, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("No sync byte present in packet {packets_parsed}, offset {bytes_read}")]
    NoSyncBytePresent { bytes_read: u64, packets_parsed: u64 },

    #[error("Stream truncated in packet {packets_parsed}, offset {bytes_read}")]
    StreamTruncated { bytes_read: u64, packets_parsed: u64 },

    #[error("End of stream")]
    EndOfStream,

    #[error("Packet batch too small: need at least {minimum} slots, got {actual}")]
    BatchTooSmall { minimum: usize, actual: usize },

    #[error("Reader is already synchronized")]
    AlreadySynchronized,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TsError {
    /// Clean end of stream at a packet boundary
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, TsError::EndOfStream)
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, TsError::StreamTruncated { .. })
    }

    /// Stream position `(bytes_read, packets_parsed)` recorded when the error was raised
    pub fn position(&self) -> Option<(u64, u64)> {
        match self {
            TsError::NoSyncBytePresent {
                bytes_read,
                packets_parsed,
            }
            | TsError::StreamTruncated {
                bytes_read,
                packets_parsed,
            } => Some((*bytes_read, *packets_parsed)),
            _ => None,
        }
    }
}

/// Error returned by a batch fill, along with the packets already written to the batch
#[derive(Error, Debug)]
#[error("{error}")]
pub struct FillError {
    /// Number of packets written to the front of the batch before the failure
    pub produced: usize,
    #[source]
    pub error: TsError,
}

impl FillError {
    pub fn new(produced: usize, error: TsError) -> Self {
        Self { produced, error }
    }

    pub fn into_inner(self) -> TsError {
        self.error
    }
}
