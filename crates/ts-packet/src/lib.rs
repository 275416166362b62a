//! Streaming MPEG-TS packet reader
//!
//! This crate locates 188-byte packet boundaries in an unaligned byte stream
//! and decodes the transport header (flags and PID) of every packet, exposing
//! the rest of the packet as an opaque payload.

pub mod error;
pub mod packet;
pub mod reader;

pub use error::{FillError, TsError};
pub use packet::{
    PID_MAX, PID_NULL, PID_PAT, SYNC_BYTE, TS_HEADER_SIZE, TS_PACKET_SIZE, TS_PAYLOAD_SIZE,
    TsPacket,
};
pub use reader::{MIN_BATCH_SIZE, ReaderState, SYNC_WINDOW_SIZE, TsPacketReader, find_sync_offset};

/// Result type for TS reading operations
pub type Result<T> = std::result::Result<T, TsError>;
