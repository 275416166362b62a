use std::io::{ErrorKind, Read};

use bytes::Bytes;
use memchr::memchr_iter;
use tracing::{debug, trace, warn};

use crate::{
    Result,
    error::{FillError, TsError},
    packet::{SYNC_BYTE, TS_PACKET_SIZE, TsPacket},
};

/// Number of bytes inspected when looking for packet alignment (3 packets)
pub const SYNC_WINDOW_SIZE: usize = TS_PACKET_SIZE * 3;

/// Smallest batch accepted while unsynchronized; synchronization yields this many packets
pub const MIN_BATCH_SIZE: usize = 3;

/// Synchronization state of a [`TsPacketReader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Packet alignment not found yet
    Unsynchronized,
    /// Aligned on packet boundaries, reading one packet at a time
    Synchronized,
    /// The source ended, either cleanly or in the middle of a packet
    Exhausted,
    /// A packet without a sync byte was found after synchronization
    Faulted,
}

/// Find the first offset in `0..188` where a sync byte is present in three
/// consecutive packets.
///
/// Returns `None` if `window` holds less than [`SYNC_WINDOW_SIZE`] bytes.
pub fn find_sync_offset(window: &[u8]) -> Option<usize> {
    if window.len() < SYNC_WINDOW_SIZE {
        return None;
    }
    memchr_iter(SYNC_BYTE, &window[..TS_PACKET_SIZE]).find(|&offset| {
        window[offset + TS_PACKET_SIZE] == SYNC_BYTE
            && window[offset + 2 * TS_PACKET_SIZE] == SYNC_BYTE
    })
}

/// Blocking TS packet reader over a byte source
///
/// The reader owns its source for its whole lifetime, since any read done
/// behind its back would break the offset bookkeeping.
#[derive(Debug)]
pub struct TsPacketReader<R> {
    source: R,
    state: ReaderState,
    /// Total bytes pulled from the source
    bytes_read: u64,
    /// Bytes belonging to decoded packets
    bytes_parsed: u64,
    /// Leading garbage skipped while synchronizing
    bytes_skipped: u64,
    packets_parsed: u64,
    /// Bytes of the current packet read before an I/O error
    partial: Vec<u8>,
}

impl<R: Read> TsPacketReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            state: ReaderState::Unsynchronized,
            bytes_read: 0,
            bytes_parsed: 0,
            bytes_skipped: 0,
            packets_parsed: 0,
            partial: Vec::new(),
        }
    }

    /// Fill `slots` with as many packets as fit, reading from the source as needed.
    ///
    /// On error, the packets written before the failure are in
    /// `slots[..err.produced]`.
    ///
    /// * `TsError::EndOfStream` is returned once the source is exhausted and no
    ///   packet was produced by this call. If some packets were produced, they
    ///   are returned as `Ok` and the next call reports the end of stream.
    /// * `TsError::StreamTruncated` is returned if the source ends in the middle
    ///   of a packet, even when packets were produced by this call.
    /// * `TsError::NoSyncBytePresent` is returned if a packet lost its sync byte.
    ///   The reader does not resynchronize on its own, see [`Self::resynchronize`].
    pub fn fill(&mut self, slots: &mut [TsPacket]) -> std::result::Result<usize, FillError> {
        match self.state {
            ReaderState::Exhausted => return Err(FillError::new(0, TsError::EndOfStream)),
            ReaderState::Faulted => return Err(FillError::new(0, self.no_sync_byte_error())),
            ReaderState::Unsynchronized | ReaderState::Synchronized => {}
        }

        let mut produced = 0;

        if self.state == ReaderState::Unsynchronized {
            if slots.len() < MIN_BATCH_SIZE {
                return Err(FillError::new(
                    0,
                    TsError::BatchTooSmall {
                        minimum: MIN_BATCH_SIZE,
                        actual: slots.len(),
                    },
                ));
            }
            let packets = self.synchronize().map_err(|e| FillError::new(0, e))?;
            for (slot, packet) in slots.iter_mut().zip(packets) {
                *slot = packet;
            }
            produced = MIN_BATCH_SIZE;
        }

        while produced < slots.len() {
            match self.read_packet() {
                Ok(Some(packet)) => {
                    slots[produced] = packet;
                    produced += 1;
                }
                Ok(None) if produced > 0 => break,
                Ok(None) => {
                    debug!(
                        bytes_read = self.bytes_read,
                        packets_parsed = self.packets_parsed,
                        "End of stream"
                    );
                    self.state = ReaderState::Exhausted;
                    return Err(FillError::new(0, TsError::EndOfStream));
                }
                Err(error) => {
                    match error {
                        TsError::StreamTruncated { .. } => self.state = ReaderState::Exhausted,
                        TsError::NoSyncBytePresent { .. } => self.state = ReaderState::Faulted,
                        _ => {}
                    }
                    return Err(FillError::new(produced, error));
                }
            }
        }

        trace!(produced, total = self.packets_parsed, "Filled packet batch");
        Ok(produced)
    }

    /// Locate packet alignment and return the first three packets.
    ///
    /// Reads [`SYNC_WINDOW_SIZE`] bytes and looks for the first offset where
    /// the sync byte shows up in three consecutive packets, then reads the
    /// rest of the third packet. A sync byte that happens to sit at the same
    /// payload position of three consecutive packets is accepted as well.
    pub fn synchronize(&mut self) -> Result<[TsPacket; 3]> {
        if self.state != ReaderState::Unsynchronized {
            return Err(TsError::AlreadySynchronized);
        }

        let mut window = vec![0u8; SYNC_WINDOW_SIZE];
        let n = self.read_full(&mut window)?;
        if n == 0 {
            return Err(TsError::EndOfStream);
        }
        if n < SYNC_WINDOW_SIZE {
            warn!(bytes = n, "Stream ended before packet alignment could be checked");
            return Err(self.truncated_error());
        }

        let Some(offset) = find_sync_offset(&window) else {
            warn!(
                bytes_read = self.bytes_read,
                "No packet alignment found in sync window"
            );
            return Err(self.no_sync_byte_error());
        };

        // The third packet may run past the window, complete it before decoding anything
        let third_offset = offset + 2 * TS_PACKET_SIZE;
        let mut third = window[third_offset..].to_vec();
        third.resize(TS_PACKET_SIZE, 0);
        let tail = self.read_full(&mut third[TS_PACKET_SIZE - offset..])?;
        if tail < offset {
            warn!(
                missing = offset - tail,
                "Stream ended inside the third sync packet"
            );
            return Err(self.truncated_error());
        }

        if offset > 0 {
            debug!(skipped = offset, "Skipped leading garbage before first packet");
        }
        self.bytes_skipped += offset as u64;

        let window = Bytes::from(window);
        let third = Bytes::from(third);
        let packets = [
            self.decode(&window, offset)?,
            self.decode(&window, offset + TS_PACKET_SIZE)?,
            self.decode(&third, 0)?,
        ];

        self.state = ReaderState::Synchronized;
        debug!(
            offset,
            bytes_read = self.bytes_read,
            "Synchronized on packet boundary"
        );
        Ok(packets)
    }

    /// Decode the packet starting at `offset` in `frame`.
    ///
    /// Counters are only updated when the packet decodes successfully. The
    /// returned payload is a slice of `frame`, no data is copied.
    pub fn decode(&mut self, frame: &Bytes, offset: usize) -> Result<TsPacket> {
        let expected = offset.saturating_add(TS_PACKET_SIZE);
        if frame.len() < expected {
            return Err(TsError::BufferTooSmall {
                expected,
                actual: frame.len(),
            });
        }
        if frame[offset] != SYNC_BYTE {
            return Err(self.no_sync_byte_error());
        }

        let packet = TsPacket::from_frame(frame, offset);
        self.packets_parsed += 1;
        self.bytes_parsed += TS_PACKET_SIZE as u64;
        Ok(packet)
    }

    /// Leave the faulted state so that the next [`Self::fill`] synchronizes again.
    ///
    /// Returns `false` if the reader was not faulted.
    pub fn resynchronize(&mut self) -> bool {
        if self.state != ReaderState::Faulted {
            return false;
        }
        debug!(
            bytes_read = self.bytes_read,
            packets_parsed = self.packets_parsed,
            "Resynchronization requested"
        );
        self.state = ReaderState::Unsynchronized;
        true
    }

    /// Read one packet. `Ok(None)` means the source ended on a packet boundary.
    fn read_packet(&mut self) -> Result<Option<TsPacket>> {
        let mut buffer = std::mem::take(&mut self.partial);
        let mut n = buffer.len();
        buffer.resize(TS_PACKET_SIZE, 0);
        if let Err(e) = self.read_into(&mut buffer, &mut n) {
            // Keep what was read so that the next call completes the same packet
            buffer.truncate(n);
            self.partial = buffer;
            return Err(e);
        }
        if n == 0 {
            return Ok(None);
        }
        if n < TS_PACKET_SIZE {
            warn!(
                bytes = n,
                packets_parsed = self.packets_parsed,
                "Stream truncated inside a packet"
            );
            return Err(self.truncated_error());
        }

        let frame = Bytes::from(buffer);
        match self.decode(&frame, 0) {
            Ok(packet) => Ok(Some(packet)),
            Err(e) => {
                warn!(
                    bytes_read = self.bytes_read,
                    packets_parsed = self.packets_parsed,
                    "Lost packet alignment"
                );
                Err(e)
            }
        }
    }

    /// Read until `buf` is full or the source is exhausted, returning the number
    /// of bytes read.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        self.read_into(buf, &mut filled)?;
        Ok(filled)
    }

    /// Read into `buf[*filled..]` until it is full or the source is exhausted.
    /// `filled` is kept up to date even when an error is returned.
    fn read_into(&mut self, buf: &mut [u8], filled: &mut usize) -> Result<()> {
        while *filled < buf.len() {
            match self.source.read(&mut buf[*filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    *filled += n;
                    self.bytes_read += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(TsError::Io(e)),
            }
        }
        Ok(())
    }

    fn no_sync_byte_error(&self) -> TsError {
        TsError::NoSyncBytePresent {
            bytes_read: self.bytes_read,
            packets_parsed: self.packets_parsed,
        }
    }

    fn truncated_error(&self) -> TsError {
        TsError::StreamTruncated {
            bytes_read: self.bytes_read,
            packets_parsed: self.packets_parsed,
        }
    }
}

impl<R> TsPacketReader<R> {
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// True once packet alignment has been found
    pub fn is_synchronized(&self) -> bool {
        self.state != ReaderState::Unsynchronized
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn bytes_parsed(&self) -> u64 {
        self.bytes_parsed
    }

    pub fn bytes_skipped(&self) -> u64 {
        self.bytes_skipped
    }

    pub fn packets_parsed(&self) -> u64 {
        self.packets_parsed
    }

    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Give back the underlying source
    pub fn into_inner(self) -> R {
        self.source
    }
}
