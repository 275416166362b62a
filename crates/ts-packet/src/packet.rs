use bytes::{Buf, Bytes};

/// Sync byte found at the start of every TS packet
pub const SYNC_BYTE: u8 = 0x47;

/// Size of a TS packet in bytes
pub const TS_PACKET_SIZE: usize = 188;

/// Size of the TS header consumed by the decoder (sync byte + flags/PID)
pub const TS_HEADER_SIZE: usize = 3;

/// Bytes left after the header, exposed as the packet payload
pub const TS_PAYLOAD_SIZE: usize = TS_PACKET_SIZE - TS_HEADER_SIZE;

/// Largest PID value that fits in 13 bits
pub const PID_MAX: u16 = 0x1FFF;

/// PAT PID (always 0x0000)
pub const PID_PAT: u16 = 0x0000;

/// NULL PID (always 0x1FFF)
pub const PID_NULL: u16 = 0x1FFF;

/// Transport Stream packet header with an opaque payload
///
/// The payload is a shared slice of the buffer the packet was read into, so it
/// stays valid for as long as the packet is alive regardless of later reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsPacket {
    /// Packet Identifier (13 bits)
    pub pid: u16,
    /// Top three bits of the second header byte: bit 7, bit 6, bit 5
    pub flags: [bool; 3],
    /// Everything after the 3 header bytes (185 bytes for a decoded packet)
    pub payload: Bytes,
}

impl TsPacket {
    /// Build a packet from a frame that is known to hold a full packet with a
    /// sync byte at `offset`.
    pub(crate) fn from_frame(frame: &Bytes, offset: usize) -> Self {
        debug_assert!(frame.len() >= offset + TS_PACKET_SIZE);
        debug_assert_eq!(frame[offset], SYNC_BYTE);

        let mut reader = &frame[offset + 1..offset + TS_HEADER_SIZE];
        let byte1 = reader.get_u8();
        let byte2 = reader.get_u8();

        let flags = [
            (byte1 & 0x80) != 0,
            (byte1 & 0x40) != 0,
            (byte1 & 0x20) != 0,
        ];
        let pid = ((byte1 as u16 & 0x1F) << 8) | byte2 as u16;

        TsPacket {
            pid,
            flags,
            payload: frame.slice(offset + TS_HEADER_SIZE..offset + TS_PACKET_SIZE),
        }
    }

    /// Transport Error Indicator (flag 0)
    #[inline]
    pub fn transport_error_indicator(&self) -> bool {
        self.flags[0]
    }

    /// Payload Unit Start Indicator (flag 1)
    #[inline]
    pub fn payload_unit_start_indicator(&self) -> bool {
        self.flags[1]
    }

    /// Transport Priority (flag 2)
    #[inline]
    pub fn transport_priority(&self) -> bool {
        self.flags[2]
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.pid == PID_NULL
    }
}
