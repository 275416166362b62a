use std::io::Cursor;

use ts_packet::{
    FillError, PID_NULL, SYNC_BYTE, TS_PACKET_SIZE, TS_PAYLOAD_SIZE, TsError, TsPacket,
    TsPacketReader,
};

/// Build a packet with the given PID, flags byte bits and a payload byte
/// that never collides with the sync byte.
fn packet(pid: u16, flag_bits: u8, fill: u8) -> Vec<u8> {
    assert_ne!(fill, SYNC_BYTE);
    let mut data = vec![fill; TS_PACKET_SIZE];
    data[0] = SYNC_BYTE;
    data[1] = (flag_bits & 0xE0) | ((pid >> 8) as u8 & 0x1F);
    data[2] = (pid & 0xFF) as u8;
    data
}

fn stream(garbage: usize, pids: &[u16]) -> Vec<u8> {
    let mut data = vec![0xFF; garbage];
    for (i, &pid) in pids.iter().enumerate() {
        data.extend(packet(pid, 0, i as u8));
    }
    data
}

/// Drain the reader with a fixed batch size, returning every PID seen and the
/// terminal error.
fn drain(reader: &mut TsPacketReader<Cursor<Vec<u8>>>, batch: usize) -> (Vec<u16>, FillError) {
    let mut slots = vec![TsPacket::default(); batch];
    let mut pids = Vec::new();
    loop {
        match reader.fill(&mut slots) {
            Ok(n) => pids.extend(slots[..n].iter().map(|p| p.pid)),
            Err(err) => {
                pids.extend(slots[..err.produced].iter().map(|p| p.pid));
                return (pids, err);
            }
        }
        assert_eq!(
            reader.bytes_parsed(),
            reader.packets_parsed() * TS_PACKET_SIZE as u64
        );
    }
}

#[test]
fn test_header_bits_are_decoded() {
    let mut data = packet(0x1ABC, 0xE0, 0x00);
    data.extend(packet(0x0011, 0x40, 0x01));
    data.extend(packet(PID_NULL, 0x20, 0x02));
    let mut reader = TsPacketReader::new(Cursor::new(data));
    let mut slots = vec![TsPacket::default(); 3];

    assert_eq!(reader.fill(&mut slots).unwrap(), 3);
    assert_eq!(slots[0].pid, 0x1ABC);
    assert_eq!(slots[0].flags, [true, true, true]);
    assert_eq!(slots[1].pid, 0x0011);
    assert!(slots[1].payload_unit_start_indicator());
    assert!(!slots[1].transport_error_indicator());
    assert!(slots[2].is_null());
    assert!(slots[2].transport_priority());
    for slot in &slots {
        assert_eq!(slot.payload.len(), TS_PAYLOAD_SIZE);
    }
    assert_eq!(slots[2].payload[0], 0x02);
}

#[test]
fn test_garbage_prefix_is_skipped() {
    let pids: Vec<u16> = (100..110).collect();
    for garbage in [0, 1, 94, 187] {
        let mut reader = TsPacketReader::new(Cursor::new(stream(garbage, &pids)));
        let mut slots = vec![TsPacket::default(); 3];

        assert_eq!(reader.fill(&mut slots).unwrap(), 3);
        assert_eq!(
            slots.iter().map(|p| p.pid).collect::<Vec<_>>(),
            vec![100, 101, 102]
        );
        assert_eq!(reader.bytes_read(), (garbage + 3 * TS_PACKET_SIZE) as u64);
        assert_eq!(reader.bytes_skipped(), garbage as u64);
        assert_eq!(reader.bytes_parsed(), 3 * TS_PACKET_SIZE as u64);
    }
}

#[test]
fn test_small_batches_lose_nothing() {
    let pids: Vec<u16> = (0..25).map(|i| i * 7).collect();
    for batch in [3, 4, 10, 25, 1000] {
        let mut reader = TsPacketReader::new(Cursor::new(stream(13, &pids)));
        let (seen, err) = drain(&mut reader, batch);

        assert_eq!(seen, pids);
        assert_eq!(err.produced, 0);
        assert!(err.error.is_end_of_stream());
        assert_eq!(reader.packets_parsed(), 25);
        assert_eq!(reader.bytes_read(), (13 + 25 * TS_PACKET_SIZE) as u64);
    }
}

#[test]
fn test_truncated_tail_is_reported() {
    let pids = [1, 2, 3, 4, 5, 6];
    let mut data = stream(0, &pids);
    data.extend(vec![SYNC_BYTE, 0x00, 0x10]);
    let mut reader = TsPacketReader::new(Cursor::new(data));

    let (seen, err) = drain(&mut reader, 1000);
    assert_eq!(seen, pids);
    assert_eq!(err.produced, 6);
    assert!(err.error.is_truncated());
    assert_eq!(reader.packets_parsed(), 6);
    assert_eq!(reader.bytes_parsed(), 6 * TS_PACKET_SIZE as u64);
    assert_eq!(reader.bytes_read(), 6 * TS_PACKET_SIZE as u64 + 3);
}

#[test]
fn test_corrupted_packet_stops_the_reader() {
    let pids = [10, 11, 12, 13, 14, 15];
    let mut data = stream(0, &pids);
    data[4 * TS_PACKET_SIZE] = 0x48;
    let mut reader = TsPacketReader::new(Cursor::new(data));

    let (seen, err) = drain(&mut reader, 1000);
    assert_eq!(seen, vec![10, 11, 12, 13]);
    assert_eq!(err.produced, 4);
    assert!(matches!(
        err.error,
        TsError::NoSyncBytePresent {
            packets_parsed: 4,
            ..
        }
    ));
    assert_eq!(reader.packets_parsed(), 4);
}

#[test]
fn test_no_alignment_in_sync_window() {
    let mut data = vec![0x00; 2 * TS_PACKET_SIZE];
    data[10] = SYNC_BYTE;
    data[10 + TS_PACKET_SIZE] = SYNC_BYTE;
    data.extend(vec![0x00; TS_PACKET_SIZE]);
    let mut reader = TsPacketReader::new(Cursor::new(data));
    let mut slots = vec![TsPacket::default(); 8];

    let err = reader.fill(&mut slots).unwrap_err();
    assert_eq!(err.produced, 0);
    assert!(matches!(err.error, TsError::NoSyncBytePresent { .. }));
    assert!(!reader.is_synchronized());
    assert_eq!(reader.packets_parsed(), 0);
}

#[test]
fn test_sync_byte_in_payload_can_align_early() {
    // A sync byte at the same payload position of three packets looks like a
    // valid alignment and wins because it comes first.
    let pids = [1, 2, 3, 4];
    let mut data = stream(0, &pids);
    data[0] = 0x00;
    for i in 0..3 {
        data[i * TS_PACKET_SIZE + 50] = SYNC_BYTE;
    }
    let mut reader = TsPacketReader::new(Cursor::new(data));
    let mut slots = vec![TsPacket::default(); 3];

    assert_eq!(reader.fill(&mut slots).unwrap(), 3);
    assert_eq!(reader.bytes_skipped(), 50);
}
