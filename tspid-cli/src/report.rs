use std::collections::BTreeSet;
use std::io::Write;

use serde::Serialize;
use ts_packet::{TsPacket, TsPacketReader};

use crate::{cli::OutputFormat, error::Result};

/// Distinct PIDs seen in a stream, with the reader counters at the end of the scan
#[derive(Debug, Default, Serialize)]
pub struct PidReport {
    pids: BTreeSet<u16>,
    pub packets: u64,
    pub bytes_read: u64,
    pub bytes_parsed: u64,
    pub bytes_skipped: u64,
    pub truncated: bool,
}

impl PidReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, packets: &[TsPacket]) {
        self.pids.extend(packets.iter().map(|p| p.pid));
    }

    /// Copy the final counters from the reader
    pub fn finish<R>(&mut self, reader: &TsPacketReader<R>) {
        self.packets = reader.packets_parsed();
        self.bytes_read = reader.bytes_read();
        self.bytes_parsed = reader.bytes_parsed();
        self.bytes_skipped = reader.bytes_skipped();
    }

    /// PIDs in ascending order
    pub fn pids(&self) -> impl Iterator<Item = u16> + '_ {
        self.pids.iter().copied()
    }

    pub fn write_to<W: Write>(&self, out: &mut W, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Hex => {
                for pid in self.pids() {
                    writeln!(out, "0x{pid:04x}")?;
                }
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, self)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }
}
