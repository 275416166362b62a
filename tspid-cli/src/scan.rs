use std::io::Read;

use tracing::{debug, info, warn};
use ts_packet::{TsError, TsPacket, TsPacketReader};

use crate::{
    error::{AppError, Result},
    report::PidReport,
};

/// Read the whole stream batch by batch and collect its PIDs.
///
/// A clean end of stream always finishes the scan. A truncated stream finishes
/// it as well unless `strict` is set.
pub fn scan<R: Read>(source: R, batch_size: usize, strict: bool) -> Result<PidReport> {
    let mut reader = TsPacketReader::new(source);
    let mut slots = vec![TsPacket::default(); batch_size];
    let mut report = PidReport::new();

    loop {
        match reader.fill(&mut slots) {
            Ok(n) => {
                report.record(&slots[..n]);
                debug!(packets = reader.packets_parsed(), "Batch decoded");
            }
            Err(err) => {
                report.record(&slots[..err.produced]);
                match err.into_inner() {
                    TsError::EndOfStream => break,
                    e @ TsError::StreamTruncated { .. } if strict => {
                        return Err(AppError::Ts(e));
                    }
                    TsError::StreamTruncated {
                        bytes_read,
                        packets_parsed,
                    } => {
                        warn!(bytes_read, packets_parsed, "Stream ends inside a packet");
                        report.truncated = true;
                        break;
                    }
                    e => return Err(AppError::Ts(e)),
                }
            }
        }
    }

    report.finish(&reader);
    info!(
        packets = report.packets,
        bytes_read = report.bytes_read,
        skipped = report.bytes_skipped,
        pids = report.pids().count(),
        "Scan complete"
    );
    Ok(report)
}
