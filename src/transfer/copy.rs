//! Tracked stream copy

use log::{debug, error, info};
use std::io::{ErrorKind, Read, Write};

use crate::error::Result;
use crate::format::format_bytes;
use crate::tracker::{RateTracker, TransferStat};

/// Copy `reader` into `writer`, reporting progress to `tracker`
///
/// On success the writer is flushed and the tracker is finished; the final
/// snapshot is returned. On error the tracker is left running so the caller
/// can retry against it.
pub fn copy_tracked<R, W>(
    reader: &mut R,
    writer: &mut W,
    tracker: &RateTracker,
) -> Result<TransferStat>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    info!(
        "Starting tracked copy ({} expected)",
        format_bytes(tracker.total())
    );

    let mut buffer = [0u8; 8192]; // 8KB buffer
    let mut total_copied = 0i64;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => {
                debug!("Reached end of stream, {total_copied} bytes copied");
                break;
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("Failed to read from source: {e}");
                return Err(e.into());
            }
        };

        if let Err(e) = writer.write_all(&buffer[..bytes_read]) {
            error!("Failed to write to destination: {e}");
            return Err(e.into());
        }

        total_copied += bytes_read as i64;
        tracker.add(bytes_read as i64);
    }

    if let Err(e) = writer.flush() {
        error!("Failed to flush destination: {e}");
        return Err(e.into());
    }

    let stat = tracker.stat();
    info!("Copy completed: {stat}");
    Ok(stat)
}
