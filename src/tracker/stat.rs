//! Final transfer snapshot and its renderings

use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fmt;
use std::io::Write;

use crate::error::Result;
use crate::format::{format_bytes, format_speed};
use crate::logging::{DiagnosticSink, LogSink};

/// Status reported by a finished transfer
pub const STATUS_SUCCESS: &str = "success";

/// Snapshot of a finished transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferStat {
    pub status: String,
    pub total: i64,
    pub transferred: i64,
    /// Bytes per second
    pub speed: f64,
}

impl TransferStat {
    pub fn success(total: i64, transferred: i64, speed: f64) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            total,
            transferred,
            speed,
        }
    }

    /// Progress percentage, 0 when the total is unknown
    pub fn percentage(&self) -> f64 {
        if self.total <= 0 {
            0.0
        } else {
            (self.transferred as f64 / self.total as f64) * 100.0
        }
    }

    /// Write the snapshot as indented JSON
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        let stat = Self {
            status: STATUS_SUCCESS.to_string(),
            ..self.clone()
        };
        let mut serializer = Serializer::with_formatter(writer, PrettyFormatter::with_indent(b" "));
        stat.serialize(&mut serializer)?;
        Ok(())
    }

    /// JSON rendering; failures go to the `log` facade
    pub fn to_json(&self) -> String {
        self.to_json_with(&LogSink)
    }

    /// JSON rendering; failures are reported to `sink` and whatever was
    /// written before the failure is returned
    pub fn to_json_with(&self, sink: &dyn DiagnosticSink) -> String {
        let mut buffer = Vec::new();
        self.render_json(&mut buffer, sink);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn render_json<W: Write>(&self, writer: W, sink: &dyn DiagnosticSink) {
        if let Err(e) = self.write_json(writer) {
            sink.report(&format!("Unable to marshal into JSON: {e}"));
        }
    }
}

impl fmt::Display for TransferStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {}, Transferred: {}, Speed: {}",
            format_bytes(self.total),
            format_bytes(self.transferred),
            format_speed(self.speed)
        )
    }
}
