//! Thread-safe progress and throughput tracking for data transfers.
//!
//! A [`RateTracker`] counts bytes moved by any number of threads while a
//! background sampler derives the current transfer speed. Calling
//! [`RateTracker::stat`] finishes the transfer and yields a [`TransferStat`]
//! that renders as JSON or as a one-line summary.

pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod tracker;
pub mod transfer;

pub use crate::config::TrackerConfig;
pub use error::{Result, TransferStatsError};
pub use logging::{DiagnosticSink, LogSink};
pub use tracker::{RateTracker, TransferStat};
pub use transfer::{CountingReader, CountingWriter, copy_tracked};
