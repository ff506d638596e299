//! Transfer rate tracking

mod rate;
mod sampler;
mod stat;

pub use rate::RateTracker;
pub use stat::{STATUS_SUCCESS, TransferStat};
