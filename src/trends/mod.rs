//! Trend Aggregator.
//!
//! Buckets a case collection by calendar month and by rolling 7/30-day
//! windows. Narrative lines come from an external [`SignalTable`].

mod aggregates;
mod narrative;
mod types;

pub use aggregates::*;
pub use narrative::*;
pub use types::*;
