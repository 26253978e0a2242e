//! Fixed-capacity sample storage with incremental sliding-window statistics.
//!
//! The crate ingests a stream of scalar samples from one producer thread and
//! serves render/scan threads with cheap, repeated queries over sliding
//! windows: min/max with turning-point awareness, averages, and spike
//! retrieval. Storage never reallocates; the last scan of each kind is
//! cached and updated incrementally as the query window slides forward.

pub mod range;
pub mod segment;
pub mod ring;
pub mod spike;
pub mod scan_cache;
pub mod average_cache;
pub mod spin;
pub mod buffer;
pub mod error;

pub mod cli;

pub use buffer::SampleBuffer;
pub use error::BufferError;
pub use range::{IndexRange, ValueRange};
pub use spike::DetectorConfig;
