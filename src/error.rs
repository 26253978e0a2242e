//! Error types for buffer construction and indexed access.

use thiserror::Error;

/// Errors surfaced by the sample storage engine.
///
/// Degenerate query windows are not errors: range-taking operations treat an
/// empty window as "no data" and return the empty-buffer defaults instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// A buffer with zero capacity cannot be constructed.
    #[error("buffer capacity must be greater than zero")]
    InvalidCapacity,

    /// The backing storage could not be reserved.
    #[error("failed to reserve storage for {capacity} samples")]
    AllocationFailure { capacity: usize },

    /// A relative index at or beyond the buffer capacity was passed to a
    /// bounds-checked accessor.
    #[error("index {index} out of range for buffer of capacity {capacity}")]
    IndexOutOfRange { index: usize, capacity: usize },
}

/// Result type for buffer operations.
pub type Result<T> = std::result::Result<T, BufferError>;
