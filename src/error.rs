//! Error types for hash grid construction and queries.

use crate::registry::GridId;
use thiserror::Error;

/// Errors that can occur while building or querying a [`HashGrid`](crate::HashGrid).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HashGridError {
    /// A grid dimension is not a positive power of two, or exceeds the fold range.
    #[error("invalid grid dimension {axis}={value}: must be a power of two in 1..=2^24")]
    InvalidDimension { axis: char, value: i32 },

    /// The total cell count does not fit the `i32` cell id space.
    #[error("too many cells: {0} does not fit a 32-bit cell id")]
    TooManyCells(u64),

    /// Cell width must be finite and strictly positive.
    #[error("invalid cell width {0}: must be finite and > 0")]
    InvalidCellWidth(f32),

    /// Query radius must be finite and non-negative.
    #[error("invalid query radius {0}: must be finite and >= 0")]
    InvalidRadius(f32),

    /// Query center has a NaN or infinite component.
    #[error("query position is not finite")]
    NonFinitePosition,

    /// The point set is larger than the grid's declared capacity.
    #[error("capacity exceeded: {requested} points, capacity {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    /// The point set does not fit the `i32` point index space.
    #[error("too many points: {0} does not fit a 32-bit point index")]
    TooManyPoints(usize),

    /// No grid is registered under this handle.
    #[error("unknown grid handle {0}")]
    UnknownGrid(GridId),
}
