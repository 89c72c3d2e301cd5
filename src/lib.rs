//! Uniform spatial hash grid for fixed-radius neighbor queries in ℝ³.
//!
//! Points are binned into cubic cells by a counting sort; cells are folded onto
//! a power-of-two `dim_x × dim_y × dim_z` table, so the grid covers unbounded
//! space with a fixed memory footprint. A query walks the cells overlapping a
//! sphere's bounding box and yields candidate point indices. The caller keeps
//! the point array and applies its own exact distance test.
//!
//! The grid is built once (single writer) and then queried from any number of
//! threads: a [`HashGridView`] is `Copy + Sync` and each [`HashGridQuery`] is an
//! independent, allocation-free iterator.
//!
//! # Example
//!
//! ```
//! use r3_hashgrid::{GridDims, HashGrid, Point3};
//!
//! let points = vec![
//!     Point3::new(0.1, 0.1, 0.1),
//!     Point3::new(0.2, 0.2, 0.2),
//!     Point3::new(5.0, 5.0, 5.0),
//! ];
//! let dims = GridDims::cube(8).expect("8 is a power of two");
//! let grid = HashGrid::from_points(&points, 1.0, dims).expect("valid grid");
//!
//! let center = Point3::new(0.15, 0.15, 0.15);
//! let radius = 0.5;
//! let neighbors: Vec<i32> = grid
//!     .query(center, radius)
//!     .expect("valid query")
//!     .filter(|&i| points[i as usize].distance_squared(center) <= radius * radius)
//!     .collect();
//! assert_eq!(neighbors, vec![0, 1]);
//! ```

mod error;
mod grid;
mod types;

pub mod registry;
pub mod validation;

pub use error::HashGridError;
pub use grid::{
    GridDims, GridStats, HashGrid, HashGridBuildTimings, HashGridConfig, HashGridQuery,
    HashGridView, Quantization, QueryState, MAX_DIM,
};
pub use registry::{GridId, GridRegistry};
pub use types::{Point3, Point3Like};
