//! Uniform spatial hash grid over ℝ³.
//!
//! World space is quantized into cubic cells of side `cell_width`. The resulting
//! virtual cell coordinates are unbounded; they are folded onto a fixed
//! `dim_x × dim_y × dim_z` physical grid with a bitmask, so the grid tiles space
//! toroidally. O(n) counting-sort build, O(1) cell lookup.
//!
//! Queries walk the box of virtual cells overlapping a sphere's AABB and emit
//! every stored point in those cells. They are candidate queries: the caller
//! applies its own exact distance test.

mod build;
mod cell;
mod query;

pub use query::{HashGridQuery, QueryState};

use crate::{HashGridError, Point3Like};
use glam::{IVec3, Vec3};
use std::ops::Range;
#[cfg(feature = "timing")]
use std::time::Duration;

/// Largest allowed extent along one axis. Every valid dimension divides the fold bias.
pub const MAX_DIM: i32 = cell::ORIGIN;

/// Fine-grained timings for `HashGrid::update`.
#[cfg(feature = "timing")]
#[derive(Debug, Clone, Default)]
pub struct HashGridBuildTimings {
    /// Quantize and fold every point.
    pub assign: Duration,
    /// Fill `cell_starts`/`cell_ends`.
    pub ranges: Duration,
    /// Write the sorted `point_ids`/`point_cells`.
    pub scatter: Duration,
}

/// Dummy timings when feature is disabled (zero-sized).
#[cfg(not(feature = "timing"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct HashGridBuildTimings;

#[cfg(feature = "timing")]
impl HashGridBuildTimings {
    #[inline]
    pub fn total(&self) -> Duration {
        self.assign + self.ranges + self.scatter
    }
}

/// How world coordinates are rounded to integer cell coordinates.
///
/// The two policies only differ for negative coordinates: with `Truncate`, the
/// cells `-1` and `0` along an axis collapse onto a single cell twice as wide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Quantization {
    /// `floor(x / cell_width)`. Uniform cells on both sides of the origin.
    #[default]
    Floor,
    /// Round toward zero (integer cast).
    Truncate,
}

/// Physical grid extent. Each axis is a power of two in `1..=MAX_DIM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridDims {
    x: i32,
    y: i32,
    z: i32,
}

impl GridDims {
    /// Validate and create grid dimensions.
    pub fn new(x: i32, y: i32, z: i32) -> Result<Self, HashGridError> {
        for (axis, value) in [('x', x), ('y', y), ('z', z)] {
            if value <= 0 || value > MAX_DIM || (value & (value - 1)) != 0 {
                return Err(HashGridError::InvalidDimension { axis, value });
            }
        }
        let cells = (x as u64)
            .checked_mul(y as u64)
            .and_then(|xy| xy.checked_mul(z as u64))
            .unwrap_or(u64::MAX);
        if cells > i32::MAX as u64 {
            return Err(HashGridError::TooManyCells(cells));
        }
        Ok(Self { x, y, z })
    }

    /// Same extent `n` on every axis.
    pub fn cube(n: i32) -> Result<Self, HashGridError> {
        Self::new(n, n, n)
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn z(&self) -> i32 {
        self.z
    }

    #[inline]
    pub fn as_ivec3(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// Total number of physical cells, `x · y · z`.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }
}

impl Default for GridDims {
    fn default() -> Self {
        Self {
            x: 128,
            y: 128,
            z: 128,
        }
    }
}

/// Configuration for an empty, reusable grid.
#[derive(Debug, Clone)]
pub struct HashGridConfig {
    /// Physical grid extent.
    pub dims: GridDims,
    /// Side length of a cell. Must be finite and > 0.
    ///
    /// For radius-`r` queries, `cell_width ≈ r` keeps the walked box at 3³ cells.
    pub cell_width: f32,
    /// Upper bound on the number of points accepted by a build.
    /// Raised with [`HashGrid::reserve`].
    pub max_points: usize,
    pub quantization: Quantization,
}

impl Default for HashGridConfig {
    fn default() -> Self {
        Self {
            dims: GridDims::default(),
            cell_width: 1.0,
            max_points: 0,
            quantization: Quantization::Floor,
        }
    }
}

/// Occupancy summary of a built grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStats {
    pub num_points: usize,
    pub num_cells: usize,
    /// Cells holding at least one point.
    pub occupied_cells: usize,
    /// Largest number of points in a single cell.
    pub max_occupancy: usize,
    /// Mean points per occupied cell (0 when empty).
    pub mean_occupancy: f32,
}

/// Spatial hash grid for points in ℝ³.
///
/// Immutable between builds. Queries borrow the grid, so a rebuild cannot
/// happen while any query over the previous contents is alive.
#[derive(Debug, Clone)]
pub struct HashGrid {
    cell_width: f32,
    cell_width_inv: f32,
    dims: GridDims,
    quantization: Quantization,
    /// Cell id of each stored point, in sorted (slot) order.
    /// Length: n (number of points)
    point_cells: Vec<i32>,
    /// Original index of the point at each sorted slot.
    /// Length: n (number of points)
    point_ids: Vec<i32>,
    /// Start slot of each cell's range.
    /// Length: dim_x · dim_y · dim_z
    cell_starts: Vec<i32>,
    /// End slot (exclusive) of each cell's range.
    /// Length: dim_x · dim_y · dim_z
    cell_ends: Vec<i32>,
    max_points: usize,
}

/// Borrowed, copyable view of a built grid.
///
/// This is what queries hold: the cell parameters plus the four arrays. Being
/// `Copy + Send + Sync` it can be handed by value to any number of workers.
#[derive(Debug, Clone, Copy)]
pub struct HashGridView<'a> {
    cell_width: f32,
    cell_width_inv: f32,
    dims: GridDims,
    quantization: Quantization,
    point_cells: &'a [i32],
    point_ids: &'a [i32],
    cell_starts: &'a [i32],
    cell_ends: &'a [i32],
}

#[inline]
pub(crate) fn validate_cell_width(cell_width: f32) -> Result<(), HashGridError> {
    if cell_width.is_finite() && cell_width > 0.0 {
        Ok(())
    } else {
        Err(HashGridError::InvalidCellWidth(cell_width))
    }
}

impl HashGrid {
    /// Create an empty grid with unit cell width and zero capacity.
    pub fn new(dims: GridDims) -> Self {
        let num_cells = dims.num_cells();
        Self {
            cell_width: 1.0,
            cell_width_inv: 1.0,
            dims,
            quantization: Quantization::Floor,
            point_cells: Vec::new(),
            point_ids: Vec::new(),
            cell_starts: vec![0; num_cells],
            cell_ends: vec![0; num_cells],
            max_points: 0,
        }
    }

    /// Create an empty grid from explicit configuration.
    pub fn with_config(config: HashGridConfig) -> Result<Self, HashGridError> {
        validate_cell_width(config.cell_width)?;
        let mut grid = Self::new(config.dims);
        grid.cell_width = config.cell_width;
        grid.cell_width_inv = 1.0 / config.cell_width;
        grid.quantization = config.quantization;
        grid.reserve(config.max_points);
        Ok(grid)
    }

    /// Build a grid over `points` in one step, with capacity `points.len()`.
    pub fn from_points<P: Point3Like + Sync>(
        points: &[P],
        cell_width: f32,
        dims: GridDims,
    ) -> Result<Self, HashGridError> {
        Self::from_points_with(points, cell_width, dims, Quantization::Floor)
    }

    /// Like [`HashGrid::from_points`] with an explicit rounding policy.
    pub fn from_points_with<P: Point3Like + Sync>(
        points: &[P],
        cell_width: f32,
        dims: GridDims,
        quantization: Quantization,
    ) -> Result<Self, HashGridError> {
        let mut grid = Self::with_config(HashGridConfig {
            dims,
            cell_width,
            max_points: points.len(),
            quantization,
        })?;
        grid.update(points, cell_width)?;
        Ok(grid)
    }

    /// Raise the point capacity to at least `max_points`. Never shrinks.
    pub fn reserve(&mut self, max_points: usize) {
        if max_points <= self.max_points {
            return;
        }
        log::trace!("hash grid capacity {} -> {}", self.max_points, max_points);
        self.point_ids
            .reserve_exact(max_points.saturating_sub(self.point_ids.len()));
        self.point_cells
            .reserve_exact(max_points.saturating_sub(self.point_cells.len()));
        self.max_points = max_points;
    }

    /// Borrow the grid as a copyable view for queries.
    #[inline]
    pub fn view(&self) -> HashGridView<'_> {
        HashGridView {
            cell_width: self.cell_width,
            cell_width_inv: self.cell_width_inv,
            dims: self.dims,
            quantization: self.quantization,
            point_cells: &self.point_cells,
            point_ids: &self.point_ids,
            cell_starts: &self.cell_starts,
            cell_ends: &self.cell_ends,
        }
    }

    #[inline]
    pub fn cell_width(&self) -> f32 {
        self.cell_width
    }

    #[inline]
    pub fn cell_width_inv(&self) -> f32 {
        self.cell_width_inv
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn quantization(&self) -> Quantization {
        self.quantization
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.point_ids.len()
    }

    #[inline]
    pub fn max_points(&self) -> usize {
        self.max_points
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cell_starts.len()
    }

    /// Cell id per sorted slot (non-decreasing).
    #[inline]
    pub fn point_cells(&self) -> &[i32] {
        &self.point_cells
    }

    /// Original point index per sorted slot.
    #[inline]
    pub fn point_ids(&self) -> &[i32] {
        &self.point_ids
    }

    #[inline]
    pub fn cell_starts(&self) -> &[i32] {
        &self.cell_starts
    }

    #[inline]
    pub fn cell_ends(&self) -> &[i32] {
        &self.cell_ends
    }

    /// Original index of the point stored at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= num_points()`.
    #[inline]
    pub fn point_id(&self, slot: usize) -> i32 {
        self.point_ids[slot]
    }

    /// Get the slot range of a cell.
    #[inline]
    pub fn cell_range(&self, cell: usize) -> Range<usize> {
        self.cell_starts[cell] as usize..self.cell_ends[cell] as usize
    }

    /// Get original indices of the points in a cell.
    #[inline]
    pub fn cell_points(&self, cell: usize) -> &[i32] {
        &self.point_ids[self.cell_range(cell)]
    }

    /// Physical cell id of a virtual cell coordinate.
    #[inline]
    pub fn cell_index(&self, virtual_cell: IVec3) -> i32 {
        cell::fold(virtual_cell, self.dims)
    }

    /// Virtual cell coordinate of a world-space point.
    #[inline]
    pub fn virtual_cell<P: Point3Like>(&self, p: &P) -> IVec3 {
        cell::quantize(p.to_vec3(), self.cell_width_inv, self.quantization)
    }

    /// Physical cell id of a world-space point.
    #[inline]
    pub fn point_cell<P: Point3Like>(&self, p: &P) -> i32 {
        self.cell_index(self.virtual_cell(p))
    }

    /// Start a candidate query; see [`HashGridView::query`].
    #[inline]
    pub fn query<P: Point3Like>(
        &self,
        pos: P,
        radius: f32,
    ) -> Result<HashGridQuery<'_>, HashGridError> {
        self.view().query(pos, radius)
    }

    /// Occupancy summary.
    pub fn stats(&self) -> GridStats {
        let mut occupied_cells = 0usize;
        let mut max_occupancy = 0usize;
        for (&start, &end) in self.cell_starts.iter().zip(&self.cell_ends) {
            let len = (end - start) as usize;
            if len > 0 {
                occupied_cells += 1;
                max_occupancy = max_occupancy.max(len);
            }
        }
        let num_points = self.num_points();
        GridStats {
            num_points,
            num_cells: self.num_cells(),
            occupied_cells,
            max_occupancy,
            mean_occupancy: if occupied_cells == 0 {
                0.0
            } else {
                num_points as f32 / occupied_cells as f32
            },
        }
    }
}

impl<'a> HashGridView<'a> {
    #[inline]
    pub fn cell_width(&self) -> f32 {
        self.cell_width
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.point_ids.len()
    }

    #[inline]
    pub fn point_cells(&self) -> &'a [i32] {
        self.point_cells
    }

    #[inline]
    pub fn point_ids(&self) -> &'a [i32] {
        self.point_ids
    }

    /// Original index of the point stored at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= num_points()`.
    #[inline]
    pub fn point_id(&self, slot: usize) -> i32 {
        self.point_ids[slot]
    }

    /// Checked form of [`HashGridView::point_id`].
    #[inline]
    pub fn get_point_id(&self, slot: usize) -> Option<i32> {
        self.point_ids.get(slot).copied()
    }

    /// Physical cell id of a virtual cell coordinate.
    #[inline]
    pub fn cell_index(&self, virtual_cell: IVec3) -> i32 {
        cell::fold(virtual_cell, self.dims)
    }

    #[inline]
    fn quantize(&self, p: Vec3) -> IVec3 {
        cell::quantize(p, self.cell_width_inv, self.quantization)
    }

    /// Slot range `[start, end)` of a physical cell.
    #[inline]
    fn cell_slots(&self, cell: i32) -> (i32, i32) {
        let c = cell as usize;
        (self.cell_starts[c], self.cell_ends[c])
    }
}
