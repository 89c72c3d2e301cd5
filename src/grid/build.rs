//! Grid build: counting sort of points by physical cell id.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Conditionally parallel iterator over a slice.
macro_rules! maybe_par_iter {
    ($slice:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.iter()
        }
    }};
}

pub(crate) use maybe_par_iter;

use super::{cell, validate_cell_width, HashGrid, HashGridBuildTimings};
use crate::{HashGridError, Point3Like};

// A cell holding more than this share of a large build usually means the grid is
// aliasing distant regions onto each other (dims or cell width too small).
const CROWDED_CELL_SHARE: f32 = 0.25;
const CROWDED_CELL_MIN_POINTS: usize = 1024;

impl HashGrid {
    /// Rebuild the grid in place over `points`, reusing its buffers.
    ///
    /// After a successful build:
    /// - `point_cells[i]` is the cell of `points[point_ids[i]]`, non-decreasing in `i`
    /// - `point_ids` is a permutation of `0..n`, ascending within each cell
    /// - `[cell_starts[c], cell_ends[c])` names exactly the slots of cell `c`
    ///
    /// Output depends only on the inputs; serial and parallel builds are byte-identical.
    /// On error the grid is left untouched.
    pub fn update<P: Point3Like + Sync>(
        &mut self,
        points: &[P],
        cell_width: f32,
    ) -> Result<(), HashGridError> {
        #[cfg(feature = "timing")]
        let mut timings = HashGridBuildTimings::default();
        #[cfg(feature = "timing")]
        return self.update_impl(points, cell_width, Some(&mut timings));
        #[cfg(not(feature = "timing"))]
        return self.update_impl(points, cell_width, None);
    }

    #[cfg(feature = "timing")]
    pub fn update_with_timings<P: Point3Like + Sync>(
        &mut self,
        points: &[P],
        cell_width: f32,
        timings: &mut HashGridBuildTimings,
    ) -> Result<(), HashGridError> {
        self.update_impl(points, cell_width, Some(timings))
    }

    fn update_impl<P: Point3Like + Sync>(
        &mut self,
        points: &[P],
        cell_width: f32,
        #[cfg(feature = "timing")] mut timings: Option<&mut HashGridBuildTimings>,
        #[cfg(not(feature = "timing"))] _timings: Option<&mut HashGridBuildTimings>,
    ) -> Result<(), HashGridError> {
        validate_cell_width(cell_width)?;
        let n = points.len();
        if n > i32::MAX as usize {
            return Err(HashGridError::TooManyPoints(n));
        }
        if n > self.max_points {
            return Err(HashGridError::CapacityExceeded {
                requested: n,
                capacity: self.max_points,
            });
        }

        self.cell_width = cell_width;
        self.cell_width_inv = 1.0 / cell_width;
        let cell_width_inv = self.cell_width_inv;
        let quantization = self.quantization;
        let dims = self.dims;
        let num_cells = dims.num_cells();

        // Step 1: Assign each point its cell.
        #[cfg(feature = "timing")]
        let t = std::time::Instant::now();
        let assigned: Vec<i32> = maybe_par_iter!(points)
            .map(|p| {
                let v = cell::quantize(p.to_vec3(), cell_width_inv, quantization);
                cell::fold(v, dims)
            })
            .collect();
        #[cfg(feature = "timing")]
        if let Some(timings) = timings.as_deref_mut() {
            timings.assign += t.elapsed();
        }

        // Step 2: Sort slots by cell and derive each cell's range.
        //
        // Serial: count, prefix sum, cursor scatter. Parallel: sort the permutation,
        // then scan the sorted cells for ranges. Both stay O(n + C) in memory.
        debug_assert_eq!(self.cell_starts.len(), num_cells);
        #[cfg(not(feature = "parallel"))]
        {
            #[cfg(feature = "timing")]
            let t = std::time::Instant::now();
            self.count_ranges(&assigned);
            #[cfg(feature = "timing")]
            if let Some(timings) = timings.as_deref_mut() {
                timings.ranges += t.elapsed();
            }

            #[cfg(feature = "timing")]
            let t = std::time::Instant::now();
            self.scatter_counting(&assigned);
            #[cfg(feature = "timing")]
            if let Some(timings) = timings.as_deref_mut() {
                timings.scatter += t.elapsed();
            }
        }
        #[cfg(feature = "parallel")]
        {
            #[cfg(feature = "timing")]
            let t = std::time::Instant::now();
            self.scatter_sorted(&assigned);
            #[cfg(feature = "timing")]
            if let Some(timings) = timings.as_deref_mut() {
                timings.scatter += t.elapsed();
            }

            #[cfg(feature = "timing")]
            let t = std::time::Instant::now();
            self.ranges_from_runs();
            #[cfg(feature = "timing")]
            if let Some(timings) = timings.as_deref_mut() {
                timings.ranges += t.elapsed();
            }
        }

        self.log_build();
        Ok(())
    }

    /// Count points per cell into `cell_ends`, then exclusive prefix sum into
    /// `cell_starts`. `cell_ends` is left holding the counts.
    #[cfg_attr(feature = "parallel", allow(dead_code))]
    pub(super) fn count_ranges(&mut self, assigned: &[i32]) {
        self.cell_ends.fill(0);
        for &cell in assigned {
            self.cell_ends[cell as usize] += 1;
        }

        let mut sum = 0i32;
        for (start, &count) in self.cell_starts.iter_mut().zip(&self.cell_ends) {
            *start = sum;
            sum += count;
        }
        debug_assert_eq!(sum as usize, assigned.len(), "prefix sum mismatch");
    }

    /// Stable scatter after [`Self::count_ranges`]: `cell_ends` doubles as the
    /// per-cell write cursor, so after the pass it holds `cell_starts[c] + count[c]`.
    #[cfg_attr(feature = "parallel", allow(dead_code))]
    pub(super) fn scatter_counting(&mut self, assigned: &[i32]) {
        let n = assigned.len();
        self.point_ids.clear();
        self.point_ids.resize(n, 0);
        self.point_cells.clear();
        self.point_cells.resize(n, 0);
        self.cell_ends.copy_from_slice(&self.cell_starts);

        for (i, &cell) in assigned.iter().enumerate() {
            let cursor = &mut self.cell_ends[cell as usize];
            let slot = *cursor as usize;
            self.point_ids[slot] = i as i32;
            self.point_cells[slot] = cell;
            *cursor += 1;
        }
    }

    /// Sort the permutation by `(cell, index)` instead of random writes. Ties break
    /// on the original index, which reproduces the counting scatter's order.
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    pub(super) fn scatter_sorted(&mut self, assigned: &[i32]) {
        let n = assigned.len();
        self.point_ids.clear();
        self.point_ids.extend(0..n as i32);
        #[cfg(feature = "parallel")]
        self.point_ids
            .par_sort_unstable_by_key(|&i| (assigned[i as usize], i));
        #[cfg(not(feature = "parallel"))]
        self.point_ids
            .sort_unstable_by_key(|&i| (assigned[i as usize], i));

        self.point_cells.clear();
        self.point_cells
            .extend(self.point_ids.iter().map(|&i| assigned[i as usize]));
    }

    /// Derive every cell's range from the sorted `point_cells` in one O(n + C) scan.
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    pub(super) fn ranges_from_runs(&mut self) {
        let cells = &self.point_cells;
        let mut slot = 0usize;
        for (c, (start, end)) in self
            .cell_starts
            .iter_mut()
            .zip(self.cell_ends.iter_mut())
            .enumerate()
        {
            *start = slot as i32;
            while slot < cells.len() && cells[slot] == c as i32 {
                slot += 1;
            }
            *end = slot as i32;
        }
        debug_assert_eq!(slot, cells.len(), "unsorted or out-of-range cells");
    }

    fn log_build(&self) {
        // Warn is the least verbose level emitted here.
        if !log::log_enabled!(log::Level::Warn) {
            return;
        }
        let stats = self.stats();
        log::debug!(
            "hash grid built: points={} cells={} occupied={} max_occupancy={} mean_occupancy={:.2} cell_width={}",
            stats.num_points,
            stats.num_cells,
            stats.occupied_cells,
            stats.max_occupancy,
            stats.mean_occupancy,
            self.cell_width
        );
        if stats.num_points >= CROWDED_CELL_MIN_POINTS
            && stats.max_occupancy as f32 > CROWDED_CELL_SHARE * stats.num_points as f32
        {
            log::warn!(
                "hash grid cell holds {} of {} points; dims {:?} or cell width {} may be too small",
                stats.max_occupancy,
                stats.num_points,
                self.dims,
                self.cell_width
            );
        }
    }
}
