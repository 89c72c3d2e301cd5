//! Candidate queries: a stateful walk over the cells overlapping a sphere's AABB.

use glam::{IVec3, Vec3};
use std::iter::FusedIterator;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::build::maybe_par_iter;
use super::HashGridView;
use crate::{HashGridError, Point3Like};

/// Observable phase of a [`HashGridQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    /// Just created; nothing has been emitted yet.
    Fresh,
    /// The current cell still has candidates to emit.
    MidCell,
    /// The current cell is drained; the next call moves the cursor on.
    Advancing,
    /// Every cell in the box has been visited. Terminal.
    Exhausted,
}

/// Iterator over the candidate neighbors of one query point.
///
/// Walks the inclusive box `start..=end` of virtual cells in row-major order
/// (x innermost), emitting the original index of every point stored in each
/// visited cell. Along each axis the box spans at most one grid period, so every
/// physical cell is visited at most once and no index is emitted twice.
///
/// Emission is a superset of the points within `radius`: the caller applies the
/// exact distance test. Holds no resources besides the borrowed grid; drop it to
/// cancel.
#[derive(Debug, Clone)]
pub struct HashGridQuery<'a> {
    grid: HashGridView<'a>,
    start: IVec3,
    end: IVec3,
    cursor: IVec3,
    /// Next slot to emit from the current cell.
    cell_index: i32,
    /// One past the current cell's last slot.
    cell_end: i32,
    started: bool,
    exhausted: bool,
}

/// Last virtual cell of the walk along one axis, limited to one full period.
#[inline]
fn clamp_end(start: i32, raw_end: i32, dim: i32) -> i32 {
    raw_end.min(start.saturating_add(dim - 1))
}

impl<'a> HashGridView<'a> {
    /// Begin a candidate query for points near `pos`.
    ///
    /// Visits every cell whose virtual coordinates lie in
    /// `q(pos - radius) ..= min(q(pos + radius), q(pos - radius) + dims - 1)`,
    /// where `q` is the grid's quantization.
    pub fn query<P: Point3Like>(
        &self,
        pos: P,
        radius: f32,
    ) -> Result<HashGridQuery<'a>, HashGridError> {
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(HashGridError::InvalidRadius(radius));
        }
        let center = pos.to_vec3();
        if !center.is_finite() {
            return Err(HashGridError::NonFinitePosition);
        }

        let r = Vec3::splat(radius);
        let start = self.quantize(center - r);
        let raw_end = self.quantize(center + r);
        let dims = self.dims;
        let end = IVec3::new(
            clamp_end(start.x, raw_end.x, dims.x),
            clamp_end(start.y, raw_end.y, dims.y),
            clamp_end(start.z, raw_end.z, dims.z),
        );

        let (cell_index, cell_end) = self.cell_slots(self.cell_index(start));
        Ok(HashGridQuery {
            grid: *self,
            start,
            end,
            cursor: start,
            cell_index,
            cell_end,
            started: false,
            exhausted: false,
        })
    }

    /// Run one independent query per center and collect `f(center_index, query)`.
    ///
    /// Queries run in parallel when the `parallel` feature is enabled. Results are
    /// returned in center order either way.
    pub fn query_batch<P, R, F>(
        &self,
        centers: &[P],
        radius: f32,
        f: F,
    ) -> Result<Vec<R>, HashGridError>
    where
        P: Point3Like + Copy + Sync,
        R: Send,
        F: Fn(usize, HashGridQuery<'a>) -> R + Sync + Send,
    {
        maybe_par_iter!(centers)
            .enumerate()
            .map(|(i, &center)| self.query(center, radius).map(|q| f(i, q)))
            .collect()
    }
}

impl<'a> HashGridQuery<'a> {
    /// Emit the next candidate's original index, or `None` once the walk is done.
    ///
    /// Once `None` has been returned, every further call returns `None`.
    pub fn next_candidate(&mut self) -> Option<i32> {
        self.started = true;
        loop {
            if self.cell_index < self.cell_end {
                let idx = self.grid.point_ids[self.cell_index as usize];
                self.cell_index += 1;
                return Some(idx);
            }
            if self.exhausted || !self.advance() {
                self.exhausted = true;
                return None;
            }
            let (cell_index, cell_end) = self.grid.cell_slots(self.grid.cell_index(self.cursor));
            self.cell_index = cell_index;
            self.cell_end = cell_end;
        }
    }

    /// Step the virtual cursor (x fastest, then y, then z). Returns false past the box.
    #[inline]
    fn advance(&mut self) -> bool {
        if self.cursor.x < self.end.x {
            self.cursor.x += 1;
            return true;
        }
        self.cursor.x = self.start.x;
        if self.cursor.y < self.end.y {
            self.cursor.y += 1;
            return true;
        }
        self.cursor.y = self.start.y;
        if self.cursor.z < self.end.z {
            self.cursor.z += 1;
            return true;
        }
        false
    }

    pub fn state(&self) -> QueryState {
        if self.exhausted {
            QueryState::Exhausted
        } else if !self.started {
            QueryState::Fresh
        } else if self.cell_index < self.cell_end {
            QueryState::MidCell
        } else {
            QueryState::Advancing
        }
    }

    /// Inclusive virtual cell bounds `(start, end)` of the walk.
    #[inline]
    pub fn bounds(&self) -> (IVec3, IVec3) {
        (self.start, self.end)
    }

    /// Virtual cell currently being drained.
    #[inline]
    pub fn cursor(&self) -> IVec3 {
        self.cursor
    }

    /// Number of virtual cells in the walked box.
    pub fn num_cells(&self) -> usize {
        let extent = self.end - self.start + IVec3::ONE;
        extent.x as usize * extent.y as usize * extent.z as usize
    }
}

impl Iterator for HashGridQuery<'_> {
    type Item = i32;

    #[inline]
    fn next(&mut self) -> Option<i32> {
        self.next_candidate()
    }
}

impl FusedIterator for HashGridQuery<'_> {}

#[cfg(test)]
#[path = "query_tests.rs"]
mod query_tests;
