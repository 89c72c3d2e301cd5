//! Opaque integer handles for grids.
//!
//! Foreign-call shims and kernel launchers often can only pass plain integers.
//! A [`GridRegistry`] owns grids and hands out [`GridId`]s that resolve back to
//! the same [`HashGridView`] in-process code uses, so handle-based and typed
//! callers observe identical grids.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::{HashGrid, HashGridError, HashGridQuery, HashGridView, Point3Like};

/// Opaque handle to a grid owned by a [`GridRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(u64);

impl GridId {
    /// Raw integer form, for passing across a foreign-call boundary.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Rebuild a handle from its raw form. Resolution is checked by the registry.
    #[inline]
    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owner of handle-addressed grids.
///
/// Ids are never reused, so a stale handle resolves to `UnknownGrid` rather
/// than to a different grid.
#[derive(Debug, Default)]
pub struct GridRegistry {
    grids: FxHashMap<u64, HashGrid>,
    next_id: u64,
}

impl GridRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `grid` and return its handle.
    pub fn insert(&mut self, grid: HashGrid) -> GridId {
        self.next_id += 1;
        let id = self.next_id;
        log::trace!(
            "registered hash grid #{} ({} points, {} cells)",
            id,
            grid.num_points(),
            grid.num_cells()
        );
        self.grids.insert(id, grid);
        GridId(id)
    }

    /// Drop the handle and return the grid it named.
    pub fn remove(&mut self, id: GridId) -> Option<HashGrid> {
        self.grids.remove(&id.0)
    }

    pub fn get(&self, id: GridId) -> Result<&HashGrid, HashGridError> {
        self.grids.get(&id.0).ok_or(HashGridError::UnknownGrid(id))
    }

    /// Mutable access, e.g. to rebuild the grid between simulation steps.
    pub fn get_mut(&mut self, id: GridId) -> Result<&mut HashGrid, HashGridError> {
        self.grids
            .get_mut(&id.0)
            .ok_or(HashGridError::UnknownGrid(id))
    }

    pub fn view(&self, id: GridId) -> Result<HashGridView<'_>, HashGridError> {
        self.get(id).map(HashGrid::view)
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

/// Begin a candidate query on the grid named by `id`.
pub fn query_by_id<P: Point3Like>(
    registry: &GridRegistry,
    id: GridId,
    pos: P,
    radius: f32,
) -> Result<HashGridQuery<'_>, HashGridError> {
    registry.view(id)?.query(pos, radius)
}

/// Original index of the point at sorted `slot` in the grid named by `id`.
pub fn point_id_by_id(
    registry: &GridRegistry,
    id: GridId,
    slot: usize,
) -> Result<Option<i32>, HashGridError> {
    Ok(registry.view(id)?.get_point_id(slot))
}
