//! Cell indexing: world coordinates → virtual cells → physical cells.

use glam::{IVec3, Vec3};

use super::{GridDims, Quantization};

/// Bias applied to virtual coordinates before folding.
///
/// Every valid grid dimension divides it, so the bias never changes the folded cell.
pub(crate) const ORIGIN: i32 = 1 << 24;

/// Quantize a world-space point to its virtual cell.
///
/// Out-of-range products saturate to `i32::MIN`/`i32::MAX`.
#[inline]
pub(crate) fn quantize(p: Vec3, cell_width_inv: f32, mode: Quantization) -> IVec3 {
    let scaled = p * cell_width_inv;
    match mode {
        Quantization::Floor => scaled.floor().as_ivec3(),
        Quantization::Truncate => scaled.as_ivec3(),
    }
}

#[inline(always)]
fn fold_axis(v: i32, dim: i32) -> i32 {
    // Two's complement keeps the low bits of a wrapped sum, so the mask is exact
    // even for virtual coordinates within 2^24 of i32::MAX.
    v.wrapping_add(ORIGIN) & (dim - 1)
}

/// Fold a virtual cell onto the physical grid and linearize it (x fastest).
#[inline]
pub(crate) fn fold(v: IVec3, dims: GridDims) -> i32 {
    let cx = fold_axis(v.x, dims.x);
    let cy = fold_axis(v.y, dims.y);
    let cz = fold_axis(v.z, dims.z);
    cz * (dims.x * dims.y) + cy * dims.x + cx
}
