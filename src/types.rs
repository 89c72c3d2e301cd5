//! Core point types accepted by the grid.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// A point in ℝ³.
///
/// `#[repr(C)]` with a stable layout so point buffers can be cast to and from
/// raw `f32` slices (see [`bytemuck::cast_slice`]).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create from any type implementing `Point3Like`.
    #[inline]
    pub fn from_like<P: Point3Like>(p: &P) -> Self {
        Self::new(p.x(), p.y(), p.z())
    }

    #[inline]
    pub fn to_glam(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Squared Euclidean distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Self) -> f32 {
        self.to_glam().distance_squared(other.to_glam())
    }

    /// Chebyshev (L∞) distance to another point.
    #[inline]
    pub fn distance_linf(self, other: Self) -> f32 {
        (self.to_glam() - other.to_glam()).abs().max_element()
    }
}

impl From<[f32; 3]> for Point3 {
    #[inline]
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Point3> for [f32; 3] {
    #[inline]
    fn from(p: Point3) -> Self {
        [p.x, p.y, p.z]
    }
}

impl From<Vec3> for Point3 {
    #[inline]
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Point3> for Vec3 {
    #[inline]
    fn from(p: Point3) -> Vec3 {
        p.to_glam()
    }
}

/// Trait for types that can be used as input points.
///
/// This allows zero-copy input from various math libraries.
pub trait Point3Like {
    fn x(&self) -> f32;
    fn y(&self) -> f32;
    fn z(&self) -> f32;

    #[inline]
    fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.x(), self.y(), self.z())
    }
}

impl Point3Like for Point3 {
    #[inline]
    fn x(&self) -> f32 {
        self.x
    }
    #[inline]
    fn y(&self) -> f32 {
        self.y
    }
    #[inline]
    fn z(&self) -> f32 {
        self.z
    }
}

impl Point3Like for Vec3 {
    #[inline]
    fn x(&self) -> f32 {
        self.x
    }
    #[inline]
    fn y(&self) -> f32 {
        self.y
    }
    #[inline]
    fn z(&self) -> f32 {
        self.z
    }
    #[inline]
    fn to_vec3(&self) -> Vec3 {
        *self
    }
}

impl Point3Like for [f32; 3] {
    #[inline]
    fn x(&self) -> f32 {
        self[0]
    }
    #[inline]
    fn y(&self) -> f32 {
        self[1]
    }
    #[inline]
    fn z(&self) -> f32 {
        self[2]
    }
}

impl Point3Like for (f32, f32, f32) {
    #[inline]
    fn x(&self) -> f32 {
        self.0
    }
    #[inline]
    fn y(&self) -> f32 {
        self.1
    }
    #[inline]
    fn z(&self) -> f32 {
        self.2
    }
}
