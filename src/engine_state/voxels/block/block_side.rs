//! # Block Side Module
//!
//! This module defines the six axis-aligned faces of a voxel and the geometry the
//! mesher needs for each of them: which neighbor a face looks at, where its quad
//! sits inside the cell, and which triangle winding makes it face outward.

use cgmath::{Point3, Vector3};
use num_derive::FromPrimitive;

/// Represents the six possible faces of a voxel block.
///
/// Each variant is assigned a stable integer value so faces can be stored compactly
/// and iterated in a fixed order.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive)]
pub enum BlockSide {
    /// Faces negative X
    NegX = 0,
    /// Faces positive X
    PosX = 1,
    /// Faces negative Y
    NegY = 2,
    /// Faces positive Y
    PosY = 3,
    /// Faces negative Z
    NegZ = 4,
    /// Faces positive Z
    PosZ = 5,
}

/// One of the two fixed triangle orders used for a quad.
///
/// A face quad always stores its corners as `origin`, `origin + u`, `origin + v`,
/// `origin + u + v`. `Left` produces triangles whose counter-clockwise normal is
/// `u × v`, `Right` produces `v × u`.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Winding {
    Right,
    Left,
}

impl Winding {
    /// Vertex offsets (relative to the face's first vertex) for the two triangles.
    pub fn triangle_offsets(self) -> [u32; 6] {
        match self {
            Winding::Right => [0, 2, 3, 3, 1, 0],
            Winding::Left => [0, 1, 2, 2, 1, 3],
        }
    }
}

impl BlockSide {
    /// Returns all six faces in mesh order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::NegX,
            BlockSide::PosX,
            BlockSide::NegY,
            BlockSide::PosY,
            BlockSide::NegZ,
            BlockSide::PosZ,
        ]
    }

    /// Converts a stored face index back into a side.
    pub fn from_index(index: u8) -> Option<Self> {
        num_traits::FromPrimitive::from_u8(index)
    }

    /// The offset from a cell to the neighbor this face borders.
    pub fn neighbor_offset(self) -> Vector3<i32> {
        match self {
            BlockSide::NegX => Vector3::new(-1, 0, 0),
            BlockSide::PosX => Vector3::new(1, 0, 0),
            BlockSide::NegY => Vector3::new(0, -1, 0),
            BlockSide::PosY => Vector3::new(0, 1, 0),
            BlockSide::NegZ => Vector3::new(0, 0, -1),
            BlockSide::PosZ => Vector3::new(0, 0, 1),
        }
    }

    /// The unit normal pointing out of the cell through this face.
    pub fn outward_normal(self) -> Vector3<f32> {
        self.neighbor_offset().cast::<f32>().unwrap_or(Vector3::new(0.0, 0.0, 0.0))
    }

    /// The neighbor cell of `(x, y, z)` across this face, or `None` when it lies
    /// outside a grid of edge length `dimension`.
    pub fn neighbor(self, x: usize, y: usize, z: usize, dimension: usize) -> Option<Point3<usize>> {
        let offset = self.neighbor_offset();
        let step = |value: usize, delta: i32| -> Option<usize> {
            let moved = value.checked_add_signed(delta as isize)?;
            (moved < dimension).then_some(moved)
        };
        Some(Point3::new(
            step(x, offset.x)?,
            step(y, offset.y)?,
            step(z, offset.z)?,
        ))
    }

    /// The four corners of this face for the cell at `(x, y, z)`, in quad order.
    pub fn quad_corners(self, x: usize, y: usize, z: usize) -> [Point3<f32>; 4] {
        let (x0, y0, z0) = (x as f32, y as f32, z as f32);
        let (x1, y1, z1) = (x0 + 1.0, y0 + 1.0, z0 + 1.0);
        match self {
            BlockSide::NegX => [
                Point3::new(x0, y0, z1),
                Point3::new(x0, y1, z1),
                Point3::new(x0, y0, z0),
                Point3::new(x0, y1, z0),
            ],
            BlockSide::PosX => [
                Point3::new(x1, y0, z1),
                Point3::new(x1, y1, z1),
                Point3::new(x1, y0, z0),
                Point3::new(x1, y1, z0),
            ],
            BlockSide::NegY => [
                Point3::new(x0, y0, z1),
                Point3::new(x1, y0, z1),
                Point3::new(x0, y0, z0),
                Point3::new(x1, y0, z0),
            ],
            BlockSide::PosY => [
                Point3::new(x0, y1, z1),
                Point3::new(x1, y1, z1),
                Point3::new(x0, y1, z0),
                Point3::new(x1, y1, z0),
            ],
            BlockSide::NegZ => [
                Point3::new(x1, y0, z0),
                Point3::new(x1, y1, z0),
                Point3::new(x0, y0, z0),
                Point3::new(x0, y1, z0),
            ],
            BlockSide::PosZ => [
                Point3::new(x1, y0, z1),
                Point3::new(x1, y1, z1),
                Point3::new(x0, y0, z1),
                Point3::new(x0, y1, z1),
            ],
        }
    }

    /// The winding that makes this face's triangles point away from the cell.
    pub fn winding(self) -> Winding {
        match self {
            BlockSide::NegX | BlockSide::PosY | BlockSide::PosZ => Winding::Left,
            BlockSide::PosX | BlockSide::NegY | BlockSide::NegZ => Winding::Right,
        }
    }
}
