//! Vertex data handed to the rendering collaborator.

use cgmath::{Point3, Vector3};

/// A single mesh vertex.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes)
/// - Normal: [f32; 3] (12 bytes)
/// - UV: [f32; 2] (8 bytes)
///
/// Total size: 32 bytes. The struct is `Pod`, so a vertex buffer can be uploaded
/// with `bytemuck::cast_slice` without any conversion.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, uv: [f32; 2]) -> Self {
        Vertex {
            position: position.into(),
            normal: normal.into(),
            uv,
        }
    }

    pub fn position(&self) -> Point3<f32> {
        Point3::from(self.position)
    }

    pub fn normal(&self) -> Vector3<f32> {
        Vector3::from(self.normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        let vertex = Vertex::new(
            Point3::new(1.0, 2.0, 3.0),
            Vector3::new(0.0, 0.0, 1.0),
            [1.0, 0.0],
        );
        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 32);
        assert_eq!(vertex.position(), Point3::new(1.0, 2.0, 3.0));
    }
}
