// GPU vertex layouts and the small fixed meshes (axis indicator, debug cube).
// The height-field surface lives in surface.rs.
//
// Every mesh here is a flat, unindexed triangle or line list: one vertex entry per
// primitive corner, uploaded to a VERTEX buffer as-is.

use glam::Vec3;

// ============================================================================
// GPU VERTICES
// ============================================================================

/// Height-field vertex.
///   @location(0) position:    vec3<f32>
///   @location(1) normal:      vec3<f32>
///   @location(2) barycentric: vec3<f32>
///   @location(3) color:       vec3<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SurfaceVertex {
    pub position:    [f32; 3],
    pub normal:      [f32; 3],
    pub barycentric: [f32; 3],
    pub color:       [f32; 3],
}

impl SurfaceVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x3,
        3 => Float32x3
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SurfaceVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Axis indicator vertex. `color_index` is 0, 1 or 2 for the x, y and z axis.
///   @location(0) position:    vec3<f32>
///   @location(1) color_index: f32
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AxisVertex {
    pub position:    [f32; 3],
    pub color_index: f32,
}

impl AxisVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<AxisVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

/// Flat-shaded vertex for the debug cube.
///   @location(0) position: vec3<f32>
///   @location(1) normal:   vec3<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubeVertex {
    pub position: [f32; 3],
    pub normal:   [f32; 3],
}

impl CubeVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

// ============================================================================
// BOUNDS
// ============================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn from_limits(xlim: (f32, f32), ylim: (f32, f32), zlim: (f32, f32)) -> Self {
        Self {
            min: Vec3::new(xlim.0, ylim.0, zlim.0),
            max: Vec3::new(xlim.1, ylim.1, zlim.1),
        }
    }

    pub fn size(&self) -> Vec3 { self.max - self.min }
}

// ============================================================================
// AXIS INDICATOR
// ============================================================================

/// Three line segments from the low corner of a bounding box along +X, +Y and +Z.
pub struct AxesMesh {
    pub vertices: Vec<AxisVertex>,
}

impl AxesMesh {
    pub fn from_bounds(bounds: &Bounds) -> Self {
        let origin = bounds.min;
        let ends = [
            Vec3::new(bounds.max.x, origin.y, origin.z),
            Vec3::new(origin.x, bounds.max.y, origin.z),
            Vec3::new(origin.x, origin.y, bounds.max.z),
        ];

        let vertices = ends.iter()
            .enumerate()
            .flat_map(|(axis, end)| {
                let color_index = axis as f32;
                [
                    AxisVertex { position: origin.to_array(), color_index },
                    AxisVertex { position: end.to_array(), color_index },
                ]
            })
            .collect();

        Self { vertices }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize { self.vertices.len() }
}

// ============================================================================
// DEBUG CUBE
// ============================================================================

/// Unit cube spanning [-1, 1] on every axis, CCW winding viewed from outside.
pub struct CubeMesh {
    pub vertices: Vec<CubeVertex>,
}

impl CubeMesh {
    pub fn new() -> Self {
        let corners = [
            Vec3::new(-1.0, -1.0,  1.0), Vec3::new( 1.0, -1.0,  1.0),
            Vec3::new( 1.0,  1.0,  1.0), Vec3::new(-1.0,  1.0,  1.0),
            Vec3::new(-1.0,  1.0, -1.0), Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new( 1.0, -1.0, -1.0), Vec3::new( 1.0,  1.0, -1.0),
        ];
        // two triangles per face, faces ordered to match FACE_NORMALS
        const TRIANGLES: [[usize; 3]; 12] = [
            [0, 2, 3], [0, 1, 2], // +Z
            [1, 7, 2], [1, 6, 7], // +X
            [6, 5, 4], [4, 7, 6], // -Z
            [3, 4, 5], [3, 5, 0], // -X
            [3, 7, 4], [3, 2, 7], // +Y
            [0, 6, 1], [0, 5, 6], // -Y
        ];
        const FACE_NORMALS: [Vec3; 6] = [Vec3::Z, Vec3::X, Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y];

        let vertices = TRIANGLES.iter()
            .enumerate()
            .flat_map(|(t, tri)| {
                let normal = FACE_NORMALS[t / 2].to_array();
                tri.map(|c| CubeVertex { position: corners[c].to_array(), normal })
            })
            .collect();

        Self { vertices }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize { self.vertices.len() }
}

impl Default for CubeMesh {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_strides_match_layouts() {
        assert_eq!(SurfaceVertex::desc().array_stride, 48);
        assert_eq!(AxisVertex::desc().array_stride, 16);
        assert_eq!(CubeVertex::desc().array_stride, 24);
        assert_eq!(SurfaceVertex::desc().attributes.len(), 4);
    }

    #[test]
    fn axes_run_from_low_corner() {
        let bounds = Bounds::from_limits((-5.0, 5.0), (-1.5, 1.5), (-4.0, 4.0));
        let axes = AxesMesh::from_bounds(&bounds);
        assert_eq!(axes.vertex_count(), 6);
        assert_eq!(axes.vertex_bytes().len(), 6 * 16);

        for (axis, pair) in axes.vertices.chunks(2).enumerate() {
            assert_eq!(pair[0].position, [-5.0, -1.5, -4.0]);
            assert_eq!(pair[0].color_index, axis as f32);
            assert_eq!(pair[1].color_index, axis as f32);
            let d = Vec3::from(pair[1].position) - Vec3::from(pair[0].position);
            // each segment moves along exactly one axis, by that axis' extent
            assert!((d[axis] - bounds.size()[axis]).abs() < 1e-6);
            assert_eq!(d.length(), d[axis]);
        }
    }

    #[test]
    fn cube_winding_matches_face_normals() {
        let cube = CubeMesh::new();
        assert_eq!(cube.vertex_count(), 36);
        for tri in cube.vertices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|v| Vec3::from(v.position));
            let geometric = (b - a).cross(c - a).normalize();
            assert!(geometric.abs_diff_eq(Vec3::from(tri[0].normal), 1e-6));
        }
    }
}
