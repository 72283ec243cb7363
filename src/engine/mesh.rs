// Procedural mesh types, primitives, and triangulation.
//
//   primitive builders / Heightmap::to_poly_mesh() → PolyMesh → triangulate_smooth() → RenderMesh → GPU
//
// Primitives are white and unit-sized where it makes sense; per-body colour and
// size come from the instance's tint and model matrix.

use glam::Vec3;

// ============================================================================
// GPU VERTEX
// ============================================================================

/// GPU-ready vertex:
///   @location(0) position: vec3<f32>
///   @location(1) normal:   vec3<f32>
///   @location(2) color:    vec3<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal:   [f32; 3],
    pub color:    [f32; 3],
}

impl GpuVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

// ============================================================================
// POLY MESH
// ============================================================================

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// Polygon mesh with n-gon faces and per-vertex colour.
/// Faces use CCW winding when viewed from outside.
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    pub positions: Vec<Vec3>,
    pub colors:    Vec<[f32; 3]>,
    pub faces:     Vec<Vec<usize>>,
}

impl PolyMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a white vertex and return its index.
    pub fn add_vertex(&mut self, pos: Vec3) -> usize {
        self.add_colored_vertex(pos, WHITE)
    }

    pub fn add_colored_vertex(&mut self, pos: Vec3, color: [f32; 3]) -> usize {
        let idx = self.positions.len();
        self.positions.push(pos);
        self.colors.push(color);
        idx
    }

    /// Add a face by vertex indices (CCW order).
    pub fn add_face(&mut self, indices: Vec<usize>) {
        debug_assert!(indices.len() >= 3, "Face must have at least 3 vertices");
        self.faces.push(indices);
    }

    pub fn vertex_count(&self) -> usize { self.positions.len() }
}

// ============================================================================
// RENDER MESH
// ============================================================================

/// Triangulated mesh ready for upload: VERTEX buffer from `vertex_bytes()`,
/// INDEX buffer from `index_bytes()`.
#[derive(Debug, Clone, Default)]
pub struct RenderMesh {
    pub vertices: Vec<GpuVertex>,
    pub indices:  Vec<u32>,
}

impl RenderMesh {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> usize  { self.indices.len() }
}

// ============================================================================
// TRIANGULATION + SMOOTH NORMALS
// ============================================================================

/// Fan-triangulate every face and give each shared vertex the area-weighted
/// average of its faces' normals. Unshared vertices (a cube's 24 corners)
/// come out flat-shaded.
pub fn triangulate_smooth(poly: &PolyMesh) -> RenderMesh {
    let mut normal_accum: Vec<Vec3> = vec![Vec3::ZERO; poly.vertex_count()];
    let mut indices: Vec<u32> = Vec::new();

    for face in &poly.faces {
        for i in 1..(face.len() - 1) {
            let (a, b, c) = (face[0], face[i], face[i + 1]);
            // Unnormalized: magnitude is twice the triangle area.
            let weighted = (poly.positions[b] - poly.positions[a])
                .cross(poly.positions[c] - poly.positions[a]);
            normal_accum[a] += weighted;
            normal_accum[b] += weighted;
            normal_accum[c] += weighted;
            indices.extend([a as u32, b as u32, c as u32]);
        }
    }

    let vertices = poly.positions.iter()
        .zip(&normal_accum)
        .zip(&poly.colors)
        .map(|((pos, n), color)| GpuVertex {
            position: pos.to_array(),
            normal:   n.normalize_or_zero().to_array(),
            color:    *color,
        })
        .collect();

    RenderMesh { vertices, indices }
}

// ============================================================================
// PRIMITIVES
// ============================================================================

/// Latitude/longitude sphere centred on the origin.
pub fn uv_sphere(radius: f32, segments: usize, rings: usize) -> PolyMesh {
    let mut mesh = PolyMesh::new();
    let row = segments + 1;
    for i in 0..=rings {
        let theta = std::f32::consts::PI * i as f32 / rings as f32;
        for j in 0..=segments {
            let phi = std::f32::consts::TAU * j as f32 / segments as f32;
            mesh.add_vertex(Vec3::new(
                radius * theta.sin() * phi.cos(),
                radius * theta.cos(),
                radius * theta.sin() * phi.sin(),
            ));
        }
    }
    for i in 0..rings {
        for j in 0..segments {
            let a = i * row + j;
            let b = (i + 1) * row + j;
            mesh.add_face(vec![a, a + 1, b + 1, b]);
        }
    }
    mesh
}

/// Axis-aligned cube of edge 1, four vertices per face so edges stay sharp.
pub fn unit_cube() -> PolyMesh {
    let mut mesh = PolyMesh::new();
    // (normal, u, v) with u × v = normal so the corner order is CCW from outside.
    let faces = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];
    for (n, u, v) in faces {
        let c = n * 0.5;
        let corners = [c - (u + v) * 0.5, c + (u - v) * 0.5, c + (u + v) * 0.5, c + (v - u) * 0.5];
        let base = mesh.vertex_count();
        for p in corners {
            mesh.add_vertex(p);
        }
        mesh.add_face(vec![base, base + 1, base + 2, base + 3]);
    }
    mesh
}

/// Cone along +Y, centred on its mid-height; the apex is the nose.
pub fn cone(radius: f32, height: f32, sides: usize) -> PolyMesh {
    let mut mesh = PolyMesh::new();
    let half = height * 0.5;
    let ring = |mesh: &mut PolyMesh| -> Vec<usize> {
        (0..sides)
            .map(|j| {
                let phi = std::f32::consts::TAU * j as f32 / sides as f32;
                mesh.add_vertex(Vec3::new(radius * phi.cos(), -half, radius * phi.sin()))
            })
            .collect()
    };

    let side_ring = ring(&mut mesh);
    let apex = mesh.add_vertex(Vec3::new(0.0, half, 0.0));
    for j in 0..sides {
        mesh.add_face(vec![side_ring[j], apex, side_ring[(j + 1) % sides]]);
    }
    // Separate base vertices so the cap does not smooth into the sides.
    let base_ring = ring(&mut mesh);
    mesh.add_face(base_ring);
    mesh
}

/// Flat square in the XZ plane facing +Y.
pub fn plane(size: f32) -> PolyMesh {
    let h = size * 0.5;
    let mut mesh = PolyMesh::new();
    let a = mesh.add_vertex(Vec3::new(-h, 0.0, -h));
    let b = mesh.add_vertex(Vec3::new(-h, 0.0, h));
    let c = mesh.add_vertex(Vec3::new(h, 0.0, h));
    let d = mesh.add_vertex(Vec3::new(h, 0.0, -h));
    mesh.add_face(vec![a, b, c, d]);
    mesh
}
