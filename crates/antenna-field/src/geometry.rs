//! Antenna mesh for display: body cylinder, wide base and a sphere cap
//!
//! Purely visual. The field model does not read any of this geometry.

use crate::params::SimulationParameters;
use std::f32::consts::PI;

/// Triangle mesh for binary transfer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn add_vertex(&mut self, pos: [f32; 3], normal: [f32; 3]) -> u32 {
        let idx = (self.positions.len() / 3) as u32;
        self.positions.extend_from_slice(&pos);
        self.normals.extend_from_slice(&normal);
        idx
    }

    fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    fn merge(&mut self, other: &MeshData) {
        let offset = self.vertex_count() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|&idx| idx + offset));
    }

    fn translate_z(&mut self, dz: f32) {
        for z in self.positions.iter_mut().skip(2).step_by(3) {
            *z += dz;
        }
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let mut vertices = self.positions.chunks_exact(3);
        let first = vertices.next()?;
        let mut min = [first[0], first[1], first[2]];
        let mut max = min;
        for v in vertices {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }
        Some((min, max))
    }

    pub fn to_binary(&self) -> Vec<u8> {
        let num_vertices = self.vertex_count() as u32;
        let num_indices = self.indices.len() as u32;

        let mut data = Vec::with_capacity(8 + self.positions.len() * 8 + self.indices.len() * 4);
        data.extend_from_slice(&num_vertices.to_le_bytes());
        data.extend_from_slice(&num_indices.to_le_bytes());

        for &p in &self.positions {
            data.extend_from_slice(&p.to_le_bytes());
        }
        for &n in &self.normals {
            data.extend_from_slice(&n.to_le_bytes());
        }
        for &i in &self.indices {
            data.extend_from_slice(&i.to_le_bytes());
        }

        data
    }
}

const SEGMENTS: usize = 32;

/// Closed cylinder along z, base at z=0
fn procedural_cylinder(radius: f32, height: f32) -> MeshData {
    let mut mesh = MeshData::new();

    let mut bottom_ring = Vec::with_capacity(SEGMENTS);
    let mut top_ring = Vec::with_capacity(SEGMENTS);

    for i in 0..SEGMENTS {
        let angle = (i as f32 / SEGMENTS as f32) * 2.0 * PI;
        let (sin, cos) = angle.sin_cos();
        bottom_ring.push(mesh.add_vertex([radius * cos, radius * sin, 0.0], [cos, sin, 0.0]));
        top_ring.push(mesh.add_vertex([radius * cos, radius * sin, height], [cos, sin, 0.0]));
    }

    for i in 0..SEGMENTS {
        let next = (i + 1) % SEGMENTS;
        mesh.add_triangle(bottom_ring[i], bottom_ring[next], top_ring[next]);
        mesh.add_triangle(bottom_ring[i], top_ring[next], top_ring[i]);
    }

    // Caps get their own vertices so normals stay flat
    for (z, nz) in [(0.0, -1.0), (height, 1.0)] {
        let center = mesh.add_vertex([0.0, 0.0, z], [0.0, 0.0, nz]);
        let ring: Vec<u32> = (0..SEGMENTS)
            .map(|i| {
                let angle = (i as f32 / SEGMENTS as f32) * 2.0 * PI;
                mesh.add_vertex([radius * angle.cos(), radius * angle.sin(), z], [0.0, 0.0, nz])
            })
            .collect();
        for i in 0..SEGMENTS {
            let next = (i + 1) % SEGMENTS;
            if nz < 0.0 {
                mesh.add_triangle(center, ring[next], ring[i]);
            } else {
                mesh.add_triangle(center, ring[i], ring[next]);
            }
        }
    }

    mesh
}

/// Cylinder centred on z = `center_z`
fn centered_cylinder(radius: f32, height: f32, center_z: f32) -> MeshData {
    let mut mesh = procedural_cylinder(radius, height);
    mesh.translate_z(center_z - height / 2.0);
    mesh
}

fn procedural_sphere(radius: f32, center_z: f32) -> MeshData {
    let mut mesh = MeshData::new();
    let stacks = SEGMENTS / 2;
    let slices = SEGMENTS;

    let mut verts: Vec<Vec<u32>> = Vec::with_capacity(stacks + 1);

    for i in 0..=stacks {
        let phi = PI * (i as f32 / stacks as f32);
        let ring: Vec<u32> = (0..=slices)
            .map(|j| {
                let theta = 2.0 * PI * (j as f32 / slices as f32);
                let n = [phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos()];
                mesh.add_vertex([radius * n[0], radius * n[1], center_z + radius * n[2]], n)
            })
            .collect();
        verts.push(ring);
    }

    for i in 0..stacks {
        for j in 0..slices {
            let (v0, v1, v2, v3) = (verts[i][j], verts[i][j + 1], verts[i + 1][j + 1], verts[i + 1][j]);
            if i != 0 {
                mesh.add_triangle(v0, v1, v2);
            }
            if i != stacks - 1 {
                mesh.add_triangle(v0, v2, v3);
            }
        }
    }

    mesh
}

/// Antenna mesh for the given parameters. The body of length L is centred
/// on the origin, the base (3r wide, L/10 tall) sits at z = -L/20 and a
/// 1.5r sphere caps z = L.
pub fn build_antenna(params: &SimulationParameters) -> MeshData {
    let length = params.antenna_length as f32;
    let radius = params.antenna_radius as f32;

    let mut antenna = centered_cylinder(radius, length, 0.0);
    antenna.merge(&centered_cylinder(radius * 3.0, length / 10.0, -length / 20.0));
    antenna.merge(&procedural_sphere(radius * 1.5, length));
    antenna
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_antenna_bounds() {
        let params = SimulationParameters::default();
        let mesh = build_antenna(&params);
        let (min, max) = mesh.bounds().unwrap();

        // widest part is the base, 3r
        assert_abs_diff_eq!(max[0], 0.06, epsilon = 1e-5);
        assert_abs_diff_eq!(min[0], -0.06, epsilon = 1e-5);
        // body bottom at -L/2, sphere top at L + 1.5r
        assert_abs_diff_eq!(min[2], -0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(max[2], 1.03, epsilon = 1e-5);
    }

    #[test]
    fn test_indices_in_range() {
        let mesh = build_antenna(&SimulationParameters::default());
        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count));
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert_eq!(mesh.indices.len() % 3, 0);
    }

    #[test]
    fn test_mesh_scales_with_length() {
        let params = SimulationParameters {
            antenna_length: 2.0,
            ..Default::default()
        };
        let (_, max) = build_antenna(&params).bounds().unwrap();
        assert_abs_diff_eq!(max[2], 2.03, epsilon = 1e-5);
    }

    #[test]
    fn test_to_binary_layout() {
        let mesh = build_antenna(&SimulationParameters::default());
        let binary = mesh.to_binary();

        let vertices = u32::from_le_bytes([binary[0], binary[1], binary[2], binary[3]]) as usize;
        let indices = u32::from_le_bytes([binary[4], binary[5], binary[6], binary[7]]) as usize;
        assert_eq!(vertices, mesh.vertex_count());
        assert_eq!(indices, mesh.indices.len());
        assert_eq!(binary.len(), 8 + vertices * 24 + indices * 4);
    }

    #[test]
    fn test_empty_mesh_has_no_bounds() {
        assert!(MeshData::new().bounds().is_none());
    }
}
