//! CPU-side mesh data and procedural geometry.
//!
//! These meshes are staging data: a GPU backend packs `vertices` and `indices_u32` into
//! vertex/index buffers. Winding is counter-clockwise for front faces.

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::{Mat3, Mat4, Vec3};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct CpuMesh {
    pub vertices: Vec<CpuVertex>,
    pub indices_u32: Vec<u32>,
}

impl CpuMesh {
    pub fn new(vertices: Vec<CpuVertex>, indices_u32: Vec<u32>) -> Self {
        Self {
            vertices,
            indices_u32,
        }
    }

    /// Build from separate attribute streams.
    ///
    /// Missing indices mean a non-indexed triangle list. Missing normals are recomputed from
    /// the faces; missing uvs are zero.
    pub fn from_attributes(
        positions: Vec<[f32; 3]>,
        normals: Option<Vec<[f32; 3]>>,
        uvs: Option<Vec<[f32; 2]>>,
        indices: Option<Vec<u32>>,
    ) -> Self {
        let has_normals = normals
            .as_ref()
            .is_some_and(|n| n.len() == positions.len());
        let normals = normals.unwrap_or_default();
        let uvs = uvs.unwrap_or_default();

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, &pos)| CpuVertex {
                pos,
                normal: if has_normals { normals[i] } else { [0.0; 3] },
                uv: uvs.get(i).copied().unwrap_or([0.0; 2]),
            })
            .collect();

        let indices = indices.unwrap_or_else(|| (0..positions.len() as u32).collect());
        let mut mesh = Self::new(vertices, indices);
        if !has_normals {
            mesh.compute_vertex_normals();
        }
        mesh
    }

    pub fn index_count(&self) -> u32 {
        self.indices_u32.len() as u32
    }

    #[cfg(test)]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn triangle_count(&self) -> u32 {
        self.index_count() / 3
    }

    /// Bake a transform into positions and normals.
    pub fn apply_matrix(&mut self, m: Mat4) {
        let normal_matrix = Mat3::from_mat4(m).inverse().transpose();
        for v in &mut self.vertices {
            v.pos = m.transform_point3(Vec3::from(v.pos)).to_array();
            v.normal = (normal_matrix * Vec3::from(v.normal))
                .normalize_or_zero()
                .to_array();
        }
    }

    /// Area-weighted smooth normals from the index buffer.
    pub fn compute_vertex_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.indices_u32.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= acc.len() || b >= acc.len() || c >= acc.len() {
                continue;
            }
            let pa = Vec3::from(self.vertices[a].pos);
            let pb = Vec3::from(self.vertices[b].pos);
            let pc = Vec3::from(self.vertices[c].pos);
            let n = (pb - pa).cross(pc - pa);
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }

        for (v, n) in self.vertices.iter_mut().zip(acc) {
            v.normal = n.normalize_or_zero().to_array();
        }
    }
}

/// Procedural mesh constructors.
pub struct MeshFactory;

impl MeshFactory {
    /// Flat annulus in the XY plane facing +Z.
    pub fn ring(inner_radius: f32, outer_radius: f32, theta_segments: u32) -> CpuMesh {
        let theta_segments = theta_segments.max(3);
        let phi_segments = 1;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        let radius_step = (outer_radius - inner_radius) / phi_segments as f32;
        for j in 0..=phi_segments {
            let radius = inner_radius + j as f32 * radius_step;
            for i in 0..=theta_segments {
                let angle = i as f32 / theta_segments as f32 * TAU;
                let (x, y) = (radius * angle.cos(), radius * angle.sin());
                vertices.push(CpuVertex {
                    pos: [x, y, 0.0],
                    normal: [0.0, 0.0, 1.0],
                    uv: [(x / outer_radius + 1.0) / 2.0, (y / outer_radius + 1.0) / 2.0],
                });
            }
        }

        for j in 0..phi_segments {
            let base = j * (theta_segments + 1);
            for i in 0..theta_segments {
                let a = base + i;
                let b = a + theta_segments + 1;
                let c = a + theta_segments + 2;
                let d = a + 1;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        CpuMesh::new(vertices, indices)
    }

    /// Filled disc in the XY plane facing +Z.
    pub fn circle(radius: f32, segments: u32) -> CpuMesh {
        let segments = segments.max(3);

        let mut vertices = vec![CpuVertex {
            pos: [0.0; 3],
            normal: [0.0, 0.0, 1.0],
            uv: [0.5, 0.5],
        }];
        for s in 0..=segments {
            let angle = s as f32 / segments as f32 * TAU;
            let (cx, cy) = (angle.cos(), angle.sin());
            vertices.push(CpuVertex {
                pos: [radius * cx, radius * cy, 0.0],
                normal: [0.0, 0.0, 1.0],
                uv: [(cx + 1.0) / 2.0, (cy + 1.0) / 2.0],
            });
        }

        let indices = (1..=segments).flat_map(|i| [i, i + 1, 0]).collect();

        CpuMesh::new(vertices, indices)
    }

    /// Torus around the Z axis.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> CpuMesh {
        let radial = radial_segments.max(3);
        let tubular = tubular_segments.max(3);

        let mut vertices = Vec::with_capacity(((radial + 1) * (tubular + 1)) as usize);
        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            for i in 0..=tubular {
                let u = i as f32 / tubular as f32 * TAU;
                let pos = Vec3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
                vertices.push(CpuVertex {
                    pos: pos.to_array(),
                    normal: (pos - center).normalize_or_zero().to_array(),
                    uv: [i as f32 / tubular as f32, j as f32 / radial as f32],
                });
            }
        }

        let mut indices = Vec::with_capacity((radial * tubular * 6) as usize);
        for j in 1..=radial {
            for i in 1..=tubular {
                let a = (tubular + 1) * j + i - 1;
                let b = (tubular + 1) * (j - 1) + i - 1;
                let c = (tubular + 1) * (j - 1) + i;
                let d = (tubular + 1) * j + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        CpuMesh::new(vertices, indices)
    }

    /// Icosphere. `detail` 0 is the plain 20-face icosahedron; each further level splits
    /// every face in four and pushes new vertices onto the sphere.
    pub fn icosahedron(radius: f32, detail: u32) -> CpuMesh {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let mut points: Vec<Vec3> = [
            [-1.0, t, 0.0],
            [1.0, t, 0.0],
            [-1.0, -t, 0.0],
            [1.0, -t, 0.0],
            [0.0, -1.0, t],
            [0.0, 1.0, t],
            [0.0, -1.0, -t],
            [0.0, 1.0, -t],
            [t, 0.0, -1.0],
            [t, 0.0, 1.0],
            [-t, 0.0, -1.0],
            [-t, 0.0, 1.0],
        ]
        .iter()
        .map(|&p| Vec3::from(p).normalize())
        .collect();

        #[rustfmt::skip]
        let mut faces: Vec<[u32; 3]> = vec![
            [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
            [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
            [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
            [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
        ];

        for _ in 0..detail {
            let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
            let mut midpoint = |a: u32, b: u32, points: &mut Vec<Vec3>| -> u32 {
                let key = (a.min(b), a.max(b));
                *midpoints.entry(key).or_insert_with(|| {
                    let m = ((points[a as usize] + points[b as usize]) * 0.5).normalize();
                    points.push(m);
                    (points.len() - 1) as u32
                })
            };

            let mut next = Vec::with_capacity(faces.len() * 4);
            for [a, b, c] in faces {
                let ab = midpoint(a, b, &mut points);
                let bc = midpoint(b, c, &mut points);
                let ca = midpoint(c, a, &mut points);
                next.extend_from_slice(&[[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
            }
            faces = next;
        }

        let vertices = points
            .iter()
            .map(|&p| {
                let u = 0.5 + p.z.atan2(p.x) / TAU;
                let v = 0.5 + p.y.asin() / std::f32::consts::PI;
                CpuVertex {
                    pos: (p * radius).to_array(),
                    normal: p.to_array(),
                    uv: [u, v],
                }
            })
            .collect();

        CpuMesh::new(vertices, faces.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ring_has_expected_topology() {
        let ring = MeshFactory::ring(0.15, 0.2, 32);

        assert_eq!(ring.vertex_count(), 2 * 33);
        assert_eq!(ring.triangle_count(), 64);

        let radii: Vec<f32> = ring
            .vertices
            .iter()
            .map(|v| Vec3::from(v.pos).length())
            .collect();
        assert!(radii.iter().all(|&r| (0.15 - 1e-5..=0.2 + 1e-5).contains(&r)));
    }

    #[test]
    fn laying_the_ring_flat_turns_its_normal_up() {
        let mut ring = MeshFactory::ring(0.15, 0.2, 32);
        ring.apply_matrix(Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2));

        for v in &ring.vertices {
            assert_relative_eq!(v.pos[1], 0.0, epsilon = 1e-6);
            assert!(Vec3::from(v.normal).abs_diff_eq(Vec3::Y, 1e-6));
        }
    }

    #[test]
    fn icosahedron_detail_levels() {
        let base = MeshFactory::icosahedron(0.35, 0);
        assert_eq!(base.vertex_count(), 12);
        assert_eq!(base.triangle_count(), 20);

        let refined = MeshFactory::icosahedron(0.35, 1);
        assert_eq!(refined.vertex_count(), 42);
        assert_eq!(refined.triangle_count(), 80);

        for v in &refined.vertices {
            assert_relative_eq!(Vec3::from(v.pos).length(), 0.35, epsilon = 1e-5);
        }
    }

    #[test]
    fn torus_and_circle_counts() {
        let torus = MeshFactory::torus(0.25, 0.09, 16, 100);
        assert_eq!(torus.vertex_count(), 17 * 101);
        assert_eq!(torus.triangle_count(), 16 * 100 * 2);

        let circle = MeshFactory::circle(0.3, 64);
        assert_eq!(circle.vertex_count(), 66);
        assert_eq!(circle.triangle_count(), 64);
    }

    #[test]
    fn from_attributes_fills_missing_normals_and_indices() {
        let mesh = CpuMesh::from_attributes(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
            None,
            None,
        );

        assert_eq!(mesh.indices_u32, vec![0, 1, 2]);
        for v in &mesh.vertices {
            assert!(Vec3::from(v.normal).abs_diff_eq(Vec3::Z, 1e-6));
        }
    }
}
