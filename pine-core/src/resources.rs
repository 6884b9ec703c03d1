//! Read-only rendering resources shared by every node of a tree.

use std::f32::consts::TAU;

use glam::Vec3;

/// A closed cylinder centered on the origin whose growth axis is local `+Y`.
///
/// The side surface spans `y` in `[-height / 2, height / 2]`; the two end caps
/// close it at either end.
#[derive(Clone, Debug, PartialEq)]
pub struct CylinderGeometry {
    pub radius: f32,
    pub height: f32,
    pub radial_segments: u32,
}

/// Triangulated surface of a [`CylinderGeometry`].
///
/// Every vertex carries the normal of the surface it belongs to, so the cap
/// rims duplicate the side rims. `indices` are counter-clockwise when seen
/// from outside.
#[derive(Clone, Debug, Default)]
pub struct CylinderMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl CylinderGeometry {
    pub fn new(radius: f32, height: f32, radial_segments: u32) -> Self {
        Self {
            radius,
            height,
            radial_segments,
        }
    }

    /// Local-space position of the base of the growth axis.
    pub fn base(&self) -> Vec3 {
        Vec3::new(0.0, -self.height * 0.5, 0.0)
    }

    /// Local-space position of the tip of the growth axis.
    pub fn tip(&self) -> Vec3 {
        Vec3::new(0.0, self.height * 0.5, 0.0)
    }

    /// Tessellates the side into `radial_segments` quads and each end cap
    /// into a fan of `radial_segments` triangles.
    ///
    /// Fewer than three segments cannot enclose anything, so the count is
    /// clamped up to three.
    pub fn mesh(&self) -> CylinderMesh {
        let segments = self.radial_segments.max(3);
        let half = self.height * 0.5;
        let rims: Vec<Vec3> = (0..segments)
            .map(|s| {
                let theta = s as f32 / segments as f32 * TAU;
                Vec3::new(theta.sin(), 0.0, theta.cos())
            })
            .collect();

        let n = segments as usize;
        let mut mesh = CylinderMesh {
            positions: Vec::with_capacity(4 * n + 2),
            normals: Vec::with_capacity(4 * n + 2),
            indices: Vec::with_capacity(12 * n),
        };

        for &normal in &rims {
            let rim = normal * self.radius;
            mesh.push(rim - Vec3::Y * half, normal);
            mesh.push(rim + Vec3::Y * half, normal);
        }
        for s in 0..segments {
            let next = (s + 1) % segments;
            let (b0, t0) = (2 * s, 2 * s + 1);
            let (b1, t1) = (2 * next, 2 * next + 1);
            mesh.indices.extend_from_slice(&[b0, b1, t0, t0, b1, t1]);
        }

        for (y, normal) in [(half, Vec3::Y), (-half, Vec3::NEG_Y)] {
            let center = mesh.push(Vec3::new(0.0, y, 0.0), normal);
            let first = center + 1;
            for &dir in &rims {
                mesh.push(dir * self.radius + Vec3::new(0.0, y, 0.0), normal);
            }
            for s in 0..segments {
                let (a, b) = (first + s, first + (s + 1) % segments);
                // The fan around the bottom cap runs the other way to face -Y.
                if normal.y > 0.0 {
                    mesh.indices.extend_from_slice(&[center, a, b]);
                } else {
                    mesh.indices.extend_from_slice(&[center, b, a]);
                }
            }
        }

        mesh
    }
}

impl CylinderMesh {
    /// Appends a vertex and returns its index.
    fn push(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        index
    }
}

/// Surface appearance of a branch.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: [u8; 3],
    pub roughness: f32,
    pub metalness: f32,
}

impl Material {
    pub fn new(color: [u8; 3], roughness: f32, metalness: f32) -> Self {
        Self {
            color,
            roughness,
            metalness,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new([0x00, 0xff, 0x00], 0.5, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_has_side_quads_and_cap_fans() {
        let geometry = CylinderGeometry::new(1.0, 10.0, 8);
        let mesh = geometry.mesh();

        // 16 side vertices, then a center and 8 rim vertices per cap.
        assert_eq!(mesh.positions.len(), 16 + 2 * 9);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert_eq!(mesh.indices.len(), 8 * 6 + 2 * 8 * 3);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.positions.len()));
    }

    #[test]
    fn mesh_vertices_lie_on_the_surface() {
        let geometry = CylinderGeometry::new(2.0, 6.0, 12);
        let mesh = geometry.mesh();

        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            let radial = Vec3::new(p.x, 0.0, p.z).length();
            assert!((n.length() - 1.0).abs() < 1e-5);
            if n.y == 0.0 {
                assert!((radial - 2.0).abs() < 1e-5);
                assert!((p.y.abs() - 3.0).abs() < 1e-5);
            } else {
                // Cap vertex: on the end plane its normal points out of.
                assert!((p.y - 3.0 * n.y).abs() < 1e-5);
                assert!(radial < 2.0 + 1e-5);
            }
        }
    }

    #[test]
    fn mesh_winding_faces_outward() {
        let mesh = CylinderGeometry::new(1.0, 4.0, 16).mesh();

        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.positions[i as usize]);
            let face = (b - a).cross(c - a);
            assert!(face.dot(mesh.normals[tri[0] as usize]) > 0.0);
        }
    }

    #[test]
    fn mesh_closes_both_ends() {
        let mesh = CylinderGeometry::new(1.0, 4.0, 16).mesh();

        let area_facing = |dir: Vec3| -> f32 {
            mesh.indices
                .chunks_exact(3)
                .map(|tri| {
                    let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.positions[i as usize]);
                    (b - a).cross(c - a).dot(dir).max(0.0) * 0.5
                })
                .sum()
        };

        // Each cap is a 16-gon inscribed in the unit circle.
        let polygon = 0.5 * 16.0 * (TAU / 16.0).sin();
        assert!((area_facing(Vec3::Y) - polygon).abs() < 1e-4);
        assert!((area_facing(Vec3::NEG_Y) - polygon).abs() < 1e-4);
    }

    #[test]
    fn degenerate_segment_count_is_clamped() {
        let mesh = CylinderGeometry::new(1.0, 1.0, 1).mesh();
        assert_eq!(mesh.indices.len(), 3 * 6 + 2 * 3 * 3);
    }

    #[test]
    fn base_and_tip_span_the_height() {
        let geometry = CylinderGeometry::new(1.0, 200.0, 32);
        assert_eq!(geometry.base(), Vec3::new(0.0, -100.0, 0.0));
        assert_eq!(geometry.tip(), Vec3::new(0.0, 100.0, 0.0));
    }
}
