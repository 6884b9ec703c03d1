//! Draws a [`PineTree`] into an egui painter.
//!
//! Branch cylinders are transformed and projected on the CPU, shaded per
//! facet, sorted back to front and submitted as one [`egui::Mesh`]. Trees too
//! large for that fall back to one line per branch.

use egui::{Color32, Pos2, Stroke};
use glam::{Mat4, Vec3};
use pine_core::{PineTree, resources::CylinderMesh, resources::Material};

use crate::camera::OrbitCamera;

const AMBIENT: f32 = 0.2;

#[derive(Clone, Copy, Debug)]
pub struct DirectionalLight {
    /// Unit vector pointing towards the light.
    pub dir: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            dir: Vec3::new(0.0, 1.0, 1.0).normalize(),
            intensity: 1.0,
        }
    }
}

struct Facet {
    depth: f32,
    points: [Pos2; 3],
    color: Color32,
}

pub struct Frame {
    pub rect: egui::Rect,
    pub view_proj: Mat4,
    pub eye: Vec3,
    pub light: DirectionalLight,
}

/// Blinn-Phong approximation of the branch material.
pub fn shade(material: &Material, normal: Vec3, to_eye: Vec3, light: &DirectionalLight) -> Color32 {
    let base = Vec3::new(
        material.color[0] as f32,
        material.color[1] as f32,
        material.color[2] as f32,
    ) / 255.0;

    let diffuse = normal.dot(light.dir).max(0.0) * light.intensity;
    let half = (light.dir + to_eye).normalize_or_zero();
    let shininess = 2.0 + (1.0 - material.roughness) * 62.0;
    let specular = normal.dot(half).max(0.0).powf(shininess)
        * (1.0 - material.roughness)
        * light.intensity;

    let lit = base * (AMBIENT + diffuse * (1.0 - 0.5 * material.metalness))
        + Vec3::splat(specular * material.metalness.max(0.04));
    let c = (lit.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    Color32::from_rgb(c.x as u8, c.y as u8, c.z as u8)
}

/// Number of triangles a full mesh render of `tree` would submit before culling.
pub fn triangle_estimate(tree: &PineTree, cylinder: &CylinderMesh) -> usize {
    tree.len() * cylinder.indices.len() / 3
}

/// Shaded, depth-sorted mesh of every branch.
///
/// `cylinder` is the tessellation of the geometry the whole tree shares.
pub fn tree_mesh(tree: &PineTree, cylinder: &CylinderMesh, frame: &Frame) -> egui::Mesh {
    let world = tree.world_transforms();
    let mut facets: Vec<Facet> = Vec::with_capacity(triangle_estimate(tree, cylinder) / 2);

    for (node, m) in tree.nodes.iter().zip(&world) {
        let positions: Vec<Vec3> = cylinder.positions.iter().map(|&p| m.transform_point3(p)).collect();

        for tri in cylinder.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
            let (pa, pb, pc) = (positions[a], positions[b], positions[c]);

            let normal = m
                .transform_vector3(cylinder.normals[a] + cylinder.normals[b] + cylinder.normals[c])
                .normalize_or_zero();
            let centroid = (pa + pb + pc) / 3.0;
            let to_eye = (frame.eye - centroid).normalize_or_zero();
            if normal.dot(to_eye) <= 0.0 {
                continue;
            }

            let project = |p: Vec3| OrbitCamera::project(&frame.view_proj, p, frame.rect);
            let (Some(qa), Some(qb), Some(qc)) = (project(pa), project(pb), project(pc)) else {
                continue;
            };

            facets.push(Facet {
                depth: (qa.depth + qb.depth + qc.depth) / 3.0,
                points: [qa.pos, qb.pos, qc.pos],
                color: shade(&node.material, normal, to_eye, &frame.light),
            });
        }
    }

    // Painter's algorithm: farthest first.
    facets.sort_by(|x, y| y.depth.total_cmp(&x.depth));

    let mut mesh = egui::Mesh::default();
    for f in &facets {
        let base = mesh.vertices.len() as u32;
        for p in f.points {
            mesh.colored_vertex(p, f.color);
        }
        mesh.add_triangle(base, base + 1, base + 2);
    }
    mesh
}

/// One line per branch from base to tip, far branches first.
pub fn tree_skeleton(tree: &PineTree, frame: &Frame) -> Vec<egui::Shape> {
    let world = tree.world_transforms();
    let mut segments: Vec<(f32, [Pos2; 2], Color32)> = Vec::with_capacity(tree.len());

    for (node, m) in tree.nodes.iter().zip(&world) {
        let base = m.transform_point3(node.geometry.base());
        let tip = m.transform_point3(node.geometry.tip());
        let (Some(a), Some(b)) = (
            OrbitCamera::project(&frame.view_proj, base, frame.rect),
            OrbitCamera::project(&frame.view_proj, tip, frame.rect),
        ) else {
            continue;
        };

        let axis = (tip - base).normalize_or_zero();
        let [r, g, bl] = node.material.color;
        let tint = 0.6 + 0.4 * axis.y.abs();
        let color = Color32::from_rgb(
            (r as f32 * tint) as u8,
            (g as f32 * tint) as u8,
            (bl as f32 * tint) as u8,
        );
        segments.push(((a.depth + b.depth) * 0.5, [a.pos, b.pos], color));
    }

    segments.sort_by(|x, y| y.0.total_cmp(&x.0));
    segments
        .into_iter()
        .map(|(_, points, color)| egui::Shape::line_segment(points, Stroke::new(1.0, color)))
        .collect()
}
