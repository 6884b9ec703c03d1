//! Ray casting against branch cylinders.
//!
//! Rays are carried into each node's local frame with the inverse of its
//! world matrix. The direction is not renormalized on the way, so the ray
//! parameter `t` means the same distance in both frames.

use glam::{Affine3A, Vec3};

use crate::{resources::CylinderGeometry, tree::PineTree, types::NodeId};

/// Hits closer than this are treated as self-intersections.
const T_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

/// Intersection with one cylinder, in that cylinder's local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalHit {
    pub t: f32,
    pub point: Vec3,
    /// Outward unit normal of the surface at `point`.
    pub normal: Vec3,
}

/// Nearest intersection of a world ray with a tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickHit {
    pub node: NodeId,
    /// Distance along the world ray.
    pub distance: f32,
    pub world_point: Vec3,
    pub local_point: Vec3,
    pub local_normal: Vec3,
}

impl Ray {
    /// Creates a ray with a unit direction. `dir` must be non-zero.
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize(),
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// The same ray expressed in the frame `m` maps into.
    pub fn transformed(&self, m: &Affine3A) -> Self {
        Self {
            origin: m.transform_point3(self.origin),
            dir: m.transform_vector3(self.dir),
        }
    }
}

/// Intersects `ray` with the closed cylinder described by `geometry`.
///
/// The side surface and both end caps are tested; the nearest hit in front
/// of the ray origin wins.
pub fn intersect_cylinder(ray: &Ray, geometry: &CylinderGeometry) -> Option<LocalHit> {
    let r = geometry.radius;
    let half = geometry.height * 0.5;
    let (o, d) = (ray.origin, ray.dir);

    let mut best: Option<LocalHit> = None;
    let mut consider = |t: f32, normal: Vec3| {
        if t > T_EPSILON && best.is_none_or(|b| t < b.t) {
            best = Some(LocalHit {
                t,
                point: ray.at(t),
                normal,
            });
        }
    };

    // Side: x^2 + z^2 = r^2 with |y| <= half.
    let a = d.x * d.x + d.z * d.z;
    if a > f32::EPSILON {
        let b = 2.0 * (o.x * d.x + o.z * d.z);
        let c = o.x * o.x + o.z * o.z - r * r;
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let sq = disc.sqrt();
            for t in [(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)] {
                let p = ray.at(t);
                if p.y.abs() <= half {
                    consider(t, Vec3::new(p.x, 0.0, p.z) / r);
                }
            }
        }
    }

    // Caps: y = +-half with x^2 + z^2 <= r^2.
    if d.y.abs() > f32::EPSILON {
        for (y, normal) in [(half, Vec3::Y), (-half, Vec3::NEG_Y)] {
            let t = (y - o.y) / d.y;
            let p = ray.at(t);
            if p.x * p.x + p.z * p.z <= r * r {
                consider(t, normal);
            }
        }
    }

    best
}

impl PineTree {
    /// Finds the nearest node hit by a world-space ray.
    ///
    /// ### Parameters
    /// - `ray` - World-space ray; its direction should be unit length so the
    ///   returned distance is in world units.
    ///
    /// ### Returns
    /// The closest [`PickHit`], with the hit point and outward normal also
    /// expressed in the hit node's local frame, or `None` on a miss.
    pub fn raycast(&self, ray: &Ray) -> Option<PickHit> {
        let world = self.world_transforms();
        let mut best: Option<PickHit> = None;

        for (id, node) in self.nodes.iter().enumerate() {
            let to_local = world[id].inverse();
            let local_ray = ray.transformed(&to_local);
            let Some(hit) = intersect_cylinder(&local_ray, &node.geometry) else {
                continue;
            };

            if best.is_none_or(|b| hit.t < b.distance) {
                best = Some(PickHit {
                    node: id,
                    distance: hit.t,
                    world_point: ray.at(hit.t),
                    local_point: hit.point,
                    local_normal: hit.normal,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ShapeParameters,
        resources::Material,
        transform::Transform,
        tree::{BranchNode, NodeOrigin},
    };
    use std::sync::Arc;

    fn unit_cylinder() -> CylinderGeometry {
        CylinderGeometry::new(1.0, 10.0, 16)
    }

    #[test]
    fn ray_hits_side_from_outside() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 10.0), Vec3::NEG_Z);
        let hit = intersect_cylinder(&ray, &unit_cylinder()).unwrap();

        assert!((hit.t - 9.0).abs() < 1e-5);
        assert!(hit.point.abs_diff_eq(Vec3::new(0.0, 2.0, 1.0), 1e-5));
        assert!(hit.normal.abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn ray_above_the_tip_misses_the_side() {
        let ray = Ray::new(Vec3::new(0.0, 6.0, 10.0), Vec3::NEG_Z);
        assert!(intersect_cylinder(&ray, &unit_cylinder()).is_none());
    }

    #[test]
    fn ray_down_the_axis_hits_the_top_cap() {
        let ray = Ray::new(Vec3::new(0.2, 20.0, 0.0), Vec3::NEG_Y);
        let hit = intersect_cylinder(&ray, &unit_cylinder()).unwrap();

        assert!((hit.t - 15.0).abs() < 1e-5);
        assert_eq!(hit.normal, Vec3::Y);
    }

    #[test]
    fn ray_pointing_away_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(intersect_cylinder(&ray, &unit_cylinder()).is_none());
    }

    #[test]
    fn transformed_ray_keeps_parameter_meaning() {
        let m = Affine3A::from_scale(Vec3::splat(0.5));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let local = ray.transformed(&m);

        assert!(ray.at(4.0).abs_diff_eq(m.inverse().transform_point3(local.at(4.0)), 1e-5));
    }

    #[test]
    fn raycast_reports_nearest_node_and_local_frame() {
        let root = BranchNode::new_root(Arc::new(unit_cylinder()), Arc::new(Material::default()));
        let mut tree = PineTree::new(root);
        // A half-size copy standing in front of the root, towards the camera.
        let front = tree.add_child(
            0,
            Transform {
                translation: Vec3::new(0.0, 0.0, 5.0),
                scale: Vec3::splat(0.5),
                ..Transform::IDENTITY
            },
            NodeOrigin::Generated,
        );

        let ray = Ray::new(Vec3::new(0.0, 1.0, 20.0), Vec3::NEG_Z);
        let hit = tree.raycast(&ray).unwrap();

        assert_eq!(hit.node, front);
        assert!((hit.distance - 14.5).abs() < 1e-4);
        assert!(hit.world_point.abs_diff_eq(Vec3::new(0.0, 1.0, 5.5), 1e-4));
        assert!(hit.local_point.abs_diff_eq(Vec3::new(0.0, 2.0, 1.0), 1e-4));
        assert!(hit.local_normal.abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn raycast_misses_empty_space() {
        let tree = crate::builder::build(&ShapeParameters::default()).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 900.0, 300.0), Vec3::NEG_Z);
        assert!(tree.raycast(&ray).is_none());
    }
}
