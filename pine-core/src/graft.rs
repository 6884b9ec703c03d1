//! Runtime grafting of single branches onto a live tree.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use crate::{
    config::ShapeParameters,
    error::GraftError,
    transform::Transform,
    tree::{NodeOrigin, PineTree},
    types::NodeId,
};

/// Below this, the surface normal is treated as parallel to the up axis.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Attaches one new branch to `target` at a picked surface point.
///
/// The new node:
/// - shares the target's geometry and material,
/// - is scaled by `1 / scaling_factor` relative to `target`,
/// - grows along the surface normal tilted towards the target's local up
///   axis, so that it leans `branch_angle` away from that axis,
/// - has its base, not its center, at `local_point`.
///
/// No recursion happens and `params` is left untouched; this never triggers
/// a rebuild.
///
/// ### Parameters
/// - `tree` - Live tree to mutate.
/// - `target` - Node the branch is attached to.
/// - `local_point` - Attach point in `target`'s local frame.
/// - `local_normal` - Surface normal at `local_point`, in `target`'s local
///   frame. Need not be unit length.
/// - `params` - Parameters the tree was built with.
///
/// ### Returns
/// The id of the new node.
pub fn graft(
    tree: &mut PineTree,
    target: NodeId,
    local_point: Vec3,
    local_normal: Vec3,
    params: &ShapeParameters,
) -> Result<NodeId, GraftError> {
    if tree.node(target).is_none() {
        return Err(GraftError::UnknownNode(target));
    }
    if !local_point.is_finite() {
        return Err(GraftError::NonFinitePoint);
    }
    let normal = local_normal
        .try_normalize()
        .ok_or(GraftError::DegenerateNormal)?;

    let transform = graft_transform(local_point, normal, params);
    let id = tree.add_child(target, transform, NodeOrigin::Grafted);

    log::debug!("grafted node {id} onto node {target} at {local_point}");
    Ok(id)
}

/// Growth direction of a graft on a surface with unit normal `normal`.
///
/// The normal is rotated by `π/2 - branch_angle` about `normal × Y`. On the
/// end caps the normal is parallel to `Y`, that axis is undefined, and the
/// branch simply grows along the normal.
pub fn graft_direction(normal: Vec3, branch_angle: f32) -> Vec3 {
    let axis = normal.cross(Vec3::Y);
    if axis.length_squared() < PARALLEL_EPSILON {
        return normal;
    }
    Quat::from_axis_angle(axis.normalize(), FRAC_PI_2 - branch_angle) * normal
}

fn graft_transform(local_point: Vec3, normal: Vec3, params: &ShapeParameters) -> Transform {
    let child_scale = params.child_scale();
    let growth = graft_direction(normal, params.branch_angle).normalize();
    let half_length = params.base_length * child_scale / 2.0;

    Transform {
        translation: local_point + growth * half_length,
        rotation: Quat::from_rotation_arc(Vec3::Y, growth),
        scale: Vec3::splat(child_scale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;

    fn lone_root() -> (PineTree, ShapeParameters) {
        let params = ShapeParameters::default().with_structure(4, 0);
        (build(&params).unwrap(), params)
    }

    #[test]
    fn graft_adds_exactly_one_child() {
        let (mut tree, params) = lone_root();
        let point = Vec3::new(1.0, 20.0, 0.0);

        let id = graft(&mut tree, 0, point, Vec3::X, &params).unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.children(0), &[id]);
        assert!(tree.children(id).is_empty());
        assert_eq!(tree.nodes[id].origin, NodeOrigin::Grafted);
        assert_eq!(tree.grafted_count(), 1);
    }

    #[test]
    fn graft_is_one_generation_smaller() {
        let (mut tree, params) = lone_root();
        let id = graft(&mut tree, 0, Vec3::new(1.0, 0.0, 0.0), Vec3::X, &params).unwrap();

        let t = tree.nodes[id].transform;
        assert!(t.scale.abs_diff_eq(Vec3::splat(0.5), 1e-6));

        let scaled_length = tree.nodes[id].geometry.height * tree.world_scale(id).y;
        assert!((scaled_length - params.base_length / params.scaling_factor).abs() < 1e-3);
    }

    #[test]
    fn graft_base_sits_on_the_attach_point() {
        let (mut tree, params) = lone_root();
        let point = Vec3::new(0.0, -30.0, 1.0);
        let id = graft(&mut tree, 0, point, Vec3::Z, &params).unwrap();

        let node = &tree.nodes[id];
        let base_in_parent = node
            .transform
            .to_affine()
            .transform_point3(node.geometry.base());
        assert!(base_in_parent.abs_diff_eq(point, 1e-3));
    }

    #[test]
    fn graft_leans_branch_angle_from_up() {
        let (mut tree, params) = lone_root();
        let id = graft(&mut tree, 0, Vec3::new(1.0, 0.0, 0.0), Vec3::X, &params).unwrap();

        let axis = tree.nodes[id].transform.growth_axis();
        let lean = axis.angle_between(Vec3::Y);
        assert!((lean - params.branch_angle).abs() < 1e-4);
        // Still on the side of the surface it was picked from.
        assert!(axis.x > 0.0);
    }

    #[test]
    fn cap_normal_grows_straight_along_the_normal() {
        let dir = graft_direction(Vec3::Y, 1.0);
        assert_eq!(dir, Vec3::Y);

        let dir = graft_direction(Vec3::NEG_Y, 1.0);
        assert_eq!(dir, Vec3::NEG_Y);
    }

    #[test]
    fn graft_rejects_bad_input() {
        let (mut tree, params) = lone_root();

        assert_eq!(
            graft(&mut tree, 9, Vec3::ZERO, Vec3::X, &params),
            Err(GraftError::UnknownNode(9))
        );
        assert_eq!(
            graft(&mut tree, 0, Vec3::ZERO, Vec3::ZERO, &params),
            Err(GraftError::DegenerateNormal)
        );
        assert_eq!(
            graft(&mut tree, 0, Vec3::splat(f32::NAN), Vec3::X, &params),
            Err(GraftError::NonFinitePoint)
        );
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn graft_on_picked_hit_attaches_to_hit_node() {
        let params = ShapeParameters::default().with_structure(3, 1);
        let mut tree = build(&params).unwrap();
        let before = tree.len();

        let ray = crate::pick::Ray::new(Vec3::new(0.0, 500.0, 0.0), Vec3::NEG_Y);
        let hit = tree.raycast(&ray).unwrap();
        let id = graft(&mut tree, hit.node, hit.local_point, hit.local_normal, &params).unwrap();

        assert_eq!(tree.len(), before + 1);
        assert_eq!(tree.nodes[id].parent, Some(hit.node));
    }
}
