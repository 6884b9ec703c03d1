//! Recursive branch generation.
//!
//! A build starts from a single root at the identity transform and expands
//! every node with remaining depth into `branching_factor` children. Each
//! child's local transform is composed in the parent's frame:
//!
//! 1. shrink by `1 / scaling_factor` on every axis,
//! 2. tilt about `Z` by `branch_angle`,
//! 3. shift along `X` so the tilted child's base touches the parent,
//! 4. fan about `Y` by `i * 2π / branching_factor`,
//! 5. stagger along `Y` so siblings spread over the parent's length.
//!
//! Every step premultiplies the matrix built so far, so the order matters.

use std::f32::consts::TAU;

use glam::{Quat, Vec3};

use crate::{
    config::ShapeParameters,
    error::BuildError,
    transform::Transform,
    tree::{BranchNode, NodeOrigin, PineTree},
    types::NodeId,
};

/// Builds a complete tree from `params`.
///
/// The result is a pure function of `params`: no randomness, no hidden
/// state. Expansion uses an explicit worklist of `(node, remaining_depth)`
/// pairs instead of call-stack recursion, so deep trees cannot overflow the
/// stack.
///
/// ### Parameters
/// - `params` - Shape parameters. The root takes `params.geometry` and
///   `params.material`; every other node shares those same handles.
///
/// ### Returns
/// - `Ok(tree)` with exactly [`ShapeParameters::node_count`] nodes.
/// - `Err(BuildError::InvalidParameter)` or `Err(BuildError::TooManyNodes)`
///   if [`ShapeParameters::validate`] rejects the parameters. No partial
///   tree is produced.
pub fn build(params: &ShapeParameters) -> Result<PineTree, BuildError> {
    params.validate()?;

    let expected = params.node_count().unwrap_or(1);
    let root = BranchNode::new_root(params.geometry.clone(), params.material.clone());
    let mut tree = PineTree::with_capacity(root, expected);

    let mut work: Vec<(NodeId, u32)> = vec![(tree.root(), params.recursion_depth)];
    while let Some((parent, remaining)) = work.pop() {
        if remaining == 0 {
            continue;
        }

        let parent_height = tree.nodes[parent].geometry.height;
        for i in 0..params.branching_factor {
            let transform = child_transform(params, parent_height, i);
            let child = tree.add_child(parent, transform, NodeOrigin::Generated);
            work.push((child, remaining - 1));
        }
    }

    log::debug!(
        "built tree: {} nodes (b = {}, depth = {})",
        tree.len(),
        params.branching_factor,
        params.recursion_depth
    );
    debug_assert_eq!(tree.len(), expected);

    Ok(tree)
}

/// Local transform of sibling `index` under a parent of unscaled height
/// `parent_height`.
///
/// This is the closed form of
/// `T_y(offset) * R_y(fan) * T_x(shift) * R_z(angle) * S(1 / scaling_factor)`.
pub fn child_transform(params: &ShapeParameters, parent_height: f32, index: u32) -> Transform {
    let child_scale = params.child_scale();
    let shift = -parent_height * child_scale * params.branch_angle.sin() / 2.0;
    let fan = Quat::from_rotation_y(index as f32 * TAU / params.branching_factor as f32);
    let offset = sibling_offset(params, parent_height, index);

    Transform {
        translation: fan * Vec3::new(shift, 0.0, 0.0) + Vec3::new(0.0, offset, 0.0),
        rotation: fan * Quat::from_rotation_z(params.branch_angle),
        scale: Vec3::splat(child_scale),
    }
}

/// Vertical attachment offset of sibling `index` along its parent.
///
/// Siblings are spread evenly over `[-y_offset, y_offset]` where
/// `y_offset = (padding - child_scale * cos(angle)) * parent_height / 2`.
/// A single child has nothing to spread against and sits at `0`.
pub fn sibling_offset(params: &ShapeParameters, parent_height: f32, index: u32) -> f32 {
    if params.branching_factor <= 1 {
        return 0.0;
    }

    let y_offset = (params.branch_length_padding
        - params.child_scale() * params.branch_angle.cos())
        * parent_height
        / 2.0;
    let step = 2.0 * y_offset / (params.branching_factor - 1) as f32;
    step * index as f32 - y_offset
}
