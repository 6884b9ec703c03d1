use glam::{Affine3A, Vec3};

use crate::{
    transform::Transform,
    types::{NodeId, SharedGeometry, SharedMaterial},
};

/// How a node came to be part of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeOrigin {
    /// Produced by [`crate::builder::build`] from shape parameters.
    Generated,
    /// Attached at runtime by [`crate::graft::graft`].
    Grafted,
}

#[derive(Clone, Debug)]
pub struct BranchNode {
    pub geometry: SharedGeometry,
    pub material: SharedMaterial,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub depth: u32,
    pub origin: NodeOrigin,
}

/// A branch hierarchy stored as an arena.
///
/// Nodes are only ever appended, and always after their parent, so
/// `parent < child` holds for every edge.
#[derive(Clone, Debug)]
pub struct PineTree {
    pub nodes: Vec<BranchNode>,
}

impl BranchNode {
    pub fn new_root(geometry: SharedGeometry, material: SharedMaterial) -> Self {
        Self {
            geometry,
            material,
            transform: Transform::IDENTITY,
            parent: None,
            children: Vec::new(),
            depth: 0,
            origin: NodeOrigin::Generated,
        }
    }
}

impl PineTree {
    pub const ROOT: NodeId = 0;

    pub fn new(root: BranchNode) -> Self {
        Self { nodes: vec![root] }
    }

    pub fn with_capacity(root: BranchNode, capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(root);
        Self { nodes }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&BranchNode> {
        self.nodes.get(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Appends a child of `parent` sharing the parent's geometry and material.
    ///
    /// Panics if `parent` is out of bounds.
    pub fn add_child(&mut self, parent: NodeId, transform: Transform, origin: NodeOrigin) -> NodeId {
        let id = self.nodes.len();
        let p = &self.nodes[parent];
        let node = BranchNode {
            geometry: p.geometry.clone(),
            material: p.material.clone(),
            transform,
            parent: Some(parent),
            children: Vec::new(),
            depth: p.depth + 1,
            origin,
        };
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        id
    }

    pub fn grafted_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.origin == NodeOrigin::Grafted)
            .count()
    }

    /// Local-to-world matrix of one node, composed up the parent chain.
    ///
    /// Panics if `id` is out of bounds.
    pub fn world_transform(&self, id: NodeId) -> Affine3A {
        let mut m = self.nodes[id].transform.to_affine();
        let mut cursor = self.nodes[id].parent;
        while let Some(p) = cursor {
            m = self.nodes[p].transform.to_affine() * m;
            cursor = self.nodes[p].parent;
        }
        m
    }

    /// Local-to-world matrices of every node, indexed by [`NodeId`].
    pub fn world_transforms(&self) -> Vec<Affine3A> {
        let mut world: Vec<Affine3A> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let local = node.transform.to_affine();
            let m = match node.parent {
                Some(p) => world[p] * local,
                None => local,
            };
            world.push(m);
        }
        world
    }

    /// Product of every scale on the path from the root to `id`.
    ///
    /// Panics if `id` is out of bounds.
    pub fn world_scale(&self, id: NodeId) -> Vec3 {
        let mut scale = self.nodes[id].transform.scale;
        let mut cursor = self.nodes[id].parent;
        while let Some(p) = cursor {
            scale *= self.nodes[p].transform.scale;
            cursor = self.nodes[p].parent;
        }
        scale
    }

    /// Rotates the whole structure about the world `Y` axis.
    ///
    /// Only the root's transform changes; every branch keeps its pose
    /// relative to its parent.
    pub fn spin(&mut self, angle: f32) {
        let root = &mut self.nodes[Self::ROOT];
        root.transform = root
            .transform
            .premultiplied(Affine3A::from_rotation_y(angle));
    }

    /// Pre-order walk from the root, children in sibling order.
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: if self.nodes.is_empty() {
                Vec::new()
            } else {
                vec![Self::ROOT]
            },
        }
    }
}

pub struct DepthFirst<'a> {
    tree: &'a PineTree,
    stack: Vec<NodeId>,
}

impl Iterator for DepthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.nodes[id].children.iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{CylinderGeometry, Material};
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;
    use std::sync::Arc;

    fn root() -> BranchNode {
        BranchNode::new_root(
            Arc::new(CylinderGeometry::new(1.0, 10.0, 8)),
            Arc::new(Material::default()),
        )
    }

    fn shifted(y: f32) -> Transform {
        Transform {
            translation: Vec3::new(0.0, y, 0.0),
            scale: Vec3::splat(0.5),
            ..Transform::IDENTITY
        }
    }

    #[test]
    fn add_child_links_both_directions_and_shares_resources() {
        let mut tree = PineTree::new(root());
        let a = tree.add_child(0, shifted(1.0), NodeOrigin::Generated);
        let b = tree.add_child(a, shifted(1.0), NodeOrigin::Grafted);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.children(0), &[a]);
        assert_eq!(tree.children(a), &[b]);
        assert_eq!(tree.nodes[b].parent, Some(a));
        assert_eq!(tree.nodes[b].depth, 2);
        assert!(Arc::ptr_eq(&tree.nodes[0].geometry, &tree.nodes[b].geometry));
        assert!(Arc::ptr_eq(&tree.nodes[0].material, &tree.nodes[b].material));
        assert_eq!(tree.grafted_count(), 1);
    }

    #[test]
    fn children_of_unknown_node_is_empty() {
        let tree = PineTree::new(root());
        assert!(tree.children(42).is_empty());
        assert!(tree.node(42).is_none());
    }

    #[test]
    fn world_transforms_agree_with_per_node_composition() {
        let mut tree = PineTree::new(root());
        let a = tree.add_child(0, shifted(2.0), NodeOrigin::Generated);
        let b = tree.add_child(a, shifted(4.0), NodeOrigin::Generated);
        tree.add_child(0, shifted(-3.0), NodeOrigin::Generated);

        let all = tree.world_transforms();
        for id in 0..tree.len() {
            assert!(all[id].abs_diff_eq(tree.world_transform(id), 1e-5));
        }

        // b sits at 2 + 4 * 0.5 in world space.
        let origin = all[b].transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 4.0, 0.0), 1e-5));
        assert!(tree.world_scale(b).abs_diff_eq(Vec3::splat(0.25), 1e-6));
    }

    #[test]
    fn spin_rotates_descendants_with_the_root() {
        let mut tree = PineTree::new(root());
        let a = tree.add_child(
            0,
            Transform {
                translation: Vec3::X,
                ..Transform::IDENTITY
            },
            NodeOrigin::Generated,
        );

        tree.spin(FRAC_PI_2);

        let p = tree.world_transform(a).transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::NEG_Z, 1e-5));
        assert!(
            tree.nodes[0]
                .transform
                .rotation
                .abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2), 1e-6)
        );
    }

    #[test]
    fn spin_leaves_branch_local_transforms_alone() {
        let mut tree = PineTree::new(root());
        let a = tree.add_child(0, shifted(2.0), NodeOrigin::Generated);
        let b = tree.add_child(a, shifted(4.0), NodeOrigin::Generated);
        let before: Vec<Transform> = tree.nodes.iter().map(|n| n.transform).collect();

        tree.spin(0.3);
        tree.spin(0.3);

        assert!(tree.nodes[a].transform.abs_diff_eq(&before[a], 1e-6));
        assert!(tree.nodes[b].transform.abs_diff_eq(&before[b], 1e-6));
        assert!(!tree.nodes[0].transform.abs_diff_eq(&before[0], 1e-3));
    }

    #[test]
    #[should_panic]
    fn world_transform_panics_on_unknown_node() {
        let tree = PineTree::new(root());
        tree.world_transform(1);
    }

    #[test]
    #[should_panic]
    fn world_scale_panics_on_unknown_node() {
        let tree = PineTree::new(root());
        tree.world_scale(1);
    }

    #[test]
    fn depth_first_visits_children_in_sibling_order() {
        let mut tree = PineTree::new(root());
        let a = tree.add_child(0, Transform::IDENTITY, NodeOrigin::Generated);
        let b = tree.add_child(0, Transform::IDENTITY, NodeOrigin::Generated);
        let a0 = tree.add_child(a, Transform::IDENTITY, NodeOrigin::Generated);

        let order: Vec<NodeId> = tree.depth_first().collect();
        assert_eq!(order, vec![0, a, a0, b]);
    }
}
