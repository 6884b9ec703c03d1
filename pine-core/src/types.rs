use std::sync::Arc;

use crate::resources::{CylinderGeometry, Material};

/// Identifier for a node in a [`crate::tree::PineTree`].
///
/// This is an index into `PineTree::nodes`, and is only meaningful within
/// the lifetime of a given `PineTree` instance.
pub type NodeId = usize;

/// Handle to the cylinder every branch is drawn with. Cloning it is a
/// reference-count bump, never a copy of the geometry.
pub type SharedGeometry = Arc<CylinderGeometry>;

/// Handle to the material every branch is drawn with.
pub type SharedMaterial = Arc<Material>;
