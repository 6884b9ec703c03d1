use thiserror::Error;

use crate::types::NodeId;

/// Failure to build a tree from a set of [`crate::config::ShapeParameters`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    /// The parameters are valid but the tree would be too large to build.
    /// `nodes` is `None` when the count does not even fit in a `usize`.
    #[error(
        "{branching_factor} children over {recursion_depth} generations need {} nodes, over the node budget of {limit}",
        node_total(.nodes)
    )]
    TooManyNodes {
        branching_factor: u32,
        recursion_depth: u32,
        nodes: Option<usize>,
        limit: usize,
    },
}

impl BuildError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

fn node_total(nodes: &Option<usize>) -> String {
    nodes.map_or_else(|| "more than usize::MAX".to_string(), |n| n.to_string())
}

/// Failure to attach a grafted branch to a live tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraftError {
    #[error("node {0} does not exist in this tree")]
    UnknownNode(NodeId),
    #[error("attach point must be finite")]
    NonFinitePoint,
    #[error("surface normal must be finite and non-zero")]
    DegenerateNormal,
}
