use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::{
    error::BuildError,
    resources::{CylinderGeometry, Material},
    types::{SharedGeometry, SharedMaterial},
};

/// Values the parameter panel offers for [`ShapeParameters::branching_factor`].
pub const BRANCHING_FACTOR_RANGE: RangeInclusive<u32> = 2..=10;

/// Values the parameter panel offers for [`ShapeParameters::recursion_depth`].
pub const RECURSION_DEPTH_RANGE: RangeInclusive<u32> = 1..=10;

/// Upper bound on the number of nodes a single build may produce.
pub const MAX_NODES: usize = 1_000_000;

const DEFAULT_RADIAL_SEGMENTS: u32 = 32;

/// Inputs of one tree build.
///
/// `geometry` and `material` are handles; every node of the resulting tree
/// points at the same two allocations.
#[derive(Clone, Debug)]
pub struct ShapeParameters {
    pub branching_factor: u32,
    pub recursion_depth: u32,
    pub base_radius: f32,
    pub base_length: f32,
    /// Tilt of each child away from its parent's growth axis, in radians.
    pub branch_angle: f32,
    /// Each generation is this many times smaller than the previous one.
    pub scaling_factor: f32,
    /// Fraction of the parent's length siblings are spread over.
    pub branch_length_padding: f32,
    pub geometry: SharedGeometry,
    pub material: SharedMaterial,
}

impl Default for ShapeParameters {
    fn default() -> Self {
        let base_radius = 1.0;
        let base_length = 200.0;

        Self {
            branching_factor: 4,
            recursion_depth: 2,
            base_radius,
            base_length,
            branch_angle: 60.0_f32.to_radians(),
            scaling_factor: 2.0,
            branch_length_padding: 0.8,
            geometry: Arc::new(CylinderGeometry::new(
                base_radius,
                base_length,
                DEFAULT_RADIAL_SEGMENTS,
            )),
            material: Arc::new(Material::default()),
        }
    }
}

impl ShapeParameters {
    /// Same shape, different fan-out and depth. Resources stay shared.
    pub fn with_structure(&self, branching_factor: u32, recursion_depth: u32) -> Self {
        Self {
            branching_factor,
            recursion_depth,
            ..self.clone()
        }
    }

    /// Size of each child relative to its parent.
    #[inline]
    pub fn child_scale(&self) -> f32 {
        1.0 / self.scaling_factor
    }

    /// Number of nodes a build with these parameters produces, or `None` if
    /// it does not fit in a `usize`.
    pub fn node_count(&self) -> Option<usize> {
        let b = self.branching_factor as usize;
        let mut total: usize = 1;
        let mut generation: usize = 1;
        for _ in 0..self.recursion_depth {
            generation = generation.checked_mul(b)?;
            total = total.checked_add(generation)?;
        }
        Some(total)
    }

    /// Rejects parameter sets that cannot produce a well-formed tree.
    ///
    /// Angles are not range checked: any finite angle is a valid rotation.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.branching_factor == 0 {
            return Err(BuildError::invalid("branching_factor", "must be at least 1"));
        }

        positive("base_radius", self.base_radius)?;
        positive("base_length", self.base_length)?;
        finite("branch_angle", self.branch_angle)?;
        finite("scaling_factor", self.scaling_factor)?;
        if self.scaling_factor <= 1.0 {
            return Err(BuildError::invalid(
                "scaling_factor",
                format!("must be greater than 1, got {}", self.scaling_factor),
            ));
        }

        finite("branch_length_padding", self.branch_length_padding)?;
        if self.branch_length_padding <= 0.0 || self.branch_length_padding > 1.0 {
            return Err(BuildError::invalid(
                "branch_length_padding",
                format!("must be in (0, 1], got {}", self.branch_length_padding),
            ));
        }

        positive("geometry.radius", self.geometry.radius)?;
        positive("geometry.height", self.geometry.height)?;

        match self.node_count() {
            Some(n) if n <= MAX_NODES => Ok(()),
            nodes => Err(BuildError::TooManyNodes {
                branching_factor: self.branching_factor,
                recursion_depth: self.recursion_depth,
                nodes,
                limit: MAX_NODES,
            }),
        }
    }
}

fn finite(name: &'static str, value: f32) -> Result<(), BuildError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BuildError::invalid(name, format!("must be finite, got {value}")))
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), BuildError> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(BuildError::invalid(name, format!("must be positive, got {value}")))
    }
}
