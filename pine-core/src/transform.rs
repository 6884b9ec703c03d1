use glam::{Affine3A, Quat, Vec3};

/// Local transform of a node relative to its parent, stored decomposed.
///
/// Applied as scale, then rotation, then translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_affine(m: Affine3A) -> Self {
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Applies `m` on top of this transform, in the parent's frame.
    ///
    /// Equivalent to replacing the matrix `L` with `m * L`.
    pub fn premultiplied(&self, m: Affine3A) -> Self {
        Self::from_affine(m * self.to_affine())
    }

    /// Direction of the local growth axis (`+Y`) expressed in the parent's frame.
    pub fn growth_axis(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, max_abs_diff)
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
            // q and -q encode the same rotation
            && self.rotation.dot(other.rotation).abs() >= 1.0 - max_abs_diff
    }
}
