use bevy::prelude::*;

/// Extension trait for `Transform` to provide more concise construction methods
/// and the portal frame change used by both view composition and teleportation
pub trait TransformExt {
    /// Creates a `Transform` from translation, rotation, and scale in one call
    fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self;

    /// Re-expresses `self` relative to `to` the way it currently sits relative to `from`,
    /// i.e. `to · from⁻¹ · self`. Only translation and rotation are taken from the composed
    /// matrix, scale is kept from `self`.
    fn through_portal(&self, from: &Transform, to: &Transform) -> Self;
}

impl TransformExt for Transform {
    fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    fn through_portal(&self, from: &Transform, to: &Transform) -> Self {
        let matrix = to.compute_affine() * from.compute_affine().inverse() * self.compute_affine();
        let (_, rotation, translation) = matrix.to_scale_rotation_translation();
        Self::from_trs(translation, rotation.normalize(), self.scale)
    }
}

/// Extension trait for `UVec2` viewport sizes
pub trait ViewportExt {
    /// Width over height, 1.0 for degenerate sizes
    fn aspect_ratio(self) -> f32;
}

impl ViewportExt for UVec2 {
    #[allow(
        clippy::cast_precision_loss,
        reason = "viewport dimensions are far below f32 precision limits"
    )]
    fn aspect_ratio(self) -> f32 {
        if self.x == 0 || self.y == 0 {
            1.0
        } else {
            self.x as f32 / self.y as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    #[test]
    fn through_identical_portals_is_identity() {
        let portal = Transform::from_xyz(3.0, 1.0, -2.0).with_rotation(Quat::from_rotation_y(0.4));
        let subject = Transform::from_xyz(1.0, 2.0, 3.0).with_rotation(Quat::from_rotation_x(0.2));

        let moved = subject.through_portal(&portal, &portal);

        assert!(moved.translation.abs_diff_eq(subject.translation, 1e-5));
        assert!(moved.rotation.abs_diff_eq(subject.rotation, 1e-5));
    }

    #[test]
    fn through_portal_preserves_local_offset() {
        let from = Transform::from_xyz(0.0, 0.0, 0.0);
        let to = Transform::from_xyz(10.0, 0.0, 0.0).with_rotation(Quat::from_rotation_y(PI));
        let subject = Transform::from_xyz(0.5, 1.0, 2.0).with_scale(Vec3::splat(2.0));

        let moved = subject.through_portal(&from, &to);

        // local (0.5, 1, 2) under a half turn about Y becomes (-0.5, 1, -2)
        assert!(moved.translation.abs_diff_eq(Vec3::new(9.5, 1.0, -2.0), 1e-4));
        assert_eq!(moved.scale, Vec3::splat(2.0));
    }

    #[test]
    fn aspect_ratio_of_empty_viewport_is_one() {
        assert!((UVec2::ZERO.aspect_ratio() - 1.0).abs() < f32::EPSILON);
        assert!((UVec2::new(1920, 1080).aspect_ratio() - 16.0 / 9.0).abs() < 1e-5);
    }
}
