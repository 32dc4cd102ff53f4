//! Plane-side tests, direction remapping, oblique projection and interpolation helpers
//! shared by the portal and traveler code.
use bevy::math::Affine3A;
use bevy::prelude::*;

/// Denominators below this are treated as parallel to the clip plane
const OBLIQUE_EPSILON: f32 = 1e-5;

/// Which side of a portal plane a point occupies, measured along the portal's forward axis
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Side {
    Behind,
    #[default]
    On,
    Front,
}

impl Side {
    /// `sign(dot(offset, forward))`, with an exact zero mapping to [`Side::On`]
    pub fn of(offset: Vec3, forward: Vec3) -> Self {
        let dot = offset.dot(forward);
        if dot > 0.0 {
            Self::Front
        } else if dot < 0.0 {
            Self::Behind
        } else {
            Self::On
        }
    }

    /// Side of `point` relative to a portal at `transform`
    pub fn of_point(point: Vec3, transform: &Transform) -> Self {
        Self::of(point - transform.translation, transform.forward().as_vec3())
    }

    pub const fn sign(self) -> f32 {
        match self {
            Self::Behind => -1.0,
            Self::On => 0.0,
            Self::Front => 1.0,
        }
    }

    /// A crossing is any change of side between two frames. There is deliberately no
    /// magnitude threshold here.
    pub fn crossed(previous: Self, current: Self) -> bool { previous != current }
}

/// Moves a world-space direction out of `from`'s frame and into `to`'s frame.
/// Used for linear and angular velocity, so only rotation participates.
pub fn remap_direction(direction: Vec3, from: Quat, to: Quat) -> Vec3 {
    to * (from.inverse() * direction)
}

/// The clip plane `(n, -n·p)` in view space for a portal plane through `point` with
/// world normal `normal`. The normal is flipped so it points away from the camera,
/// which makes the camera's side the clipped side. Returns `None` when the camera sits
/// exactly on the plane.
pub fn view_space_clip_plane(
    view_from_world: &Affine3A,
    camera_position: Vec3,
    point: Vec3,
    normal: Vec3,
) -> Option<Vec4> {
    let side = Side::of(point - camera_position, normal).sign();
    if side == 0.0 {
        return None;
    }

    let view_point = view_from_world.transform_point3(point);
    let view_normal = view_from_world.transform_vector3(normal).normalize_or_zero() * side;
    if view_normal == Vec3::ZERO {
        return None;
    }

    Some(view_normal.extend(-view_point.dot(view_normal)))
}

/// Replaces the near plane of a reverse-z projection with `plane` (view space, visible
/// side positive). The far plane is tilted to pass through the far frustum corner facing
/// the plane so depth precision is preserved. Falls back to the unmodified projection
/// when the plane is parallel to the view direction.
pub fn oblique_clip_from_view(clip_from_view: Mat4, plane: Vec4) -> Mat4 {
    // reverse-z: the far plane is at depth 0
    let far_corner = clip_from_view.inverse()
        * Vec4::new(plane.x.signum(), plane.y.signum(), 0.0, 1.0);
    let denominator = plane.dot(far_corner);
    if denominator.abs() < OBLIQUE_EPSILON {
        return clip_from_view;
    }

    let w_row = clip_from_view.row(3);
    let scale = w_row.dot(far_corner) / denominator;
    let depth_row = w_row - plane * scale;

    let mut columns = clip_from_view.to_cols_array_2d();
    columns[0][2] = depth_row.x;
    columns[1][2] = depth_row.y;
    columns[2][2] = depth_row.z;
    columns[3][2] = depth_row.w;
    Mat4::from_cols_array_2d(&columns)
}

/// Distance from the eye to a corner of the near plane
pub fn near_plane_corner_distance(near: f32, fov_y: f32, aspect_ratio: f32) -> f32 {
    let half_height = near * (fov_y * 0.5).tan();
    let half_width = half_height * aspect_ratio;
    Vec3::new(half_width, half_height, near).length()
}

/// Spherical interpolation with `t` clamped to `[0, 1]`
pub fn ease_rotation(start: Quat, end: Quat, t: f32) -> Quat { start.slerp(end, t.clamp(0.0, 1.0)) }

/// Linear interpolation with `t` clamped to `[0, 1]`
pub fn ease_translation(start: Vec3, end: Vec3, t: f32) -> Vec3 { start.lerp(end, t.clamp(0.0, 1.0)) }
