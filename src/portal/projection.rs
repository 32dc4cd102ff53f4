//! A perspective projection whose near plane can be replaced by an arbitrary plane.
use bevy::camera::CameraProjection;
use bevy::camera::SubCameraView;
use bevy::math::Vec3A;
use bevy::prelude::*;

use crate::math::oblique_clip_from_view;

/// Perspective projection for portal cameras. Unlike Bevy's infinite reverse-z
/// perspective this one has a finite far plane, which the oblique near plane needs to
/// tilt against.
#[derive(Debug, Clone, Reflect)]
pub struct PortalProjection {
    pub perspective:     PerspectiveProjection,
    pub far:             f32,
    /// View-space plane `(n, d)`, visible side positive. `None` keeps the regular near plane.
    pub near_clip_plane: Option<Vec4>,
}

impl PortalProjection {
    pub const fn new(perspective: PerspectiveProjection, far: f32) -> Self {
        Self {
            perspective,
            far,
            near_clip_plane: None,
        }
    }

    pub const fn with_near_clip_plane(mut self, plane: Option<Vec4>) -> Self {
        self.near_clip_plane = plane;
        self
    }

    /// Reverse-z perspective, near maps to depth 1 and far to depth 0
    pub fn base_clip_from_view(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.perspective.fov,
            self.perspective.aspect_ratio,
            self.far,
            self.perspective.near,
        )
    }
}

impl CameraProjection for PortalProjection {
    fn get_clip_from_view(&self) -> Mat4 {
        let clip_from_view = self.base_clip_from_view();
        match self.near_clip_plane {
            Some(plane) => oblique_clip_from_view(clip_from_view, plane),
            None => clip_from_view,
        }
    }

    fn get_clip_from_view_for_sub(&self, sub_view: &SubCameraView) -> Mat4 {
        self.perspective.get_clip_from_view_for_sub(sub_view)
    }

    fn update(&mut self, width: f32, height: f32) { self.perspective.update(width, height); }

    fn far(&self) -> f32 { self.far }

    fn get_frustum_corners(&self, z_near: f32, z_far: f32) -> [Vec3A; 8] {
        self.perspective.get_frustum_corners(z_near, z_far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(clip_from_view: Mat4, point: Vec3) -> f32 {
        let clip = clip_from_view * point.extend(1.0);
        clip.z / clip.w
    }

    fn projection() -> PortalProjection {
        PortalProjection::new(
            PerspectiveProjection {
                near: 0.1,
                aspect_ratio: 1.5,
                ..default()
            },
            100.0,
        )
    }

    #[test]
    fn plain_projection_is_reverse_z_with_finite_far() {
        let clip_from_view = projection().get_clip_from_view();
        assert!((depth(clip_from_view, Vec3::new(0.0, 0.0, -0.1)) - 1.0).abs() < 1e-4);
        assert!(depth(clip_from_view, Vec3::new(0.0, 0.0, -100.0)).abs() < 1e-4);
    }

    #[test]
    fn clip_plane_moves_the_near_plane() {
        let mut projection = projection();
        projection.near_clip_plane = Some(Vec4::new(0.0, 0.0, -1.0, -4.0));

        let clip_from_view = projection.get_clip_from_view();

        assert!((depth(clip_from_view, Vec3::new(0.0, 0.0, -4.0)) - 1.0).abs() < 1e-3);
        assert!(depth(clip_from_view, Vec3::new(0.0, 0.0, -1.0)) > 1.0);
    }
}
