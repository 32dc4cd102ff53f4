use bevy::camera::visibility::RenderLayers;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_enhanced_input::prelude::*;

use super::components::Portal;
use super::components::PortalCamera;
use super::config::PortalConfig;
use crate::camera::CameraConfig;
use crate::camera::RenderLayer;
use crate::game_input::TogglePortalGizmos;
use crate::traits::ViewportExt;

const CAMERA_MARKER_RADIUS: f32 = 0.1;

pub struct PortalGizmoPlugin;

impl Plugin for PortalGizmoPlugin {
    fn build(&self, app: &mut App) {
        app.init_gizmo_group::<PortalGizmo>()
            .add_systems(Startup, configure_portal_gizmo)
            .add_systems(
                Update,
                draw_portal_cameras.run_if(|config: Res<PortalConfig>| config.debug),
            )
            .add_observer(toggle_portal_gizmos);
    }
}

#[derive(Default, Reflect, GizmoConfigGroup)]
struct PortalGizmo {}

fn configure_portal_gizmo(mut config_store: ResMut<GizmoConfigStore>) {
    let (config, _) = config_store.config_mut::<PortalGizmo>();
    // portal cameras never see their own outlines
    config.render_layers = RenderLayers::from_layers(RenderLayer::Screens.layers());
}

fn toggle_portal_gizmos(
    _toggle: On<Start<TogglePortalGizmos>>,
    mut config: ResMut<PortalConfig>,
) {
    config.debug = !config.debug;
    debug!("portal gizmos: {}", config.debug);
}

/// Camera-space corners of a perspective frustum, near plane first, each plane wound
/// bottom left, bottom right, top right, top left
pub fn frustum_corners(fov: f32, aspect_ratio: f32, near: f32, far: f32) -> [Vec3; 8] {
    let tan = (fov * 0.5).tan();
    let corners = |distance: f32| {
        let half_height = distance * tan;
        let half_width = half_height * aspect_ratio;
        [
            Vec3::new(-half_width, -half_height, -distance),
            Vec3::new(half_width, -half_height, -distance),
            Vec3::new(half_width, half_height, -distance),
            Vec3::new(-half_width, half_height, -distance),
        ]
    };
    let [a, b, c, d] = corners(near);
    let [e, f, g, h] = corners(far);
    [a, b, c, d, e, f, g, h]
}

fn draw_portal_cameras(
    mut gizmos: Gizmos<PortalGizmo>,
    config: Res<PortalConfig>,
    camera_config: Res<CameraConfig>,
    window: Single<&Window, With<PrimaryWindow>>,
    portals: Query<&Portal>,
    cameras: Query<&GlobalTransform, With<PortalCamera>>,
) {
    let aspect_ratio = window.physical_size().aspect_ratio();

    for portal in &portals {
        if portal.linked.is_none() {
            continue;
        }
        let Ok(camera) = cameras.get(portal.camera) else {
            continue;
        };
        let color = portal.slot.color(&config);
        let position = camera.translation();

        gizmos.sphere(Isometry3d::from_translation(position), CAMERA_MARKER_RADIUS, color);
        gizmos
            .arrow(position, position + camera.forward() * config.arrow_length, color)
            .with_tip_length(config.arrow_head);

        // drawn to the arrow's length, the real far plane is too distant to read
        let corners = frustum_corners(
            camera_config.fov,
            aspect_ratio,
            camera_config.near,
            config.arrow_length,
        )
        .map(|corner| camera.transform_point(corner));
        for index in 0..4 {
            let next = (index + 1) % 4;
            gizmos.line(corners[index], corners[next], color);
            gizmos.line(corners[index + 4], corners[next + 4], color);
            gizmos.line(corners[index], corners[index + 4], color);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn frustum_widens_with_distance() {
        let corners = frustum_corners(FRAC_PI_2, 2.0, 1.0, 10.0);

        // a 90 degree fov puts the top edge at the same height as the distance
        assert!(corners[2].abs_diff_eq(Vec3::new(2.0, 1.0, -1.0), 1e-5));
        assert!(corners[6].abs_diff_eq(Vec3::new(20.0, 10.0, -10.0), 1e-4));
        assert!(corners[4].abs_diff_eq(Vec3::new(-20.0, -10.0, -10.0), 1e-4));
    }

    #[test]
    fn frustum_looks_down_negative_z() {
        let corners = frustum_corners(1.0, 1.5, 0.1, 5.0);
        assert!(corners.iter().all(|corner| corner.z < 0.0));
    }
}
