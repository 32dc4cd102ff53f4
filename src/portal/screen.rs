use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::components::Portal;
use super::components::PortalScreen;
use super::config::PortalConfig;
use super::config::ScreenShape;
use super::crossing::TravelerEntered;
use crate::camera::CameraConfig;
use crate::camera::ObserverCamera;
use crate::math::near_plane_corner_distance;
use crate::traits::ViewportExt;

/// Screen pose that keeps the observer's near plane from cutting through the surface of
/// the portal at `portal`
pub fn protected_screen(
    shape: ScreenShape,
    initial: &Transform,
    portal: &Transform,
    viewer: Vec3,
    corner_distance: f32,
) -> Transform {
    let looks_along_forward = portal.forward().dot(portal.translation - viewer) > 0.0;
    let away = if looks_along_forward { 1.0 } else { -1.0 };
    shape.protect(initial, corner_distance, away)
}

pub fn protect_screen_on_entry(
    entered: On<TravelerEntered>,
    portal_config: Res<PortalConfig>,
    camera_config: Res<CameraConfig>,
    window: Single<&Window, With<PrimaryWindow>>,
    observer: Single<(Entity, &GlobalTransform), With<ObserverCamera>>,
    portals: Query<(&Portal, &Transform)>,
    mut screens: Query<(&PortalScreen, &mut Transform), Without<Portal>>,
) {
    let (observer, observer_transform) = *observer;
    // only the observer's near plane can cut the screen
    if entered.entity != observer {
        return;
    }
    let Ok((portal, portal_transform)) = portals.get(entered.portal) else {
        return;
    };
    let Ok((screen, mut screen_transform)) = screens.get_mut(portal.screen) else {
        return;
    };

    let corner_distance = near_plane_corner_distance(
        camera_config.near,
        camera_config.fov,
        window.physical_size().aspect_ratio(),
    );
    *screen_transform = protected_screen(
        portal_config.screen_shape,
        &screen.initial,
        portal_transform,
        observer_transform.translation(),
        corner_distance,
    );
}

/// Puts screens back to rest once the observer is outside the portal's trigger volume
pub fn reset_distant_screens(
    observer: Single<&GlobalTransform, With<ObserverCamera>>,
    portals: Query<(&Portal, &Transform)>,
    mut screens: Query<(&PortalScreen, &mut Transform), Without<Portal>>,
) {
    let viewer = observer.translation();
    for (portal, transform) in &portals {
        if viewer.distance(transform.translation) <= portal.reset_radius() {
            continue;
        }
        if let Ok((screen, mut screen_transform)) = screens.get_mut(portal.screen)
            && *screen_transform != screen.initial
        {
            *screen_transform = screen.initial;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use bevy::ecs::system::RunSystemOnce;

    use super::*;
    use crate::portal::PortalSlot;

    fn initial() -> Transform { Transform::from_scale(Vec3::new(1.6, 2.4, 0.01)) }

    #[test]
    fn screen_is_pushed_to_the_far_side_of_the_viewer() {
        // forward is -Z, the viewer stands on the +Z side looking along forward
        let portal = Transform::default();
        let behind = Vec3::new(0.0, 0.0, 0.5);
        let from_behind = protected_screen(ScreenShape::Square, &initial(), &portal, behind, 0.2);
        assert!(from_behind.translation.z < 0.0);

        let front = Vec3::new(0.0, 0.0, -0.5);
        let from_front = protected_screen(ScreenShape::Square, &initial(), &portal, front, 0.2);
        assert!(from_front.translation.z > 0.0);
    }

    #[test]
    fn turned_portal_flips_the_push() {
        let portal = Transform::from_rotation(Quat::from_rotation_y(PI));
        let viewer = Vec3::new(0.0, 0.0, 0.5);
        let protected = protected_screen(ScreenShape::Square, &initial(), &portal, viewer, 0.2);
        // the viewer looks against this portal's forward, so the push is toward local +Z
        assert!(protected.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 0.1), 1e-6));
    }

    #[test]
    fn distant_observer_resets_the_screen() {
        let mut world = World::new();
        world.spawn((ObserverCamera, GlobalTransform::from_xyz(0.0, 0.0, 50.0)));
        let resting = initial();
        let screen = world
            .spawn(Transform::from_xyz(0.0, 0.0, -0.1).with_scale(Vec3::new(1.6, 2.4, 0.2)))
            .id();
        let portal = world
            .spawn((
                Portal::new(
                    PortalSlot::Primary,
                    screen,
                    Entity::PLACEHOLDER,
                    Vec3::new(0.8, 1.2, 0.5),
                ),
                Transform::default(),
            ))
            .id();
        world.entity_mut(screen).insert(PortalScreen {
            portal,
            initial: resting,
        });

        let _ = world.run_system_once(reset_distant_screens);

        assert_eq!(world.get::<Transform>(screen), Some(&resting));
    }
}
