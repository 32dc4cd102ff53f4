use avian3d::prelude::*;
use bevy::prelude::*;

use crate::math::remap_direction;

pub struct TeleportPlugin;

impl Plugin for TeleportPlugin {
    fn build(&self, app: &mut App) { app.add_observer(on_teleported); }
}

/// A traveler was moved through the link from `from` to `to`
#[derive(EntityEvent, Debug, Clone, Copy)]
pub struct Teleported {
    pub entity: Entity,
    pub from:   Entity,
    pub to:     Entity,
}

/// Moves a body to `destination` and carries its velocities out of the `from` portal's
/// frame into the `to` portal's frame, so speed is preserved and direction follows the
/// link
pub fn teleport(
    transform: &mut Transform,
    destination: Transform,
    linear_velocity: Option<&mut LinearVelocity>,
    angular_velocity: Option<&mut AngularVelocity>,
    from: Quat,
    to: Quat,
) {
    transform.translation = destination.translation;
    transform.rotation = destination.rotation;

    if let Some(velocity) = linear_velocity {
        velocity.0 = remap_direction(velocity.0, from, to);
    }
    if let Some(velocity) = angular_velocity {
        velocity.0 = remap_direction(velocity.0, from, to);
    }
}

fn on_teleported(
    event: On<Teleported>,
    names: Query<&Name>,
    transforms: Query<&Transform>,
    spatial_query: SpatialQuery,
    colliders: Query<&Collider>,
) {
    let name = names
        .get(event.entity)
        .map_or_else(|_| event.entity.to_string(), |name| name.as_str().to_string());
    let Ok(transform) = transforms.get(event.entity) else {
        return;
    };
    info!(
        "{name} teleported from portal {} to {} at ({:.2}, {:.2}, {:.2})",
        event.from,
        event.to,
        transform.translation.x,
        transform.translation.y,
        transform.translation.z
    );

    // landing inside something usually means the partner portal sits too close to a wall
    if let Ok(collider) = colliders.get(event.entity) {
        let overlapping = spatial_query
            .shape_intersections(
                collider,
                transform.translation,
                transform.rotation,
                &SpatialQueryFilter::default().with_excluded_entities([event.entity]),
            )
            .len();
        if overlapping > 0 {
            debug!("{name} landed overlapping {overlapping} collider(s)");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;
    use std::f32::consts::PI;

    use super::*;

    #[test]
    fn teleport_sets_pose_and_turns_velocities() {
        let mut transform = Transform::from_xyz(0.0, 0.0, -1.0);
        let destination =
            Transform::from_xyz(10.0, 0.0, 1.0).with_rotation(Quat::from_rotation_y(PI));
        let mut linear = LinearVelocity(Vec3::new(0.0, 0.0, -3.0));
        let mut angular = AngularVelocity(Vec3::X);

        teleport(
            &mut transform,
            destination,
            Some(&mut linear),
            Some(&mut angular),
            Quat::IDENTITY,
            Quat::from_rotation_y(PI),
        );

        assert_eq!(transform.translation, destination.translation);
        assert!(linear.0.abs_diff_eq(Vec3::new(0.0, 0.0, 3.0), 1e-5));
        assert!(angular.0.abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn speed_is_preserved_through_any_turn() {
        let mut transform = Transform::default();
        let mut linear = LinearVelocity(Vec3::new(1.0, 2.0, -2.0));

        teleport(
            &mut transform,
            Transform::default(),
            Some(&mut linear),
            None,
            Quat::from_rotation_x(0.3),
            Quat::from_rotation_y(FRAC_PI_2),
        );

        assert!((linear.0.length() - 3.0).abs() < 1e-5);
    }
}
