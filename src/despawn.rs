use bevy::prelude::*;

use crate::actor::Traveler;
use crate::camera::ObserverCamera;
use crate::schedule::InGameSet;

/// Bodies that fall this far below the floor are gone for good
const KILL_PLANE_Y: f32 = -50.0;

pub struct DespawnPlugin;

impl Plugin for DespawnPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            despawn_fallen_travelers.in_set(InGameSet::DespawnEntities),
        );
    }
}

/// Uses `try_despawn` because entities can be queued for despawn multiple times in a frame
/// (e.g., a portal replaced and then cleared by a despawn-all in the same frame)
pub fn despawn(commands: &mut Commands, entity: Entity) { commands.entity(entity).try_despawn(); }

fn despawn_fallen_travelers(
    mut commands: Commands,
    travelers: Query<
        (Entity, &Transform, Option<&Name>),
        (With<Traveler>, Without<ObserverCamera>),
    >,
) {
    for (entity, transform, name) in &travelers {
        if transform.translation.y < KILL_PLANE_Y {
            debug!("{} fell out of the world", name.map_or("traveler", |name| name.as_str()));
            despawn(&mut commands, entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallen_travelers_are_despawned() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(crate::schedule::SchedulePlugin)
            .add_plugins(DespawnPlugin);
        let fallen = app
            .world_mut()
            .spawn((Traveler::default(), Transform::from_xyz(0.0, -60.0, 0.0)))
            .id();
        let standing = app
            .world_mut()
            .spawn((Traveler::default(), Transform::from_xyz(0.0, 1.0, 0.0)))
            .id();
        let observer = app
            .world_mut()
            .spawn((ObserverCamera, Traveler::default(), Transform::from_xyz(0.0, -60.0, 0.0)))
            .id();

        app.update();

        assert!(app.world().get_entity(fallen).is_err());
        assert!(app.world().get_entity(standing).is_ok());
        assert!(app.world().get_entity(observer).is_ok());
    }
}
