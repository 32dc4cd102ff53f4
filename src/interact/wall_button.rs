use bevy::prelude::*;

use super::Interactable;
use crate::math::ease_rotation;
use crate::math::ease_translation;
use crate::schedule::InGameSet;

/// How long a press takes to go down and come back up
const PRESS_DURATION: f32 = 0.4;
/// How far the button tips when pressed
const PRESS_ANGLE: f32 = 0.35;
/// How far the button sinks into the wall
const PRESS_DEPTH: f32 = 0.05;

pub struct WallButtonPlugin;

impl Plugin for WallButtonPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, animate_presses.in_set(InGameSet::EntityUpdates));
    }
}

/// Asks the playfield for a new crate at `at`
#[derive(Event, Debug, Clone, Copy)]
pub struct SpawnCrate {
    pub at: Vec3,
}

/// Spawns a crate at `spawn_point` and tips itself while the press plays
#[derive(Debug, Clone)]
pub struct WallButton {
    spawn_point: Vec3,
    rest:        Transform,
    pressed_at:  Option<f32>,
}

impl WallButton {
    pub const fn new(spawn_point: Vec3, rest: Transform) -> Self {
        Self {
            spawn_point,
            rest,
            pressed_at: None,
        }
    }

    pub fn is_busy(&self, elapsed: f32) -> bool {
        self.pressed_at
            .is_some_and(|pressed_at| elapsed - pressed_at < PRESS_DURATION)
    }
}

impl Interactable for WallButton {
    fn interact(&mut self, entity: Entity, elapsed: f32, commands: &mut Commands) {
        if self.is_busy(elapsed) {
            return;
        }
        self.pressed_at = Some(elapsed);

        commands.trigger(SpawnCrate {
            at: self.spawn_point,
        });
        let mut pressed = self.rest;
        pressed.rotate_local_x(PRESS_ANGLE);
        pressed.translation += self.rest.forward() * -PRESS_DEPTH;
        commands.entity(entity).insert(ButtonPress {
            start:      self.rest,
            end:        pressed,
            started_at: elapsed,
            duration:   PRESS_DURATION,
        });
        debug!("wall button {entity} pressed");
    }
}

/// A playing press animation
#[derive(Component, Debug, Clone, Copy)]
pub struct ButtonPress {
    start:      Transform,
    end:        Transform,
    started_at: f32,
    duration:   f32,
}

impl ButtonPress {
    /// Pose at `elapsed`, going down for the first half and back up for the second.
    /// `None` once the press is over.
    pub fn pose(&self, elapsed: f32) -> Option<Transform> {
        let t = (elapsed - self.started_at) / self.duration;
        if t >= 1.0 {
            return None;
        }
        let depth = 1.0 - (2.0 * t - 1.0).abs();
        Some(Transform {
            translation: ease_translation(self.start.translation, self.end.translation, depth),
            rotation: ease_rotation(self.start.rotation, self.end.rotation, depth),
            ..self.start
        })
    }
}

fn animate_presses(
    mut commands: Commands,
    time: Res<Time>,
    mut buttons: Query<(Entity, &mut Transform, &ButtonPress)>,
) {
    let elapsed = time.elapsed_secs();
    for (entity, mut transform, press) in &mut buttons {
        match press.pose(elapsed) {
            Some(pose) => *transform = pose,
            None => {
                *transform = press.start;
                commands.entity(entity).remove::<ButtonPress>();
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;
    use crate::interact::Interactive;

    #[derive(Resource, Default)]
    struct Spawned(Vec<Vec3>);

    fn record_spawn(spawn: On<SpawnCrate>, mut spawned: ResMut<Spawned>) {
        spawned.0.push(spawn.at);
    }

    fn press(world: &mut World, button: Entity, elapsed: f32) {
        let _ = world.run_system_once(
            move |mut commands: Commands, mut interactives: Query<&mut Interactive>| {
                if let Ok(mut interactive) = interactives.get_mut(button) {
                    interactive.0.interact(button, elapsed, &mut commands);
                }
            },
        );
    }

    #[test]
    fn presses_while_playing_are_ignored() {
        let mut world = World::new();
        world.init_resource::<Spawned>();
        world.add_observer(record_spawn);
        let spawn_point = Vec3::new(0.0, 2.0, 0.0);
        let button = world
            .spawn((
                Transform::default(),
                Interactive::new(WallButton::new(spawn_point, Transform::default())),
            ))
            .id();

        press(&mut world, button, 1.0);
        press(&mut world, button, 1.1);
        assert_eq!(world.resource::<Spawned>().0, vec![spawn_point]);
        assert!(world.get::<ButtonPress>(button).is_some());

        press(&mut world, button, 1.0 + PRESS_DURATION + 0.01);
        assert_eq!(world.resource::<Spawned>().0.len(), 2);
    }

    #[test]
    fn press_goes_down_and_comes_back() {
        let press = ButtonPress {
            start:      Transform::default(),
            end:        Transform::from_xyz(0.0, 0.0, PRESS_DEPTH)
                .with_rotation(Quat::from_rotation_x(PRESS_ANGLE)),
            started_at: 2.0,
            duration:   1.0,
        };

        let start = press.pose(2.0).map(|pose| pose.rotation);
        let bottom = press.pose(2.5);
        let late = press.pose(2.9).map(|pose| pose.rotation);

        assert!(start.is_some_and(|rotation| rotation.abs_diff_eq(Quat::IDENTITY, 1e-5)));
        assert!(bottom.is_some_and(|pose| {
            pose.rotation.abs_diff_eq(press.end.rotation, 1e-5)
                && pose.translation.abs_diff_eq(press.end.translation, 1e-5)
        }));
        assert!(late.is_some_and(|rotation| rotation.angle_between(Quat::IDENTITY) < PRESS_ANGLE));
        assert_eq!(press.pose(3.0), None);
    }
}
