use bevy::prelude::*;

use super::Interactable;
use crate::math::ease_translation;
use crate::schedule::InGameSet;

/// Seconds a door takes to slide fully open or shut
const DOOR_DURATION: f32 = 1.2;

pub struct DoorPlugin;

impl Plugin for DoorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, slide_doors.in_set(InGameSet::EntityUpdates));
    }
}

/// A sliding panel that opens or closes on each press. Presses while it moves are
/// ignored.
#[derive(Debug, Clone)]
pub struct Door {
    closed:       Transform,
    open:         Transform,
    is_open:      bool,
    moving_until: Option<f32>,
}

impl Door {
    /// Slides `slide` world units from `closed` when opened
    pub fn new(closed: Transform, slide: Vec3) -> Self {
        Self {
            closed,
            open: closed.with_translation(closed.translation + slide),
            is_open: false,
            moving_until: None,
        }
    }

    pub fn is_busy(&self, elapsed: f32) -> bool {
        self.moving_until.is_some_and(|until| elapsed < until)
    }

    pub const fn is_open(&self) -> bool { self.is_open }
}

impl Interactable for Door {
    fn interact(&mut self, entity: Entity, elapsed: f32, commands: &mut Commands) {
        if self.is_busy(elapsed) {
            return;
        }
        let (from, to) = if self.is_open {
            (self.open, self.closed)
        } else {
            (self.closed, self.open)
        };
        self.is_open = !self.is_open;
        self.moving_until = Some(elapsed + DOOR_DURATION);

        commands.entity(entity).insert(DoorSlide {
            from,
            to,
            started_at: elapsed,
        });
        debug!("door {entity} {}", if self.is_open() { "opening" } else { "closing" });
    }
}

/// A door on its way between poses
#[derive(Component, Debug, Clone, Copy)]
pub struct DoorSlide {
    from:       Transform,
    to:         Transform,
    started_at: f32,
}

impl DoorSlide {
    /// Pose at `elapsed`, `None` once the slide has finished
    pub fn pose(&self, elapsed: f32) -> Option<Transform> {
        let t = (elapsed - self.started_at) / DOOR_DURATION;
        (t < 1.0).then(|| {
            self.from
                .with_translation(ease_translation(self.from.translation, self.to.translation, t))
        })
    }
}

fn slide_doors(
    mut commands: Commands,
    time: Res<Time>,
    mut doors: Query<(Entity, &mut Transform, &DoorSlide)>,
) {
    let elapsed = time.elapsed_secs();
    for (entity, mut transform, slide) in &mut doors {
        match slide.pose(elapsed) {
            Some(pose) => *transform = pose,
            None => {
                *transform = slide.to;
                commands.entity(entity).remove::<DoorSlide>();
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;
    use crate::interact::Interactive;

    fn press(world: &mut World, door: Entity, elapsed: f32) {
        let _ = world.run_system_once(
            move |mut commands: Commands, mut interactives: Query<&mut Interactive>| {
                if let Ok(mut interactive) = interactives.get_mut(door) {
                    interactive.0.interact(door, elapsed, &mut commands);
                }
            },
        );
    }

    fn target(world: &World, door: Entity) -> Option<Vec3> {
        world.get::<DoorSlide>(door).map(|slide| slide.to.translation)
    }

    #[test]
    fn door_toggles_and_ignores_presses_while_moving() {
        let mut world = World::new();
        let slide = Vec3::new(-2.0, 0.0, 0.0);
        let door = world
            .spawn((
                Transform::default(),
                Interactive::new(Door::new(Transform::default(), slide)),
            ))
            .id();

        press(&mut world, door, 1.0);
        assert_eq!(target(&world, door), Some(slide));

        // still sliding open, so this press changes nothing
        press(&mut world, door, 1.5);
        assert_eq!(target(&world, door), Some(slide));

        press(&mut world, door, 1.0 + DOOR_DURATION + 0.01);
        assert_eq!(target(&world, door), Some(Vec3::ZERO));
    }

    #[test]
    fn slide_eases_between_poses_and_finishes() {
        let slide = DoorSlide {
            from:       Transform::default(),
            to:         Transform::from_xyz(2.0, 0.0, 0.0),
            started_at: 0.0,
        };

        let halfway = slide.pose(DOOR_DURATION * 0.5).map(|pose| pose.translation);
        assert!(halfway.is_some_and(|at| at.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5)));
        assert_eq!(slide.pose(DOOR_DURATION), None);
    }

    #[test]
    fn door_state_flips_per_press() {
        let mut world = World::new();
        let mut door = Door::new(Transform::default(), Vec3::X);
        let entity = world.spawn_empty().id();

        let _ = world.run_system_once(move |mut commands: Commands| {
            door.interact(entity, 0.0, &mut commands);
            assert!(door.is_open());
            assert!(door.is_busy(0.5));
            door.interact(entity, DOOR_DURATION, &mut commands);
            assert!(!door.is_open());
        });
    }
}
