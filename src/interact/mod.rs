//! Things the observer can press. A raycast from the eye on the interact action finds
//! the nearest interactable collider and hands the press to its boxed behaviour.
mod door;
mod wall_button;

use avian3d::prelude::*;
use bevy::prelude::*;
use bevy_enhanced_input::prelude::*;
pub use door::Door;
use door::DoorPlugin;
pub use wall_button::SpawnCrate;
pub use wall_button::WallButton;
use wall_button::WallButtonPlugin;

use crate::camera::ObserverCamera;
use crate::game_input::Interact;
use crate::physics::GameLayer;

const INTERACT_DISTANCE: f32 = 3.0;

pub struct InteractPlugin;

impl Plugin for InteractPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(DoorPlugin)
            .add_plugins(WallButtonPlugin)
            .add_observer(interact);
    }
}

/// Behaviour run when the observer presses an entity
pub trait Interactable: Send + Sync + 'static {
    fn interact(&mut self, entity: Entity, elapsed: f32, commands: &mut Commands);
}

#[derive(Component)]
pub struct Interactive(pub Box<dyn Interactable>);

impl Interactive {
    pub fn new(interactable: impl Interactable) -> Self { Self(Box::new(interactable)) }
}

fn interact(
    _interact: On<Start<Interact>>,
    mut commands: Commands,
    time: Res<Time>,
    spatial_query: SpatialQuery,
    observer: Single<&GlobalTransform, With<ObserverCamera>>,
    bodies: Query<&ColliderOf>,
    mut interactives: Query<&mut Interactive>,
) {
    let filter = SpatialQueryFilter::from_mask(LayerMask::from([GameLayer::Interactable]));
    let Some(hit) = spatial_query.cast_ray(
        observer.translation(),
        observer.forward(),
        INTERACT_DISTANCE,
        true,
        &filter,
    ) else {
        return;
    };

    let target = bodies.get(hit.entity).map_or(hit.entity, |collider_of| collider_of.body);
    if let Ok(mut interactive) = interactives.get_mut(target) {
        interactive.0.interact(target, time.elapsed_secs(), &mut commands);
    }
}
