use bevy::prelude::*;

#[derive(Debug, Hash, PartialEq, Eq, Clone, SystemSet)]
pub enum InGameSet {
    CollisionDetection,
    EntityUpdates,
    DespawnEntities,
}

pub struct SchedulePlugin;

impl Plugin for SchedulePlugin {
    fn build(&self, app: &mut App) {
        // residents are known before links and screens are reconciled, and anything
        // despawned this frame has already been seen by both
        app.configure_sets(
            Update,
            (
                InGameSet::CollisionDetection,
                InGameSet::EntityUpdates,
                InGameSet::DespawnEntities,
            )
                .chain(),
        );
    }
}
