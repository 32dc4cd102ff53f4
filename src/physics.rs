use avian3d::prelude::*;
use bevy::camera::visibility::RenderLayers;
use bevy::prelude::*;
use bevy_enhanced_input::prelude::*;

use crate::actor::PortalSurfaceHooks;
use crate::camera::RenderLayer;
use crate::game_input::TogglePhysicsDebug;

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(
            avian3d::PhysicsPlugins::default().with_collision_hooks::<PortalSurfaceHooks>(),
        )
            .add_plugins(PhysicsDebugPlugin)
            .insert_resource(SubstepCount(12))
            .add_systems(Startup, init_physics_debug_gizmos)
            .add_observer(toggle_physics_debug);
    }
}

#[derive(PhysicsLayer, Clone, Copy, Debug, Default)]
pub enum GameLayer {
    #[default]
    Default,
    /// Walls and floors a portal can be fired onto
    PortalSurface,
    /// Portal trigger volumes
    Portal,
    Traveler,
    Interactable,
}

fn init_physics_debug_gizmos(mut config_store: ResMut<GizmoConfigStore>) {
    let (config, _) = config_store.config_mut::<PhysicsGizmos>();
    config.enabled = false;
    config.render_layers = RenderLayers::from_layers(RenderLayer::World.layers());
}

fn toggle_physics_debug(
    _toggle: On<Start<TogglePhysicsDebug>>,
    mut config_store: ResMut<GizmoConfigStore>,
) {
    let (config, _) = config_store.config_mut::<PhysicsGizmos>();
    config.enabled = !config.enabled;
    debug!("physics debug: {}", config.enabled);
}
