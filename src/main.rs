//! Portalis - seamless linked portals built with Bevy 0.18
//!
//! A first-person sandbox featuring:
//! - Pairs of portals fired onto walls that show the view through their partner
//! - Oblique near-plane clipping so nothing behind the far portal leaks into view
//! - Bodies that walk or fall through a portal and keep their momentum
//! - Bevy Remote Protocol (BRP) support for debugging

mod actor;
mod camera;
mod despawn;
mod game_input;
mod interact;
mod math;
mod physics;
mod playfield;
mod portal;
mod schedule;
mod traits;

use bevy::prelude::*;
use bevy_brp_extras::BrpExtrasPlugin;
use bevy_inspector_egui::bevy_egui::EguiPlugin;
use bevy_window_manager::WindowManagerPlugin;

use crate::actor::ActorPlugin;
use crate::camera::CameraPlugin;
use crate::despawn::DespawnPlugin;
use crate::game_input::GameInputPlugin;
use crate::interact::InteractPlugin;
use crate::physics::PhysicsPlugin;
use crate::playfield::PlayfieldPlugin;
use crate::portal::PortalPlugin;
use crate::schedule::SchedulePlugin;

fn main() {
    let mut app = App::new();

    // Get effective port from BrpExtrasPlugin to include in window title if non-default
    let brp_plugin = BrpExtrasPlugin::default();
    let (effective_port, _) = brp_plugin.get_effective_port();
    let window_title = if effective_port == bevy_brp_extras::DEFAULT_REMOTE_PORT {
        "portalis".to_string()
    } else {
        format!("portalis - {effective_port}")
    };

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: window_title,
            ..default()
        }),
        ..default()
    }));

    app.add_plugins((
        EguiPlugin::default(),
        WindowManagerPlugin,
        brp_plugin,
        ActorPlugin,
        CameraPlugin,
        DespawnPlugin,
        GameInputPlugin,
        InteractPlugin,
        PhysicsPlugin,
        PlayfieldPlugin,
        PortalPlugin,
        SchedulePlugin,
    ))
    .run();
}
