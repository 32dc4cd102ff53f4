mod cameras;
mod config;

use bevy::camera::visibility::Layer;
use bevy::prelude::*;

pub use cameras::ObserverCamera;
use cameras::CamerasPlugin;
pub use config::CameraConfig;
use config::CameraConfigPlugin;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(CameraConfigPlugin)
            .add_plugins(CamerasPlugin);
    }
}

/// Portal cameras draw into their textures before the observer draws the frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraOrder {
    Portal,
    Observer,
}

impl CameraOrder {
    pub const fn order(self) -> isize {
        match self {
            Self::Portal => -1,
            Self::Observer => 0,
        }
    }
}

// the observer camera sees both layers, portal cameras only see the world so a
// portal never renders its own screen or the screen of its partner
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderLayer {
    Both,
    World,
    Screens,
}

impl RenderLayer {
    pub const fn layers(self) -> &'static [Layer] {
        match self {
            Self::Both => &[0, 1],
            Self::World => &[0],
            Self::Screens => &[1],
        }
    }
}
