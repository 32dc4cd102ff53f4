use bevy::color::palettes::tailwind;
use bevy::prelude::*;
use bevy_inspector_egui::inspector_options::std_options::NumberDisplay;
use bevy_inspector_egui::prelude::*;
use bevy_inspector_egui::quick::ResourceInspectorPlugin;

use crate::game_input::Inspector;
use crate::game_input::inspector_active;

pub struct CameraConfigPlugin;

impl Plugin for CameraConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(
            ResourceInspectorPlugin::<CameraConfig>::default()
                .run_if(inspector_active(Inspector::Camera)),
        )
        .init_resource::<CameraConfig>();
    }
}

/// Observer camera settings. Portal cameras copy the field of view and near plane so the
/// view through a portal lines up with the frame around it.
#[derive(Resource, Reflect, InspectorOptions, Debug, PartialEq, Clone, Copy)]
#[reflect(Resource, InspectorOptions)]
pub struct CameraConfig {
    pub clear_color:      Color,
    /// Vertical field of view in radians
    #[inspector(min = 0.5, max = 2.0, display = NumberDisplay::Slider)]
    pub fov:              f32,
    #[inspector(min = 0.01, max = 1.0, display = NumberDisplay::Slider)]
    pub near:             f32,
    #[inspector(min = 0.0001, max = 0.01, display = NumberDisplay::Slider)]
    pub look_sensitivity: f32,
    #[inspector(min = 0.5, max = 20.0, display = NumberDisplay::Slider)]
    pub move_speed:       f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            clear_color:      Color::from(tailwind::SLATE_900),
            fov:              std::f32::consts::FRAC_PI_3,
            near:             0.05,
            look_sensitivity: 0.002,
            move_speed:       5.0,
        }
    }
}

impl CameraConfig {
    pub fn perspective(&self) -> PerspectiveProjection {
        PerspectiveProjection {
            fov: self.fov,
            near: self.near,
            ..default()
        }
    }
}
