use avian3d::prelude::*;
use bevy::color::palettes::tailwind;
use bevy::prelude::*;
use bevy_inspector_egui::inspector_options::std_options::NumberDisplay;
use bevy_inspector_egui::prelude::*;
use bevy_inspector_egui::quick::ResourceInspectorPlugin;

use crate::game_input::Inspector;
use crate::game_input::inspector_active;

pub struct PortalConfigPlugin;

impl Plugin for PortalConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(
            ResourceInspectorPlugin::<PortalConfig>::default()
                .run_if(inspector_active(Inspector::Portal)),
        )
        .init_resource::<PortalConfig>();
    }
}

/// How the screen is thickened when the observer is close enough for its near plane to
/// cut through the surface
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq)]
pub enum ScreenShape {
    /// Depth becomes the distance to a near-plane corner, pushed away from the observer
    #[default]
    Square,
    /// Depth is fixed and the screen slides along `offset_axis` instead. The numbers are
    /// tuned to the mesh, not derived from the camera.
    Oval {
        depth:       f32,
        offset_axis: Vec3,
        offset:      f32,
    },
}

impl ScreenShape {
    /// Screen transform that keeps the surface in front of the observer's near plane.
    /// `away` is +1 when the observer looks along the portal's forward axis and -1 when
    /// it looks against it.
    pub fn protect(self, initial: &Transform, corner_distance: f32, away: f32) -> Transform {
        // the screen's local forward is -Z
        match self {
            Self::Square => Transform {
                translation: Vec3::NEG_Z * corner_distance * 0.5 * away,
                scale: initial.scale.with_z(corner_distance),
                ..*initial
            },
            Self::Oval {
                depth,
                offset_axis,
                offset,
            } => Transform {
                translation: offset_axis.normalize_or_zero() * offset * away,
                scale: initial.scale.with_z(depth),
                ..*initial
            },
        }
    }
}

#[derive(Resource, Reflect, InspectorOptions, Clone, Debug)]
#[reflect(Resource, InspectorOptions)]
pub struct PortalConfig {
    /// Distance the portal is pushed off the surface along its normal
    #[inspector(min = 0.0, max = 0.1, display = NumberDisplay::Slider)]
    pub bias:               f32,
    #[inspector(min = 1.0, max = 1000.0, display = NumberDisplay::Slider)]
    pub max_distance:       f32,
    pub size:               Vec2,
    /// Depth of the trigger volume that makes bodies resident
    #[inspector(min = 0.1, max = 4.0, display = NumberDisplay::Slider)]
    pub trigger_depth:      f32,
    #[inspector(min = 0.001, max = 0.1, display = NumberDisplay::Slider)]
    pub screen_thickness:   f32,
    pub screen_shape:       ScreenShape,
    /// Far plane of the portal cameras. It must be finite for the oblique near plane.
    #[inspector(min = 10.0, max = 5000.0, display = NumberDisplay::Slider)]
    pub far:                f32,
    /// Extra layers a resident body stops colliding with. The surface a portal sits on is
    /// always passable to its residents, this only widens that.
    pub excluded_layers:    LayerMask,
    pub primary_color:      Color,
    pub secondary_color:    Color,
    pub debug:              bool,
    #[inspector(min = 0.5, max = 10.0, display = NumberDisplay::Slider)]
    pub arrow_length:       f32,
    #[inspector(min = 0.05, max = 2.0, display = NumberDisplay::Slider)]
    pub arrow_head:         f32,
    /// Shown for tuning only. Crossings compare sides, never magnitudes.
    #[inspector(min = 0.0, max = 0.5, display = NumberDisplay::Slider)]
    pub crossing_threshold: f32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            bias:               0.01,
            max_distance:       1000.0,
            size:               Vec2::new(1.6, 2.4),
            trigger_depth:      1.0,
            screen_thickness:   0.01,
            screen_shape:       ScreenShape::Square,
            far:                1000.0,
            excluded_layers:    LayerMask::NONE,
            primary_color:      Color::from(tailwind::SKY_500),
            secondary_color:    Color::from(tailwind::ORANGE_500),
            debug:              false,
            arrow_length:       5.0,
            arrow_head:         0.5,
            crossing_threshold: 0.05,
        }
    }
}

impl PortalConfig {
    /// Half extents of the trigger volume, its length is the far-reset radius
    pub fn half_extents(&self) -> Vec3 { self.size.extend(self.trigger_depth) * 0.5 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Transform { Transform::from_scale(Vec3::new(1.6, 2.4, 0.01)) }

    #[test]
    fn square_screen_grows_away_from_the_observer() {
        let protected = ScreenShape::Square.protect(&screen(), 0.2, 1.0);
        assert!((protected.scale.z - 0.2).abs() < f32::EPSILON);
        assert!(protected.translation.abs_diff_eq(Vec3::new(0.0, 0.0, -0.1), 1e-6));
        assert_eq!(protected.scale.truncate(), screen().scale.truncate());

        let flipped = ScreenShape::Square.protect(&screen(), 0.2, -1.0);
        assert!(flipped.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 0.1), 1e-6));
    }

    #[test]
    fn oval_screen_uses_configured_depth_and_axis() {
        let shape = ScreenShape::Oval {
            depth:       0.3,
            offset_axis: Vec3::new(0.0, 2.0, 0.0),
            offset:      0.25,
        };

        let protected = shape.protect(&screen(), 0.2, -1.0);

        assert!((protected.scale.z - 0.3).abs() < f32::EPSILON);
        assert!(protected.translation.abs_diff_eq(Vec3::new(0.0, -0.25, 0.0), 1e-6));
    }
}
