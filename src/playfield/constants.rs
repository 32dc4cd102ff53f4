//! Constants for the playfield module
//! All magic numbers and configuration values used within playfield/

use bevy::color::Color;
use bevy::math::Vec3;

// =============================================================================
// Room
// =============================================================================

/// Half the width and depth of the floor
pub const ROOM_HALF_EXTENT: f32 = 10.0;

pub const WALL_HEIGHT: f32 = 5.0;

pub const WALL_THICKNESS: f32 = 0.5;

/// Free-standing wall in the middle of the room, gives portals a second face to land on
pub const DIVIDER_SIZE: Vec3 = Vec3::new(6.0, WALL_HEIGHT, WALL_THICKNESS);

pub const DIVIDER_POSITION: Vec3 = Vec3::new(0.0, WALL_HEIGHT * 0.5, -3.0);

pub const FLOOR_COLOR: Color = Color::srgb(0.35, 0.35, 0.38);

pub const WALL_COLOR: Color = Color::srgb(0.75, 0.74, 0.70);

// =============================================================================
// Lighting
// =============================================================================

pub const SUN_ILLUMINANCE: f32 = 8_000.0;

pub const LAMP_INTENSITY: f32 = 2_000_000.0;

pub const LAMP_POSITION: Vec3 = Vec3::new(0.0, WALL_HEIGHT - 0.5, 0.0);

// =============================================================================
// Crates
// =============================================================================

pub const CRATE_SIZE: f32 = 0.8;

pub const CRATE_COLOR: Color = Color::srgb(0.72, 0.48, 0.24);

/// Horizontal scatter applied to each requested crate
pub const CRATE_DROP_JITTER: f32 = 0.3;

pub const FIRST_CRATE_POSITION: Vec3 = Vec3::new(2.5, CRATE_SIZE * 0.5, 2.0);

// =============================================================================
// Wall Button
// =============================================================================

pub const BUTTON_SIZE: Vec3 = Vec3::new(0.3, 0.3, 0.1);

/// On the inside face of the east wall at chest height
pub const BUTTON_POSITION: Vec3 = Vec3::new(ROOM_HALF_EXTENT - 0.05, 1.3, 4.0);

/// Where pressed crates drop in
pub const CRATE_SPAWN_POINT: Vec3 = Vec3::new(ROOM_HALF_EXTENT - 2.0, 3.0, 4.0);

// =============================================================================
// Door
// =============================================================================

pub const DOOR_SIZE: Vec3 = Vec3::new(2.0, 2.6, 0.2);

/// Closes the gap east of the divider
pub const DOOR_POSITION: Vec3 = Vec3::new(
    DIVIDER_POSITION.x + DIVIDER_SIZE.x * 0.5 + DOOR_SIZE.x * 0.5,
    DOOR_SIZE.y * 0.5,
    DIVIDER_POSITION.z,
);

/// Opening tucks the panel behind the divider
pub const DOOR_SLIDE: Vec3 = Vec3::new(-DOOR_SIZE.x, 0.0, 0.0);

pub const DOOR_COLOR: Color = Color::srgb(0.25, 0.45, 0.55);
