use avian3d::prelude::*;
use bevy::prelude::*;

use super::constants::DIVIDER_POSITION;
use super::constants::DIVIDER_SIZE;
use super::constants::DOOR_COLOR;
use super::constants::DOOR_POSITION;
use super::constants::DOOR_SIZE;
use super::constants::DOOR_SLIDE;
use super::constants::FLOOR_COLOR;
use super::constants::LAMP_INTENSITY;
use super::constants::LAMP_POSITION;
use super::constants::ROOM_HALF_EXTENT;
use super::constants::SUN_ILLUMINANCE;
use super::constants::WALL_COLOR;
use super::constants::WALL_HEIGHT;
use super::constants::WALL_THICKNESS;
use crate::interact::Door;
use crate::interact::Interactive;
use crate::physics::GameLayer;

pub struct RoomPlugin;

impl Plugin for RoomPlugin {
    fn build(&self, app: &mut App) { app.add_systems(Startup, (spawn_room, spawn_door, spawn_lights)); }
}

/// A static box on the portal surface layer
fn surface(
    name: &str,
    size: Vec3,
    position: Vec3,
    mesh: &mut Assets<Mesh>,
    material: Handle<StandardMaterial>,
) -> impl Bundle {
    (
        Name::new(name.to_string()),
        Mesh3d(mesh.add(Cuboid::from_size(size))),
        MeshMaterial3d(material),
        Transform::from_translation(position),
        RigidBody::Static,
        Collider::cuboid(size.x, size.y, size.z),
        CollisionLayers::new(GameLayer::PortalSurface, LayerMask::ALL),
        // residents of a portal on this surface pass through it
        ActiveCollisionHooks::MODIFY_CONTACTS,
    )
}

/// Floor, four walls and a divider, all on the portal surface layer
fn spawn_room(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let floor_material = materials.add(StandardMaterial {
        base_color: FLOOR_COLOR,
        perceptual_roughness: 0.9,
        ..default()
    });
    let wall_material = materials.add(StandardMaterial {
        base_color: WALL_COLOR,
        perceptual_roughness: 0.8,
        ..default()
    });

    let span = ROOM_HALF_EXTENT * 2.0;
    let half_height = WALL_HEIGHT * 0.5;
    let offset = ROOM_HALF_EXTENT + WALL_THICKNESS * 0.5;

    commands.spawn(surface(
        "Floor",
        Vec3::new(span, WALL_THICKNESS, span),
        Vec3::new(0.0, -WALL_THICKNESS * 0.5, 0.0),
        &mut meshes,
        floor_material,
    ));

    let across = Vec3::new(span, WALL_HEIGHT, WALL_THICKNESS);
    let along = Vec3::new(WALL_THICKNESS, WALL_HEIGHT, span);
    let walls = [
        ("North wall", across, Vec3::new(0.0, half_height, -offset)),
        ("South wall", across, Vec3::new(0.0, half_height, offset)),
        ("East wall", along, Vec3::new(offset, half_height, 0.0)),
        ("West wall", along, Vec3::new(-offset, half_height, 0.0)),
        ("Divider", DIVIDER_SIZE, DIVIDER_POSITION),
    ];
    for (name, size, position) in walls {
        commands.spawn(surface(name, size, position, &mut meshes, wall_material.clone()));
    }
}

/// A sliding door beside the divider. It blocks bodies and is pressed directly.
fn spawn_door(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let transform = Transform::from_translation(DOOR_POSITION);
    commands.spawn((
        Name::new("Door"),
        Interactive::new(Door::new(transform, DOOR_SLIDE)),
        Mesh3d(meshes.add(Cuboid::from_size(DOOR_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: DOOR_COLOR,
            ..default()
        })),
        transform,
        RigidBody::Kinematic,
        Collider::cuboid(DOOR_SIZE.x, DOOR_SIZE.y, DOOR_SIZE.z),
        CollisionLayers::new(GameLayer::Interactable, LayerMask::ALL),
    ));
}

fn spawn_lights(mut commands: Commands) {
    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            illuminance: SUN_ILLUMINANCE,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 12.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        Name::new("Lamp"),
        PointLight {
            intensity: LAMP_INTENSITY,
            range: ROOM_HALF_EXTENT * 3.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(LAMP_POSITION),
    ));
}
