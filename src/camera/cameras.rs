use avian3d::prelude::*;
use bevy::camera::visibility::RenderLayers;
use bevy::prelude::*;
use bevy::window::CursorGrabMode;
use bevy::window::CursorOptions;
use bevy::window::PrimaryWindow;
use bevy_enhanced_input::prelude::*;

use crate::actor::Traveler;
use crate::actor::traveler_collision_layers;
use crate::camera::CameraOrder;
use crate::camera::RenderLayer;
use crate::camera::config::CameraConfig;
use crate::game_input::Look;
use crate::game_input::Move;
use crate::game_input::player_actions;
use crate::portal::PortalGun;

/// Keeps the observer from flipping over the top when looking straight up or down
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
const EYE_HEIGHT: f32 = 1.6;
const BODY_RADIUS: f32 = 0.3;

pub struct CamerasPlugin;

impl Plugin for CamerasPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (spawn_observer_camera, grab_cursor))
            .add_systems(
                Update,
                update_camera_settings.run_if(resource_changed::<CameraConfig>),
            )
            .add_observer(look)
            .add_observer(walk)
            .add_observer(stop_walking);
    }
}

/// The player's eye. Portals compose their views from this camera's pose and it travels
/// through portals like any other body.
#[derive(Component, Reflect, Debug, Default)]
#[reflect(Component)]
pub struct ObserverCamera;

pub fn spawn_observer_camera(mut commands: Commands, config: Res<CameraConfig>) {
    commands.spawn((
        Name::new("ObserverCamera"),
        ObserverCamera,
        Camera3d::default(),
        Camera {
            order: CameraOrder::Observer.order(),
            ..default()
        },
        Projection::Perspective(config.perspective()),
        RenderLayers::from_layers(RenderLayer::Both.layers()),
        Transform::from_xyz(0.0, EYE_HEIGHT, 6.0),
        Traveler::default(),
        RigidBody::Dynamic,
        LockedAxes::ROTATION_LOCKED,
        PortalGun::default(),
        player_actions(),
        children![(
            Name::new("ObserverBody"),
            Collider::capsule(BODY_RADIUS, EYE_HEIGHT - 2.0 * BODY_RADIUS),
            traveler_collision_layers(),
            Transform::from_xyz(0.0, -EYE_HEIGHT * 0.5, 0.0),
        )],
    ));
}

fn grab_cursor(mut cursor: Single<&mut CursorOptions, With<PrimaryWindow>>) {
    cursor.grab_mode = CursorGrabMode::Locked;
    cursor.visible = false;
}

fn update_camera_settings(
    config: Res<CameraConfig>,
    mut clear_color: ResMut<ClearColor>,
    mut projection: Single<&mut Projection, With<ObserverCamera>>,
) {
    clear_color.0 = config.clear_color;
    if let Projection::Perspective(perspective) = projection.as_mut() {
        perspective.fov = config.fov;
        perspective.near = config.near;
    }
}

fn look(
    look: On<Fire<Look>>,
    config: Res<CameraConfig>,
    mut camera: Single<&mut Transform, With<ObserverCamera>>,
) {
    let delta = look.value * config.look_sensitivity;
    // rebuilding from yaw and pitch also drops any roll picked up from a tilted portal
    let (yaw, pitch, _) = camera.rotation.to_euler(EulerRot::YXZ);
    let pitch = (pitch - delta.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    camera.rotation = Quat::from_euler(EulerRot::YXZ, yaw - delta.x, pitch, 0.0);
}

fn walk(
    walk: On<Fire<Move>>,
    config: Res<CameraConfig>,
    camera: Single<(&Transform, &mut LinearVelocity), With<ObserverCamera>>,
) {
    let (transform, mut velocity) = camera.into_inner();
    let (yaw, _, _) = transform.rotation.to_euler(EulerRot::YXZ);
    let direction = Quat::from_rotation_y(yaw) * Vec3::new(walk.value.x, 0.0, -walk.value.y);
    let planar = direction.clamp_length_max(1.0) * config.move_speed;
    velocity.x = planar.x;
    velocity.z = planar.z;
}

fn stop_walking(
    _stop: On<Complete<Move>>,
    mut velocity: Single<&mut LinearVelocity, With<ObserverCamera>>,
) {
    velocity.x = 0.0;
    velocity.z = 0.0;
}
