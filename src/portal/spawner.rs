//! The portal gun: raycasts from the holder's eye onto portal surfaces, places a portal
//! per slot, replaces whatever occupied the slot before, and links the pair once both
//! slots are filled.
use std::f32::consts::PI;

use avian3d::prelude::*;
use bevy::camera::visibility::RenderLayers;
use bevy::prelude::*;
use bevy_enhanced_input::prelude::*;

use super::components::Portal;
use super::components::PortalCamera;
use super::components::PortalScreen;
use super::components::PortalSlot;
use super::config::PortalConfig;
use super::config::ScreenShape;
use super::lifecycle::PortalLifecycle;
use crate::camera::CameraOrder;
use crate::camera::RenderLayer;
use crate::game_input::DespawnAllPortals;
use crate::game_input::FirePrimary;
use crate::game_input::FireSecondary;
use crate::physics::GameLayer;

/// Which portal occupies each slot for the body holding the gun
#[derive(Component, Reflect, Debug, Default, Clone, Copy)]
#[reflect(Component)]
pub struct PortalGun {
    primary:   Option<Entity>,
    secondary: Option<Entity>,
}

impl PortalGun {
    pub const fn slot(&self, slot: PortalSlot) -> Option<Entity> {
        match slot {
            PortalSlot::Primary => self.primary,
            PortalSlot::Secondary => self.secondary,
        }
    }

    const fn slot_mut(&mut self, slot: PortalSlot) -> &mut Option<Entity> {
        match slot {
            PortalSlot::Primary => &mut self.primary,
            PortalSlot::Secondary => &mut self.secondary,
        }
    }

    /// Both portals, once both slots are filled
    pub const fn pair(&self) -> Option<(Entity, Entity)> {
        match (self.slot(PortalSlot::Primary), self.slot(PortalSlot::Secondary)) {
            (Some(primary), Some(secondary)) => Some((primary, secondary)),
            _ => None,
        }
    }
}

/// Request to fire the gun held by `entity` into `slot`
#[derive(EntityEvent, Debug, Clone, Copy)]
pub struct FirePortal {
    pub entity: Entity,
    pub slot:   PortalSlot,
}

/// A raycast hit a portal surface. `entity` is the gun holder, `surface` the collider
/// that was hit.
#[derive(EntityEvent, Debug, Clone, Copy)]
pub struct PlacePortal {
    pub entity:  Entity,
    pub slot:    PortalSlot,
    pub point:   Vec3,
    pub normal:  Dir3,
    pub surface: Option<Entity>,
}

/// Destroys every portal placed by any gun
#[derive(Event, Debug, Clone, Copy)]
pub struct DespawnPortals;

/// Screen meshes, unit sized and scaled per portal
#[derive(Resource, Debug, Default, Clone)]
pub struct PortalAssets {
    square: Handle<Mesh>,
    oval:   Handle<Mesh>,
}

impl PortalAssets {
    fn screen_mesh(&self, shape: ScreenShape) -> Handle<Mesh> {
        match shape {
            ScreenShape::Square => self.square.clone(),
            ScreenShape::Oval { .. } => self.oval.clone(),
        }
    }
}

pub fn init_portal_assets(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
    commands.insert_resource(PortalAssets {
        square: meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
        oval:   meshes.add(Extrusion::new(Ellipse::new(0.5, 0.5), 1.0)),
    });
}

/// Pose of a portal placed at `point` on a surface facing `normal`. The portal is
/// pushed `bias` off the surface and faces out of it. The secondary slot is turned
/// half way around its up axis so stepping into one portal walks out of the other.
pub fn placement(point: Vec3, normal: Dir3, slot: PortalSlot, bias: f32) -> Transform {
    let up = if normal.dot(Vec3::Y).abs() > 0.999 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let mut transform = Transform::from_translation(point + normal * bias).looking_to(normal, up);
    if slot == PortalSlot::Secondary {
        transform.rotate_local_y(PI);
    }
    transform
}

pub fn fire_primary(
    _fire: On<Start<FirePrimary>>,
    mut commands: Commands,
    gun: Single<Entity, With<PortalGun>>,
) {
    commands.trigger(FirePortal {
        entity: *gun,
        slot:   PortalSlot::Primary,
    });
}

pub fn fire_secondary(
    _fire: On<Start<FireSecondary>>,
    mut commands: Commands,
    gun: Single<Entity, With<PortalGun>>,
) {
    commands.trigger(FirePortal {
        entity: *gun,
        slot:   PortalSlot::Secondary,
    });
}

pub fn despawn_all_portals(_despawn: On<Start<DespawnAllPortals>>, mut commands: Commands) {
    commands.trigger(DespawnPortals);
}

pub fn fire_portal(
    fire: On<FirePortal>,
    mut commands: Commands,
    config: Res<PortalConfig>,
    spatial_query: SpatialQuery,
    guns: Query<&GlobalTransform, With<PortalGun>>,
) {
    let Ok(gun) = guns.get(fire.entity) else {
        return;
    };
    let origin = gun.translation();
    let direction = gun.forward();
    let filter = SpatialQueryFilter::from_mask(LayerMask::from([GameLayer::PortalSurface]));

    let Some(hit) = spatial_query.cast_ray(origin, direction, config.max_distance, true, &filter)
    else {
        debug!("{:?} portal missed", fire.slot);
        return;
    };
    let Ok(normal) = Dir3::new(hit.normal) else {
        return;
    };

    commands.trigger(PlacePortal {
        entity: fire.entity,
        slot: fire.slot,
        point: origin + direction * hit.distance,
        normal,
        surface: Some(hit.entity),
    });
}

pub fn place_portal(
    place: On<PlacePortal>,
    mut commands: Commands,
    config: Res<PortalConfig>,
    assets: Res<PortalAssets>,
    mut lifecycle: PortalLifecycle,
    mut guns: Query<&mut PortalGun>,
) {
    let Ok(mut gun) = guns.get_mut(place.entity) else {
        return;
    };

    if let Some(previous) = gun.slot_mut(place.slot).take() {
        lifecycle.destroy(&mut commands, previous);
    }

    let transform = placement(place.point, place.normal, place.slot, config.bias);
    let portal = spawn_portal(
        &mut commands,
        &mut lifecycle,
        &config,
        &assets,
        place.slot,
        transform,
        place.surface,
    );
    *gun.slot_mut(place.slot) = Some(portal);
}

fn spawn_portal(
    commands: &mut Commands,
    lifecycle: &mut PortalLifecycle,
    config: &PortalConfig,
    assets: &PortalAssets,
    slot: PortalSlot,
    transform: Transform,
    surface: Option<Entity>,
) -> Entity {
    let initial = Transform::from_scale(config.size.extend(config.screen_thickness));
    let screen = commands
        .spawn((
            Name::new(format!("{slot:?} portal screen")),
            Mesh3d(assets.screen_mesh(config.screen_shape)),
            MeshMaterial3d(lifecycle.add_screen_material(slot.color(config))),
            initial,
            RenderLayers::from_layers(RenderLayer::Screens.layers()),
        ))
        .id();

    let camera = commands
        .spawn((
            Name::new(format!("{slot:?} portal camera")),
            Camera3d::default(),
            Camera {
                order: CameraOrder::Portal.order(),
                is_active: false,
                ..default()
            },
            RenderLayers::from_layers(RenderLayer::World.layers()),
            Transform::default(),
        ))
        .id();

    let portal = commands
        .spawn((
            Name::new(format!("{slot:?} portal")),
            Portal::new(slot, screen, camera, config.half_extents()).on_surface(surface),
            transform,
            Visibility::default(),
            RigidBody::Static,
            Collider::cuboid(config.size.x, config.size.y, config.trigger_depth),
            Sensor,
            CollisionEventsEnabled,
            CollisionLayers::new(GameLayer::Portal, [GameLayer::Traveler]),
        ))
        .add_child(screen)
        .id();

    commands.entity(screen).insert(PortalScreen { portal, initial });
    commands.entity(camera).insert(PortalCamera { portal });
    lifecycle.register(portal);

    info!(
        "spawned {slot:?} portal {portal} at ({:.2}, {:.2}, {:.2})",
        transform.translation.x, transform.translation.y, transform.translation.z
    );
    portal
}

/// Links the two portals of every gun. Linking is idempotent, so this runs every frame.
pub fn link_portal_pairs(
    mut commands: Commands,
    mut lifecycle: PortalLifecycle,
    guns: Query<&PortalGun>,
) {
    for gun in &guns {
        if let Some((primary, secondary)) = gun.pair()
            && lifecycle.link(primary, secondary)
        {
            lifecycle.admit_residents(&mut commands, primary);
            lifecycle.admit_residents(&mut commands, secondary);
        }
    }
}

pub fn despawn_portals(
    _despawn: On<DespawnPortals>,
    mut commands: Commands,
    mut lifecycle: PortalLifecycle,
    mut guns: Query<&mut PortalGun>,
) {
    for mut gun in &mut guns {
        for slot in [PortalSlot::Primary, PortalSlot::Secondary] {
            if let Some(portal) = gun.slot_mut(slot).take() {
                lifecycle.destroy(&mut commands, portal);
            }
        }
    }
}
