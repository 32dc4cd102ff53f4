//! Crates are the demo's travelers. One sits in the room from the start and the wall
//! button drops more in.
use avian3d::prelude::*;
use bevy::prelude::*;

use super::constants::BUTTON_POSITION;
use super::constants::BUTTON_SIZE;
use super::constants::CRATE_COLOR;
use super::constants::CRATE_DROP_JITTER;
use super::constants::CRATE_SIZE;
use super::constants::CRATE_SPAWN_POINT;
use super::constants::FIRST_CRATE_POSITION;
use crate::actor::Traveler;
use crate::actor::traveler_collision_layers;
use crate::interact::Interactive;
use crate::interact::SpawnCrate;
use crate::interact::WallButton;
use crate::physics::GameLayer;
use crate::portal::SliceMaterial;
use crate::portal::slice_material;

pub struct CratePlugin;

impl Plugin for CratePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Startup,
            (init_crate_assets, (spawn_first_crate, spawn_wall_button)).chain(),
        )
        .add_observer(spawn_requested_crate)
        .register_type::<Crate>();
    }
}

#[derive(Component, Reflect, Debug, Default)]
#[reflect(Component)]
pub struct Crate;

#[derive(Resource, Debug, Clone)]
struct CrateAssets {
    mesh:   Handle<Mesh>,
    button: Handle<Mesh>,
}

fn init_crate_assets(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
    commands.insert_resource(CrateAssets {
        mesh:   meshes.add(Cuboid::from_length(CRATE_SIZE)),
        button: meshes.add(Cuboid::from_size(BUTTON_SIZE)),
    });
}

/// Every crate gets its own material so portals can slice it independently
fn spawn_crate(
    commands: &mut Commands,
    assets: &CrateAssets,
    materials: &mut Assets<SliceMaterial>,
    at: Vec3,
) -> Entity {
    let material = materials.add(slice_material(StandardMaterial {
        base_color: CRATE_COLOR,
        perceptual_roughness: 0.7,
        ..default()
    }));
    let entity = commands
        .spawn((
            Name::new("Crate"),
            Crate,
            Traveler::default(),
            Mesh3d(assets.mesh.clone()),
            MeshMaterial3d(material),
            Transform::from_translation(at),
            RigidBody::Dynamic,
            Collider::cuboid(CRATE_SIZE, CRATE_SIZE, CRATE_SIZE),
            traveler_collision_layers(),
        ))
        .id();
    debug!("spawned crate {entity} at ({:.2}, {:.2}, {:.2})", at.x, at.y, at.z);
    entity
}

fn spawn_first_crate(
    mut commands: Commands,
    assets: Res<CrateAssets>,
    mut materials: ResMut<Assets<SliceMaterial>>,
) {
    spawn_crate(&mut commands, &assets, &mut materials, FIRST_CRATE_POSITION);
}

/// Jitters the drop point so crates dropped in a row don't stack perfectly
fn spawn_requested_crate(
    request: On<SpawnCrate>,
    mut commands: Commands,
    assets: Res<CrateAssets>,
    mut materials: ResMut<Assets<SliceMaterial>>,
) {
    let jitter = Vec3::new(
        rand::random_range(-CRATE_DROP_JITTER..CRATE_DROP_JITTER),
        0.0,
        rand::random_range(-CRATE_DROP_JITTER..CRATE_DROP_JITTER),
    );
    spawn_crate(&mut commands, &assets, &mut materials, request.at + jitter);
}

fn spawn_wall_button(
    mut commands: Commands,
    assets: Res<CrateAssets>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // faces into the room from the east wall
    let transform =
        Transform::from_translation(BUTTON_POSITION).looking_to(Vec3::NEG_X, Vec3::Y);
    commands.spawn((
        Name::new("WallButton"),
        Interactive::new(WallButton::new(CRATE_SPAWN_POINT, transform)),
        Mesh3d(assets.button.clone()),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.85, 0.15, 0.15),
            ..default()
        })),
        transform,
        RigidBody::Static,
        Collider::cuboid(BUTTON_SIZE.x, BUTTON_SIZE.y, BUTTON_SIZE.z),
        CollisionLayers::new(GameLayer::Interactable, LayerMask::ALL),
    ));
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;

    #[test]
    fn requested_crates_are_sliceable_travelers() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_asset::<SliceMaterial>()
            .add_observer(spawn_requested_crate);
        let _ = app.world_mut().run_system_once(init_crate_assets);

        app.world_mut().trigger(SpawnCrate {
            at: CRATE_SPAWN_POINT,
        });
        app.world_mut().trigger(SpawnCrate {
            at: FIRST_CRATE_POSITION,
        });

        let world = app.world_mut();
        world.flush();
        let mut crates = world
            .query_filtered::<&MeshMaterial3d<SliceMaterial>, (With<Crate>, With<Traveler>)>();
        let materials: Vec<_> = crates
            .iter(world)
            .map(|material| material.0.clone())
            .collect();

        assert_eq!(materials.len(), 2);
        assert_ne!(materials[0], materials[1]);
        assert_eq!(world.resource::<Assets<SliceMaterial>>().len(), 2);
    }
}
