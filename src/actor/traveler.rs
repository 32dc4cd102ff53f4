//! Per-body portal state: side history per portal, the teleported guard, the clone that
//! is drawn on the far side while the body straddles a portal, and the slice planes that
//! cut the body and its clone along the portal surface.
use avian3d::prelude::*;
use bevy::ecs::system::SystemParam;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use crate::despawn::despawn;
use crate::math::Side;
use crate::physics::GameLayer;
use crate::portal::Portal;
use crate::portal::PortalConfig;
use crate::portal::PortalSystems;
use crate::portal::SliceMaterial;
use crate::portal::SlicePlane;
use crate::portal::TravelerEntered;
use crate::portal::TravelerExited;

pub struct TravelerPlugin;

impl Plugin for TravelerPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(on_traveler_entered)
            .add_observer(on_traveler_exited)
            .add_observer(despawn_clone)
            .add_systems(PostUpdate, push_slices.after(PortalSystems::Crossing));
    }
}

/// Collision layers every traveler uses. Portal surfaces stay in the filter, only the
/// surface under a portal the body is resident at lets it through.
pub fn traveler_collision_layers() -> CollisionLayers {
    CollisionLayers::new(
        GameLayer::Traveler,
        [
            GameLayer::Default,
            GameLayer::PortalSurface,
            GameLayer::Portal,
            GameLayer::Traveler,
            GameLayer::Interactable,
        ],
    )
}

/// Slicing for a traveler and its clone
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq)]
pub struct SlicePlanes {
    pub traveler: SlicePlane,
    pub clone:    SlicePlane,
}

impl SlicePlanes {
    pub const NONE: Self = Self {
        traveler: SlicePlane::NONE,
        clone:    SlicePlane::NONE,
    };

    /// The traveler keeps the part on `side` of `portal`, the clone keeps the part that
    /// has come out of `linked`. A body exactly on the plane gets zero normals.
    pub fn across(side: Side, portal: &Transform, linked: &Transform) -> Self {
        let sign = side.sign();
        Self {
            traveler: SlicePlane::new(portal.translation, portal.forward() * -sign),
            clone:    SlicePlane::new(linked.translation, linked.forward() * sign),
        }
    }
}

/// A body that portals can carry
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct Traveler {
    /// Side last seen for each portal this body is resident at
    previous_sides:     HashMap<Entity, Side>,
    /// Surface each of those portals sits on
    surfaces:           HashMap<Entity, Entity>,
    /// Set on the frame a teleport happens, cleared on the next frame without one
    pub was_teleported: bool,
    pub clone:          Option<Entity>,
    pub slices:         SlicePlanes,
    /// Filter bits removed from each collider while resident, `None` when nothing is
    /// excluded
    excluded:           Option<Vec<(Entity, LayerMask)>>,
}

impl Traveler {
    pub fn previous_side(&self, portal: Entity) -> Option<Side> {
        self.previous_sides.get(&portal).copied()
    }

    pub fn set_previous_side(&mut self, portal: Entity, side: Side) {
        self.previous_sides.insert(portal, side);
    }

    /// Drops the side history for `portal`. Returns true when no portal is left.
    pub fn forget(&mut self, portal: Entity) -> bool {
        self.previous_sides.remove(&portal);
        self.surfaces.remove(&portal);
        self.previous_sides.is_empty()
    }

    pub fn pass_through(&mut self, portal: Entity, surface: Entity) {
        self.surfaces.insert(portal, surface);
    }

    /// True while resident at a portal fired onto `surface`
    pub fn passes_through(&self, surface: Entity) -> bool {
        self.surfaces.values().any(|passing| *passing == surface)
    }

    /// A change of side teleports unless a teleport already happened this frame
    pub fn should_teleport(&self, previous: Side, current: Side) -> bool {
        !self.was_teleported && Side::crossed(previous, current)
    }
}

/// The far-side copy of a traveler's visual
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct TravelerClone {
    pub traveler: Entity,
}

fn on_traveler_entered(
    entered: On<TravelerEntered>,
    mut commands: Commands,
    config: Res<PortalConfig>,
    portals: Query<(&Transform, Option<&Portal>), Without<Traveler>>,
    mut travelers: Query<(
        &Transform,
        &mut Traveler,
        Option<&Mesh3d>,
        Option<&MeshMaterial3d<SliceMaterial>>,
        Option<&Name>,
    )>,
    mut colliders: Query<(Entity, Option<&ColliderOf>, &mut CollisionLayers)>,
    mut visibilities: Query<&mut Visibility, With<TravelerClone>>,
    mut materials: ResMut<Assets<SliceMaterial>>,
) {
    let Ok((portal_transform, portal)) = portals.get(entered.portal) else {
        return;
    };
    let Ok((transform, mut traveler, mesh, material, name)) = travelers.get_mut(entered.entity)
    else {
        return;
    };

    traveler.set_previous_side(
        entered.portal,
        Side::of_point(transform.translation, portal_transform),
    );
    if let Some(surface) = portal.and_then(|portal| portal.surface) {
        traveler.pass_through(entered.portal, surface);
    }

    match traveler.clone {
        Some(clone) => {
            if let Ok(mut visibility) = visibilities.get_mut(clone) {
                *visibility = Visibility::Inherited;
            }
        },
        None => {
            if let (Some(mesh), Some(material)) = (mesh, material)
                && let Some(base) = materials.get(&material.0).cloned()
            {
                let clone = commands
                    .spawn((
                        Name::new(format!(
                            "{} clone",
                            name.map_or("Traveler", |name| name.as_str())
                        )),
                        TravelerClone {
                            traveler: entered.entity,
                        },
                        mesh.clone(),
                        MeshMaterial3d(materials.add(base)),
                        *transform,
                        Visibility::Inherited,
                    ))
                    .id();
                traveler.clone = Some(clone);
            }
        },
    }

    if traveler.excluded.is_none() {
        traveler.excluded = Some(exclude_layers(
            entered.entity,
            config.excluded_layers,
            &mut colliders,
        ));
    }

    debug!("traveler {} entered portal {}", entered.entity, entered.portal);
}

/// Removes `excluded` from the filters of every collider belonging to `traveler` and
/// returns the bits that were actually removed
fn exclude_layers(
    traveler: Entity,
    excluded: LayerMask,
    colliders: &mut Query<(Entity, Option<&ColliderOf>, &mut CollisionLayers)>,
) -> Vec<(Entity, LayerMask)> {
    let mut removed = Vec::new();
    for (entity, collider_of, mut layers) in colliders.iter_mut() {
        let belongs = entity == traveler || collider_of.is_some_and(|of| of.body == traveler);
        if !belongs {
            continue;
        }
        let bits = layers.filters.0 & excluded.0;
        if bits != 0 {
            layers.filters.0 &= !bits;
            removed.push((entity, LayerMask(bits)));
        }
    }
    removed
}

fn on_traveler_exited(
    exited: On<TravelerExited>,
    mut travelers: Query<&mut Traveler>,
    mut colliders: Query<&mut CollisionLayers>,
    mut visibilities: Query<&mut Visibility, With<TravelerClone>>,
) {
    let Ok(mut traveler) = travelers.get_mut(exited.entity) else {
        return;
    };
    debug!("traveler {} exited portal {}", exited.entity, exited.portal);
    // still straddling another portal
    if !traveler.forget(exited.portal) {
        return;
    }

    if let Some(clone) = traveler.clone
        && let Ok(mut visibility) = visibilities.get_mut(clone)
    {
        *visibility = Visibility::Hidden;
    }
    for (collider, bits) in traveler.excluded.take().unwrap_or_default() {
        if let Ok(mut layers) = colliders.get_mut(collider) {
            layers.filters.0 |= bits.0;
        }
    }
    traveler.slices = SlicePlanes::NONE;
    traveler.was_teleported = false;
}

/// Drops contacts between a traveler and the surface under a portal it is resident at, so
/// the body can walk into the portal while every other wall and the floor still hold it.
/// Only surfaces with [`ActiveCollisionHooks::MODIFY_CONTACTS`] are asked.
#[derive(SystemParam)]
pub struct PortalSurfaceHooks<'w, 's> {
    travelers: Query<'w, 's, &'static Traveler>,
    bodies:    Query<'w, 's, &'static ColliderOf>,
}

impl PortalSurfaceHooks<'_, '_> {
    fn traveler(&self, collider: Entity) -> Option<&Traveler> {
        let body = self.bodies.get(collider).map_or(collider, |of| of.body);
        self.travelers.get(body).ok()
    }

    pub fn keeps_contact(&self, collider1: Entity, collider2: Entity) -> bool {
        let passes = |traveler: Entity, surface: Entity| {
            self.traveler(traveler)
                .is_some_and(|traveler| traveler.passes_through(surface))
        };
        !passes(collider1, collider2) && !passes(collider2, collider1)
    }
}

impl CollisionHooks for PortalSurfaceHooks<'_, '_> {
    fn modify_contacts(&self, contacts: &mut ContactPair, _commands: &mut Commands) -> bool {
        self.keeps_contact(contacts.collider1, contacts.collider2)
    }
}

/// Copies each traveler's slice planes into its own material and its clone's
fn push_slices(
    travelers: Query<(&Traveler, Option<&MeshMaterial3d<SliceMaterial>>)>,
    clones: Query<&MeshMaterial3d<SliceMaterial>, With<TravelerClone>>,
    mut materials: ResMut<Assets<SliceMaterial>>,
) {
    for (traveler, material) in &travelers {
        if let Some(material) = material {
            write_slice(&mut materials, &material.0, traveler.slices.traveler);
        }
        if let Some(clone) = traveler.clone
            && let Ok(material) = clones.get(clone)
        {
            write_slice(&mut materials, &material.0, traveler.slices.clone);
        }
    }
}

/// Only touches the asset when the plane changed, so unchanged materials are not
/// re-uploaded
fn write_slice(
    materials: &mut Assets<SliceMaterial>,
    handle: &Handle<SliceMaterial>,
    plane: SlicePlane,
) {
    if materials
        .get(handle)
        .is_some_and(|material| material.extension.slice != plane)
        && let Some(material) = materials.get_mut(handle)
    {
        material.extension.slice = plane;
    }
}

fn despawn_clone(
    removed: On<Remove, Traveler>,
    mut commands: Commands,
    travelers: Query<&Traveler>,
) {
    if let Ok(traveler) = travelers.get(removed.entity)
        && let Some(clone) = traveler.clone
    {
        despawn(&mut commands, clone);
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use bevy::ecs::system::RunSystemOnce;

    use super::*;
    use crate::portal::PortalSlot;

    #[test]
    fn teleport_guard_blocks_a_second_flip() {
        let mut traveler = Traveler::default();
        assert!(traveler.should_teleport(Side::Behind, Side::Front));
        assert!(!traveler.should_teleport(Side::Front, Side::Front));

        traveler.was_teleported = true;
        assert!(!traveler.should_teleport(Side::Front, Side::Behind));
    }

    #[test]
    fn forgetting_the_last_portal_ends_straddling() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut traveler = Traveler::default();
        traveler.set_previous_side(a, Side::Front);
        traveler.set_previous_side(b, Side::Behind);

        assert!(!traveler.forget(a));
        assert_eq!(traveler.previous_side(a), None);
        assert_eq!(traveler.previous_side(b), Some(Side::Behind));
        assert!(traveler.forget(b));
    }

    #[test]
    fn traveler_and_clone_keep_complementary_halves() {
        let portal = Transform::default();
        let linked =
            Transform::from_xyz(10.0, 0.0, 0.0).with_rotation(Quat::from_rotation_y(PI));
        // forward is -Z, so z = 1 is behind the portal
        let planes = SlicePlanes::across(Side::Behind, &portal, &linked);

        assert!(planes.traveler.keeps(Vec3::new(0.0, 0.0, 1.0)));
        assert!(!planes.traveler.keeps(Vec3::new(0.0, 0.0, -1.0)));

        // the part past the plane maps to the front of the linked portal, +Z after the turn
        assert!(planes.clone.keeps(Vec3::new(10.0, 0.0, 1.0)));
        assert!(!planes.clone.keeps(Vec3::new(10.0, 0.0, -1.0)));
    }

    #[test]
    fn on_the_plane_nothing_is_sliced() {
        let planes = SlicePlanes::across(Side::On, &Transform::default(), &Transform::default());
        assert_eq!(planes.traveler.normal, Vec3::ZERO);
        assert_eq!(planes.clone.normal, Vec3::ZERO);
    }

    fn entry_app(config: PortalConfig) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(AssetPlugin::default())
            .init_asset::<SliceMaterial>()
            .insert_resource(config)
            .add_observer(on_traveler_entered)
            .add_observer(on_traveler_exited);
        app
    }

    fn keeps_contact(app: &mut App, collider1: Entity, collider2: Entity) -> Option<bool> {
        app.world_mut()
            .run_system_once(move |hooks: PortalSurfaceHooks| {
                hooks.keeps_contact(collider1, collider2)
            })
            .ok()
    }

    #[test]
    fn residents_pass_only_through_the_surface_under_their_portal() {
        let mut app = entry_app(PortalConfig::default());
        let surface_layers = CollisionLayers::new(GameLayer::PortalSurface, LayerMask::ALL);
        let wall = app.world_mut().spawn(surface_layers).id();
        let floor = app.world_mut().spawn(surface_layers).id();
        let portal = app
            .world_mut()
            .spawn((
                Portal::new(
                    PortalSlot::Primary,
                    Entity::PLACEHOLDER,
                    Entity::PLACEHOLDER,
                    Vec3::ONE,
                )
                .on_surface(Some(wall)),
                Transform::from_xyz(0.0, 1.2, 0.0),
            ))
            .id();
        let traveler = app
            .world_mut()
            .spawn((
                Traveler::default(),
                Transform::from_xyz(0.0, 1.2, 0.5),
                traveler_collision_layers(),
            ))
            .id();

        app.world_mut().trigger(TravelerEntered {
            entity: traveler,
            portal,
        });

        assert_eq!(keeps_contact(&mut app, traveler, wall), Some(false));
        assert_eq!(keeps_contact(&mut app, wall, traveler), Some(false));
        assert_eq!(keeps_contact(&mut app, floor, traveler), Some(true));
        // nothing is excluded by layer, so the floor still holds the body up
        let layers = app.world().get::<CollisionLayers>(traveler).copied();
        assert!(layers.is_some_and(|layers| layers.interacts_with(surface_layers)));

        app.world_mut().trigger(TravelerExited {
            entity: traveler,
            portal,
        });
        assert_eq!(keeps_contact(&mut app, traveler, wall), Some(true));
    }

    #[test]
    fn excluded_layers_come_back_on_exit() {
        let mut app = entry_app(PortalConfig {
            excluded_layers: LayerMask::from(GameLayer::PortalSurface),
            ..default()
        });

        let portal = app.world_mut().spawn(Transform::default()).id();
        let traveler = app
            .world_mut()
            .spawn((
                Traveler::default(),
                Transform::from_xyz(0.0, 0.0, 1.0),
                traveler_collision_layers(),
            ))
            .id();
        let surface = LayerMask::from(GameLayer::PortalSurface);
        let filters = |app: &App| {
            app.world()
                .get::<CollisionLayers>(traveler)
                .map(|layers| layers.filters)
        };

        app.world_mut().trigger(TravelerEntered {
            entity: traveler,
            portal,
        });
        assert_eq!(filters(&app).map(|mask| mask.0 & surface.0), Some(0));

        app.world_mut().trigger(TravelerExited {
            entity: traveler,
            portal,
        });
        assert_eq!(filters(&app).map(|mask| mask.0 & surface.0), Some(surface.0));
        let planes = app.world().get::<Traveler>(traveler).map(|traveler| traveler.slices);
        assert_eq!(planes, Some(SlicePlanes::NONE));
    }
}
