use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::components::Portal;
use super::components::PortalCamera;
use super::components::PortalScreen;
use super::components::ResidentTravelers;
use super::crossing::TravelerEntered;
use super::crossing::TravelerExited;
use super::material::PortalScreenMaterial;
use super::registry::PortalRegistry;
use super::view::ViewTexture;
use crate::despawn::despawn;

/// Everything that has to change together when portals are linked, unlinked or destroyed
#[derive(SystemParam)]
pub struct PortalLifecycle<'w, 's> {
    registry:         ResMut<'w, PortalRegistry>,
    portals:          Query<'w, 's, &'static mut Portal>,
    residents:        Query<'w, 's, &'static ResidentTravelers>,
    textures:         Query<'w, 's, &'static mut ViewTexture>,
    cameras:          Query<'w, 's, &'static mut Camera, With<PortalCamera>>,
    screens:
        Query<'w, 's, &'static MeshMaterial3d<PortalScreenMaterial>, With<PortalScreen>>,
    screen_materials: ResMut<'w, Assets<PortalScreenMaterial>>,
    images:           ResMut<'w, Assets<Image>>,
}

impl PortalLifecycle<'_, '_> {
    pub fn register(&mut self, portal: Entity) {
        if self.registry.contains(portal) {
            return;
        }
        self.registry.register(portal);
        debug!("registered portal {portal}, {} active", self.registry.len());
    }

    pub fn add_screen_material(&mut self, color: Color) -> Handle<PortalScreenMaterial> {
        self.screen_materials.add(PortalScreenMaterial::unlinked(color))
    }

    /// Links `a` and `b` to each other. Returns false when they already are, or when either
    /// is missing.
    pub fn link(&mut self, a: Entity, b: Entity) -> bool {
        if a == b {
            return false;
        }
        let Ok([first, second]) = self.portals.get_many([a, b]) else {
            return false;
        };
        let (first_partner, second_partner) = (first.linked, second.linked);
        if first_partner == Some(b) && second_partner == Some(a) {
            return false;
        }
        // a previous partner must not keep pointing at a portal that moved on
        if first_partner.is_some_and(|partner| partner != b) {
            self.unlink(a);
        }
        if second_partner.is_some_and(|partner| partner != a) {
            self.unlink(b);
        }

        let Ok([mut first, mut second]) = self.portals.get_many_mut([a, b]) else {
            return false;
        };
        first.linked = Some(b);
        second.linked = Some(a);
        info!("linked {:?} portal {a} with {:?} portal {b}", first.slot, second.slot);
        true
    }

    /// Clears the link on both sides and returns the former partner. Both portals stop
    /// rendering and their screens fall back to their color.
    pub fn unlink(&mut self, portal: Entity) -> Option<Entity> {
        let linked = self.portals.get_mut(portal).ok()?.linked.take()?;
        if let Ok(mut partner) = self.portals.get_mut(linked)
            && partner.linked == Some(portal)
        {
            partner.linked = None;
        }

        self.go_dark(portal);
        self.go_dark(linked);
        debug!("unlinked portal {portal} from {linked}");
        Some(linked)
    }

    /// Announces every body already overlapping `portal`. Called when the portal becomes
    /// linked, since overlaps that began while it was inert were only recorded.
    pub fn admit_residents(&self, commands: &mut Commands, portal: Entity) {
        let Ok(residents) = self.residents.get(portal) else {
            return;
        };
        for traveler in residents.iter() {
            commands.trigger(TravelerEntered {
                entity: traveler,
                portal,
            });
        }
    }

    fn release_residents(&self, commands: &mut Commands, portal: Entity) {
        let Ok(residents) = self.residents.get(portal) else {
            return;
        };
        if residents.is_empty() {
            return;
        }
        debug!("portal {portal} releasing {} residents", residents.len());
        for traveler in residents.iter() {
            commands.trigger(TravelerExited {
                entity: traveler,
                portal,
            });
        }
    }

    fn go_dark(&mut self, portal: Entity) {
        let Ok(portal) = self.portals.get(portal) else {
            return;
        };
        if let Ok(mut camera) = self.cameras.get_mut(portal.camera) {
            camera.is_active = false;
        }
        if let Ok(material) = self.screens.get(portal.screen)
            && let Some(material) = self.screen_materials.get_mut(&material.0)
        {
            material.hide();
        }
    }

    /// Unlinks, unregisters, releases the view texture, lets go of resident travelers and
    /// despawns the portal with its screen and camera
    pub fn destroy(&mut self, commands: &mut Commands, portal: Entity) {
        // the partner goes inert, so its residents stop being carried until it relinks
        if let Some(partner) = self.unlink(portal) {
            self.release_residents(commands, partner);
        }
        self.registry.unregister(portal);

        if let Ok(mut texture) = self.textures.get_mut(portal) {
            texture.release(&mut self.images);
        }
        self.release_residents(commands, portal);
        if let Ok(component) = self.portals.get(portal) {
            despawn(commands, component.camera);
        }
        despawn(commands, portal);
        info!("destroyed portal {portal}, {} remaining", self.registry.len());
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;
    use crate::portal::PortalSlot;

    fn world() -> World {
        let mut world = World::new();
        world.init_resource::<PortalRegistry>();
        world.init_resource::<Assets<PortalScreenMaterial>>();
        world.init_resource::<Assets<Image>>();
        world
    }

    fn spawn_portal(world: &mut World, slot: PortalSlot) -> Entity {
        let screen = world.spawn_empty().id();
        let camera = world.spawn(PortalCamera { portal: Entity::PLACEHOLDER }).id();
        world
            .spawn(Portal::new(slot, screen, camera, Vec3::ONE))
            .id()
    }

    fn linked(world: &World, portal: Entity) -> Option<Entity> {
        world.get::<Portal>(portal).and_then(|portal| portal.linked)
    }

    #[test]
    fn linking_is_symmetric_and_idempotent() {
        let mut world = world();
        let a = spawn_portal(&mut world, PortalSlot::Primary);
        let b = spawn_portal(&mut world, PortalSlot::Secondary);

        let first = world.run_system_once(move |mut links: PortalLifecycle| links.link(a, b));
        let second = world.run_system_once(move |mut links: PortalLifecycle| links.link(b, a));

        assert_eq!(first.ok(), Some(true));
        assert_eq!(second.ok(), Some(false));
        assert_eq!(linked(&world, a), Some(b));
        assert_eq!(linked(&world, b), Some(a));
    }

    #[test]
    fn relinking_clears_the_old_partner() {
        let mut world = world();
        let a = spawn_portal(&mut world, PortalSlot::Primary);
        let b = spawn_portal(&mut world, PortalSlot::Secondary);
        let c = spawn_portal(&mut world, PortalSlot::Secondary);

        let _ = world.run_system_once(move |mut links: PortalLifecycle| links.link(a, b));
        let relinked = world.run_system_once(move |mut links: PortalLifecycle| links.link(a, c));

        assert_eq!(relinked.ok(), Some(true));
        assert_eq!(linked(&world, a), Some(c));
        assert_eq!(linked(&world, c), Some(a));
        assert_eq!(linked(&world, b), None);
    }

    #[test]
    fn linking_takes_a_portal_away_from_its_partner() {
        let mut world = world();
        let a = spawn_portal(&mut world, PortalSlot::Primary);
        let b = spawn_portal(&mut world, PortalSlot::Secondary);
        let c = spawn_portal(&mut world, PortalSlot::Primary);

        let _ = world.run_system_once(move |mut links: PortalLifecycle| links.link(a, b));
        let _ = world.run_system_once(move |mut links: PortalLifecycle| links.link(c, b));

        assert_eq!(linked(&world, a), None);
        assert_eq!(linked(&world, b), Some(c));
        assert_eq!(linked(&world, c), Some(b));
    }

    #[test]
    fn a_portal_cannot_link_to_itself() {
        let mut world = world();
        let a = spawn_portal(&mut world, PortalSlot::Primary);

        let result = world.run_system_once(move |mut links: PortalLifecycle| links.link(a, a));

        assert_eq!(result.ok(), Some(false));
        assert_eq!(linked(&world, a), None);
    }

    #[test]
    fn destroying_a_portal_clears_its_partner() {
        let mut world = world();
        let a = spawn_portal(&mut world, PortalSlot::Primary);
        let b = spawn_portal(&mut world, PortalSlot::Secondary);
        world.resource_mut::<PortalRegistry>().register(a);
        world.resource_mut::<PortalRegistry>().register(b);

        let _ = world.run_system_once(move |mut links: PortalLifecycle| links.link(a, b));
        let _ = world.run_system_once(move |mut commands: Commands, mut links: PortalLifecycle| {
            links.destroy(&mut commands, a);
        });

        assert!(world.get_entity(a).is_err());
        assert_eq!(linked(&world, b), None);
        let registry = world.resource::<PortalRegistry>();
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![b]);
    }
}
