use bevy::prelude::*;

/// Active portals in creation order. View composition walks this list once per frame.
/// It only observes portals, the spawner creates and destroys them.
#[derive(Resource, Reflect, Debug, Default, Clone)]
#[reflect(Resource)]
pub struct PortalRegistry {
    portals: Vec<Entity>,
}

impl PortalRegistry {
    pub fn register(&mut self, portal: Entity) {
        if !self.portals.contains(&portal) {
            self.portals.push(portal);
        }
    }

    pub fn unregister(&mut self, portal: Entity) { self.portals.retain(|p| *p != portal); }

    pub fn contains(&self, portal: Entity) -> bool { self.portals.contains(&portal) }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ { self.portals.iter().copied() }

    pub const fn len(&self) -> usize { self.portals.len() }

    pub const fn is_empty(&self) -> bool { self.portals.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_ordered_and_unique() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut registry = PortalRegistry::default();

        registry.register(a);
        registry.register(b);
        registry.register(a);

        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![a, b]);

        registry.unregister(a);
        assert!(!registry.contains(a));
        assert_eq!(registry.len(), 1);

        registry.unregister(b);
        assert!(registry.is_empty());
    }
}
