use bevy::prelude::*;

use super::config::PortalConfig;

/// The two places a portal gun can put a portal
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortalSlot {
    Primary,
    Secondary,
}

impl PortalSlot {
    pub fn color(self, config: &PortalConfig) -> Color {
        match self {
            Self::Primary => config.primary_color,
            Self::Secondary => config.secondary_color,
        }
    }
}

/// A planar portal. Its `Transform` is the world transform used by view composition and
/// crossing, its forward axis is the plane normal.
///
/// `linked` is a plain back reference and owns nothing. It is set and cleared on both
/// portals together through [`super::PortalLifecycle`].
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
#[require(ResidentTravelers, super::ViewTexture)]
pub struct Portal {
    pub slot:         PortalSlot,
    pub linked:       Option<Entity>,
    pub screen:       Entity,
    pub camera:       Entity,
    pub half_extents: Vec3,
    /// Collider the portal was fired onto. Residents pass through it.
    pub surface:      Option<Entity>,
}

impl Portal {
    pub const fn new(slot: PortalSlot, screen: Entity, camera: Entity, half_extents: Vec3) -> Self {
        Self {
            slot,
            linked: None,
            screen,
            camera,
            half_extents,
            surface: None,
        }
    }

    pub const fn on_surface(mut self, surface: Option<Entity>) -> Self {
        self.surface = surface;
        self
    }

    /// Observer distance beyond which the screen goes back to its resting shape
    pub fn reset_radius(&self) -> f32 { self.half_extents.length() }
}

/// The surface that shows the linked portal's view
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct PortalScreen {
    pub portal:  Entity,
    /// Resting transform, restored when the observer moves away
    pub initial: Transform,
}

/// Virtual camera rendering the view through a portal into its texture
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct PortalCamera {
    pub portal: Entity,
}

/// Bodies currently overlapping a portal's trigger volume, in arrival order
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct ResidentTravelers(Vec<Entity>);

impl ResidentTravelers {
    pub fn contains(&self, traveler: Entity) -> bool { self.0.contains(&traveler) }

    /// Returns false if the traveler was already resident
    pub fn insert(&mut self, traveler: Entity) -> bool {
        if self.contains(traveler) {
            return false;
        }
        self.0.push(traveler);
        true
    }

    /// Returns false if the traveler was not resident
    pub fn remove(&mut self, traveler: Entity) -> bool {
        let before = self.0.len();
        self.0.retain(|resident| *resident != traveler);
        self.0.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ { self.0.iter().copied() }

    pub const fn len(&self) -> usize { self.0.len() }

    pub const fn is_empty(&self) -> bool { self.0.is_empty() }
}
