//! Linked portal pairs: view composition, the crossing protocol, screen protection and
//! the portal gun.
mod components;
mod config;
mod crossing;
mod gizmo;
mod lifecycle;
mod material;
mod projection;
mod registry;
mod screen;
mod spawner;
mod view;

use bevy::camera::CameraUpdateSystems;
use bevy::camera::visibility::VisibilitySystems;
use bevy::prelude::*;
use bevy::transform::TransformSystems;
pub use components::Portal;
pub use components::PortalCamera;
pub use components::PortalScreen;
pub use components::PortalSlot;
pub use components::ResidentTravelers;
pub use config::PortalConfig;
use config::PortalConfigPlugin;
pub use config::ScreenShape;
pub use crossing::TravelerEntered;
pub use crossing::TravelerExited;
use gizmo::PortalGizmoPlugin;
pub use lifecycle::PortalLifecycle;
use material::PortalMaterialPlugin;
pub use material::PortalScreenMaterial;
pub use material::SliceMaterial;
pub use material::SlicePlane;
pub use material::slice_material;
pub use registry::PortalRegistry;
pub use spawner::DespawnPortals;
pub use spawner::FirePortal;
pub use spawner::PlacePortal;
pub use spawner::PortalGun;
pub use view::ViewTexture;

use crate::schedule::InGameSet;

/// Ordering of the portal systems within `PostUpdate`
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PortalSystems {
    /// Teleports and clone placement, before transforms propagate
    Crossing,
    /// Portal camera placement and projection, after propagation and before cameras and
    /// frusta are updated
    ViewComposition,
}

pub struct PortalPlugin;

impl Plugin for PortalPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(PortalConfigPlugin)
            .add_plugins(PortalMaterialPlugin)
            .add_plugins(PortalGizmoPlugin)
            .init_resource::<PortalRegistry>()
            .register_type::<Portal>()
            .register_type::<PortalScreen>()
            .register_type::<PortalCamera>()
            .register_type::<ResidentTravelers>()
            .register_type::<PortalGun>()
            .register_type::<PortalRegistry>()
            .configure_sets(
                PostUpdate,
                (
                    PortalSystems::Crossing.before(TransformSystems::Propagate),
                    PortalSystems::ViewComposition
                        .after(TransformSystems::Propagate)
                        .before(CameraUpdateSystems)
                        .before(VisibilitySystems::UpdateFrusta),
                ),
            )
            .add_systems(Startup, spawner::init_portal_assets)
            .add_systems(
                Update,
                crossing::track_residents.in_set(InGameSet::CollisionDetection),
            )
            .add_systems(
                Update,
                (spawner::link_portal_pairs, screen::reset_distant_screens)
                    .in_set(InGameSet::EntityUpdates),
            )
            .add_systems(
                PostUpdate,
                crossing::cross_portals.in_set(PortalSystems::Crossing),
            )
            .add_systems(
                PostUpdate,
                view::compose_portal_views.in_set(PortalSystems::ViewComposition),
            )
            .add_observer(screen::protect_screen_on_entry)
            .add_observer(spawner::fire_primary)
            .add_observer(spawner::fire_secondary)
            .add_observer(spawner::despawn_all_portals)
            .add_observer(spawner::fire_portal)
            .add_observer(spawner::place_portal)
            .add_observer(spawner::despawn_portals);
    }
}
