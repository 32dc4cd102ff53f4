mod teleport;
mod traveler;

use bevy::prelude::*;
pub use teleport::Teleported;
use teleport::TeleportPlugin;
pub use teleport::teleport;
pub use traveler::PortalSurfaceHooks;
pub use traveler::SlicePlanes;
pub use traveler::Traveler;
pub use traveler::TravelerClone;
pub use traveler::TravelerPlugin;
pub use traveler::traveler_collision_layers;

pub struct ActorPlugin;

impl Plugin for ActorPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(TeleportPlugin)
            .add_plugins(TravelerPlugin)
            .register_type::<Traveler>()
            .register_type::<TravelerClone>();
    }
}
