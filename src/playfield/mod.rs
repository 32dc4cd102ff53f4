mod constants;
mod crates;
mod room;

use bevy::prelude::*;

use crate::playfield::crates::CratePlugin;
use crate::playfield::room::RoomPlugin;

pub struct PlayfieldPlugin;

impl Plugin for PlayfieldPlugin {
    fn build(&self, app: &mut App) { app.add_plugins(RoomPlugin).add_plugins(CratePlugin); }
}
