use bevy::prelude::*;
use bevy_enhanced_input::prelude::*;

pub struct GameInputPlugin;

impl Plugin for GameInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EnhancedInputPlugin)
            .add_input_context::<PlayerControls>()
            .add_input_context::<GlobalControls>()
            .init_resource::<InspectorToggles>()
            .add_systems(Startup, spawn_global_controls)
            .add_observer(toggle_portal_inspector)
            .add_observer(toggle_camera_inspector);
    }
}

/// Input context attached to the observer camera
#[derive(Component, Default)]
pub struct PlayerControls;

/// Input context for debug actions that are not tied to the player
#[derive(Component, Default)]
pub struct GlobalControls;

#[derive(InputAction)]
#[action_output(bool)]
pub struct FirePrimary;

#[derive(InputAction)]
#[action_output(bool)]
pub struct FireSecondary;

#[derive(InputAction)]
#[action_output(bool)]
pub struct DespawnAllPortals;

#[derive(InputAction)]
#[action_output(bool)]
pub struct Interact;

#[derive(InputAction)]
#[action_output(Vec2)]
pub struct Move;

#[derive(InputAction)]
#[action_output(Vec2)]
pub struct Look;

#[derive(InputAction)]
#[action_output(bool)]
pub struct TogglePortalInspector;

#[derive(InputAction)]
#[action_output(bool)]
pub struct ToggleCameraInspector;

#[derive(InputAction)]
#[action_output(bool)]
pub struct TogglePhysicsDebug;

#[derive(InputAction)]
#[action_output(bool)]
pub struct TogglePortalGizmos;

/// Bundle of the player's actions, inserted on the observer camera when it spawns
pub fn player_actions() -> impl Bundle {
    (
        PlayerControls,
        actions!(PlayerControls[
            (Action::<FirePrimary>::new(), bindings![MouseButton::Left]),
            (Action::<FireSecondary>::new(), bindings![MouseButton::Right]),
            (Action::<DespawnAllPortals>::new(), bindings![KeyCode::KeyR]),
            (Action::<Interact>::new(), bindings![KeyCode::KeyE]),
            (
                Action::<Move>::new(),
                DeadZone::default(),
                Bindings::spawn(Cardinal::wasd_keys()),
            ),
            (Action::<Look>::new(), bindings![Binding::mouse_motion()]),
        ]),
    )
}

fn spawn_global_controls(mut commands: Commands) {
    commands.spawn((
        Name::new("GlobalControls"),
        GlobalControls,
        actions!(GlobalControls[
            (Action::<TogglePortalInspector>::new(), bindings![KeyCode::F1]),
            (Action::<ToggleCameraInspector>::new(), bindings![KeyCode::F2]),
            (Action::<TogglePhysicsDebug>::new(), bindings![KeyCode::F3]),
            (Action::<TogglePortalGizmos>::new(), bindings![KeyCode::F4]),
        ]),
    ));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inspector {
    Portal,
    Camera,
}

#[derive(Resource, Default, Debug)]
pub struct InspectorToggles {
    portal: bool,
    camera: bool,
}

impl InspectorToggles {
    pub const fn is_active(&self, inspector: Inspector) -> bool {
        match inspector {
            Inspector::Portal => self.portal,
            Inspector::Camera => self.camera,
        }
    }
}

/// Run condition for inspector windows, off until toggled
pub fn inspector_active(inspector: Inspector) -> impl Fn(Res<InspectorToggles>) -> bool + Clone {
    move |toggles: Res<InspectorToggles>| toggles.is_active(inspector)
}

fn toggle_portal_inspector(
    _toggle: On<Start<TogglePortalInspector>>,
    mut toggles: ResMut<InspectorToggles>,
) {
    toggles.portal = !toggles.portal;
}

fn toggle_camera_inspector(
    _toggle: On<Start<ToggleCameraInspector>>,
    mut toggles: ResMut<InspectorToggles>,
) {
    toggles.camera = !toggles.camera;
}
