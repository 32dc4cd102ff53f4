use bevy::pbr::ExtendedMaterial;
use bevy::pbr::MaterialExtension;
use bevy::prelude::*;
use bevy::render::render_resource::AsBindGroup;
use bevy::render::render_resource::ShaderType;
use bevy::shader::ShaderRef;

const SCREEN_SHADER: &str = "shaders/portal_screen.wgsl";
const SLICE_SHADER: &str = "shaders/slice.wgsl";

pub struct PortalMaterialPlugin;

impl Plugin for PortalMaterialPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MaterialPlugin::<PortalScreenMaterial>::default())
            .add_plugins(MaterialPlugin::<SliceMaterial>::default());
    }
}

#[derive(ShaderType, Reflect, Debug, Clone, Copy, Default)]
pub struct ScreenParams {
    /// Shown while the portal has no view to display
    pub color:       LinearRgba,
    /// 0 shows `color`, 1 shows the view texture
    pub view_weight: f32,
}

/// Samples the linked portal's view in screen space, so the texture lines up with the
/// observer's frame no matter the shape of the surface
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct PortalScreenMaterial {
    #[uniform(0)]
    pub params: ScreenParams,
    #[texture(1)]
    #[sampler(2)]
    pub view:   Option<Handle<Image>>,
}

impl PortalScreenMaterial {
    pub fn unlinked(color: Color) -> Self {
        Self {
            params: ScreenParams {
                color:       color.into(),
                view_weight: 0.0,
            },
            view:   None,
        }
    }

    pub fn show(&mut self, view: Handle<Image>) {
        self.view = Some(view);
        self.params.view_weight = 1.0;
    }

    pub fn hide(&mut self) {
        self.view = None;
        self.params.view_weight = 0.0;
    }

    pub fn shows(&self, view: &Handle<Image>) -> bool { self.view.as_ref() == Some(view) }
}

impl Material for PortalScreenMaterial {
    fn fragment_shader() -> ShaderRef { SCREEN_SHADER.into() }
}

/// World-space plane a traveler or clone is cut along. Fragments on the side the normal
/// points to are discarded, a zero normal keeps everything.
#[derive(ShaderType, Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct SlicePlane {
    pub centre: Vec3,
    pub normal: Vec3,
}

impl SlicePlane {
    pub const NONE: Self = Self {
        centre: Vec3::ZERO,
        normal: Vec3::ZERO,
    };

    pub const fn new(centre: Vec3, normal: Vec3) -> Self { Self { centre, normal } }

    /// Mirrors the shader test
    pub fn keeps(&self, point: Vec3) -> bool { self.normal.dot(point - self.centre) <= 0.0 }
}

#[derive(Asset, AsBindGroup, Reflect, Debug, Clone, Default)]
pub struct SliceExtension {
    #[uniform(100)]
    pub slice: SlicePlane,
}

impl MaterialExtension for SliceExtension {
    fn fragment_shader() -> ShaderRef { SLICE_SHADER.into() }

    fn deferred_fragment_shader() -> ShaderRef { SLICE_SHADER.into() }
}

/// Standard material that can be cut by a portal plane, used by travelers and their clones
pub type SliceMaterial = ExtendedMaterial<StandardMaterial, SliceExtension>;

pub fn slice_material(base: StandardMaterial) -> SliceMaterial {
    ExtendedMaterial {
        base,
        extension: SliceExtension::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_slice_keeps_everything() {
        assert!(SlicePlane::NONE.keeps(Vec3::new(3.0, -2.0, 7.0)));
        assert!(SlicePlane::NONE.keeps(Vec3::ZERO));
    }

    #[test]
    fn slice_discards_the_side_the_normal_points_to() {
        let plane = SlicePlane::new(Vec3::new(0.0, 0.0, 2.0), Vec3::Z);
        assert!(plane.keeps(Vec3::new(0.0, 0.0, 1.5)));
        assert!(!plane.keeps(Vec3::new(0.0, 0.0, 2.5)));
    }

    #[test]
    fn screen_switches_between_color_and_view() {
        let mut material = PortalScreenMaterial::unlinked(Color::WHITE);
        let view = Handle::<Image>::default();

        material.show(view.clone());
        assert!(material.shows(&view));
        assert!((material.params.view_weight - 1.0).abs() < f32::EPSILON);

        material.hide();
        assert!(!material.shows(&view));
        assert!(material.params.view_weight.abs() < f32::EPSILON);
    }
}
