//! View composition: each linked portal places its camera where the observer would stand
//! relative to it if the linked portal were this one, renders the world into a texture
//! sized to the window, and hands that texture to the linked portal's screen.
//!
//! Screens live on their own render layer that portal cameras never see, so a portal
//! cannot render itself or its partner.
use bevy::asset::RenderAssetUsages;
use bevy::camera::RenderTarget;
use bevy::prelude::*;
use bevy::render::render_resource::Extent3d;
use bevy::render::render_resource::TextureDimension;
use bevy::render::render_resource::TextureFormat;
use bevy::render::render_resource::TextureUsages;
use bevy::window::PrimaryWindow;

use super::components::Portal;
use super::components::PortalCamera;
use super::components::PortalScreen;
use super::config::PortalConfig;
use super::material::PortalScreenMaterial;
use super::projection::PortalProjection;
use super::registry::PortalRegistry;
use crate::camera::CameraConfig;
use crate::camera::ObserverCamera;
use crate::math::view_space_clip_plane;
use crate::traits::TransformExt;
use crate::traits::ViewportExt;

/// The render target a portal camera draws into, recreated only when the window size
/// changes
#[derive(Component, Debug, Default, Clone)]
pub struct ViewTexture {
    handle:    Option<Handle<Image>>,
    size:      UVec2,
    recreated: u32,
}

impl ViewTexture {
    pub const fn handle(&self) -> Option<&Handle<Image>> { self.handle.as_ref() }

    pub const fn size(&self) -> UVec2 { self.size }

    /// How many times a texture has been allocated for this portal
    pub const fn recreated(&self) -> u32 { self.recreated }

    /// Matches the texture to `size`, releasing the previous one first. Returns the new
    /// handle only when a texture was allocated. Zero-sized windows never allocate.
    pub fn fit(&mut self, size: UVec2, images: &mut Assets<Image>) -> Option<Handle<Image>> {
        if size.x == 0 || size.y == 0 || (self.handle.is_some() && self.size() == size) {
            return None;
        }

        self.release(images);
        let handle = images.add(view_image(size));
        self.handle = Some(handle.clone());
        self.size = size;
        self.recreated += 1;
        debug!(
            "portal view texture allocated at {}x{} ({} so far)",
            size.x,
            size.y,
            self.recreated()
        );
        Some(handle)
    }

    pub fn release(&mut self, images: &mut Assets<Image>) {
        if let Some(handle) = self.handle.take() {
            images.remove(&handle);
        }
        self.size = UVec2::ZERO;
    }
}

fn view_image(size: UVec2) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width:                 size.x,
            height:                size.y,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Bgra8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.texture_descriptor.usage =
        TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST | TextureUsages::RENDER_ATTACHMENT;
    image
}

/// Pose of the virtual camera for `portal`: `portal · linked⁻¹ · observer`
pub fn compose_view(portal: &Transform, linked: &Transform, observer: &Transform) -> Transform {
    observer.through_portal(linked, portal)
}

fn aim_projection(
    projection: &mut Projection,
    perspective: PerspectiveProjection,
    far: f32,
    plane: Option<Vec4>,
) {
    if let Projection::Custom(custom) = projection
        && let Some(portal_projection) = custom.get_mut::<PortalProjection>()
    {
        portal_projection.perspective = perspective;
        portal_projection.far = far;
        portal_projection.near_clip_plane = plane;
    } else {
        *projection =
            Projection::custom(PortalProjection::new(perspective, far).with_near_clip_plane(plane));
    }
}

pub fn compose_portal_views(
    registry: Res<PortalRegistry>,
    observer: Single<&GlobalTransform, With<ObserverCamera>>,
    window: Single<&Window, With<PrimaryWindow>>,
    camera_config: Res<CameraConfig>,
    portal_config: Res<PortalConfig>,
    mut portals: Query<(&Portal, &Transform, &mut ViewTexture)>,
    partners: Query<(&Portal, &Transform)>,
    screens: Query<&MeshMaterial3d<PortalScreenMaterial>, With<PortalScreen>>,
    mut cameras: Query<
        (
            &mut Camera,
            &mut Transform,
            &mut GlobalTransform,
            &mut Projection,
            &mut RenderTarget,
        ),
        (With<PortalCamera>, Without<Portal>, Without<ObserverCamera>),
    >,
    mut screen_materials: ResMut<Assets<PortalScreenMaterial>>,
    mut images: ResMut<Assets<Image>>,
) {
    if registry.is_empty() {
        return;
    }
    let observer = observer.compute_transform();
    let size = window.physical_size();

    for entity in registry.iter() {
        let Ok((portal, transform, mut texture)) = portals.get_mut(entity) else {
            warn!("registered portal {entity} no longer exists");
            continue;
        };
        // unlinked portals are inert
        let Some(linked) = portal.linked else {
            continue;
        };
        let Ok((linked_portal, linked_transform)) = partners.get(linked) else {
            warn!("portal {entity} is linked to missing portal {linked}");
            continue;
        };
        let Ok((mut camera, mut camera_transform, mut camera_global, mut projection, mut target)) =
            cameras.get_mut(portal.camera)
        else {
            continue;
        };

        let view = compose_view(transform, linked_transform, &observer);
        *camera_transform = view;
        *camera_global = GlobalTransform::from(view);

        let plane = view_space_clip_plane(
            &view.compute_affine().inverse(),
            view.translation,
            transform.translation,
            transform.forward().as_vec3(),
        );
        let mut perspective = camera_config.perspective();
        perspective.far = portal_config.far;
        perspective.aspect_ratio = size.aspect_ratio();
        aim_projection(&mut projection, perspective, portal_config.far, plane);

        if let Some(handle) = texture.fit(size, &mut images) {
            *target = RenderTarget::Image(handle.into());
        }
        let Some(handle) = texture.handle() else {
            continue;
        };
        if !camera.is_active {
            camera.is_active = true;
        }

        // the linked portal displays what this camera sees
        let Ok(screen_material) = screens.get(linked_portal.screen) else {
            continue;
        };
        if screen_materials
            .get(&screen_material.0)
            .is_some_and(|material| !material.shows(handle))
            && let Some(material) = screen_materials.get_mut(&screen_material.0)
        {
            material.show(handle.clone());
        }
    }
}
