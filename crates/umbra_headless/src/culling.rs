//! CPU Culling Provider
//!
//! A minimal [`CullingResults`] implementation for tests and tools: lights
//! and caster bounds are supplied by hand, and cascade matrices are solved
//! from a perspective camera.
//!
//! # Cascade solving
//!
//! For each cascade the camera frustum slice between two split distances is
//! wrapped in a bounding sphere. The light looks at the sphere center from
//! `2r` away along its forward axis through an orthographic box of
//! `[-r, r]` with depth `[0, 4r]`. The projection is snapped to whole atlas
//! texels so cascades don't shimmer as the camera moves.

use glam::{Mat4, Vec3, Vec4};
use umbra_render::culling::{
    CascadeMatrices, CascadeRequest, CasterBounds, CullingResults, ShadowSplitData, VisibleLight,
};
use umbra_render::shadow::ShadowSettings;

/// Perspective camera used to slice cascades
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// View direction (normalized on use)
    pub forward: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Width / height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.3,
            far: 1000.0,
        }
    }
}

impl Camera {
    /// World-to-view matrix (right-handed, looking down -Z)
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward.normalize_or_zero(), self.up)
    }

    /// World-space corners of the frustum slice between two view distances
    pub fn slice_corners(&self, near: f32, far: f32) -> [Vec3; 8] {
        let camera_to_world = self.view().inverse();
        let tan_half = (self.fov_y * 0.5).tan();
        let mut corners = [Vec3::ZERO; 8];

        for (i, depth) in [near, far].into_iter().enumerate() {
            let half_h = depth * tan_half;
            let half_w = half_h * self.aspect;
            let local = [
                Vec3::new(-half_w, -half_h, -depth),
                Vec3::new(half_w, -half_h, -depth),
                Vec3::new(-half_w, half_h, -depth),
                Vec3::new(half_w, half_h, -depth),
            ];
            for (j, corner) in local.into_iter().enumerate() {
                corners[i * 4 + j] = camera_to_world.transform_point3(corner);
            }
        }

        corners
    }
}

/// Hand-built culling results for one view
#[derive(Clone, Debug, Default)]
pub struct SceneCulling {
    camera: Camera,
    shadow_distance: f32,
    lights: Vec<VisibleLight>,
    caster_bounds: Vec<Option<CasterBounds>>,
}

impl SceneCulling {
    pub fn new(camera: Camera, shadow_distance: f32) -> Self {
        Self {
            camera,
            shadow_distance,
            lights: Vec::new(),
            caster_bounds: Vec::new(),
        }
    }

    /// Shadow distance limited by the camera's far plane
    pub fn with_settings(camera: Camera, settings: &ShadowSettings) -> Self {
        Self::new(camera, settings.culling_distance(camera.far))
    }

    /// Add a visible light, returning its visible index
    pub fn add_light(&mut self, light: VisibleLight, casters: Option<CasterBounds>) -> usize {
        self.lights.push(light);
        self.caster_bounds.push(casters);
        self.lights.len() - 1
    }

    /// Builder form of [`SceneCulling::add_light`]
    pub fn with_light(mut self, light: VisibleLight, casters: Option<CasterBounds>) -> Self {
        self.add_light(light, casters);
        self
    }

    pub fn set_caster_bounds(&mut self, visible_light_index: usize, casters: Option<CasterBounds>) {
        if let Some(slot) = self.caster_bounds.get_mut(visible_light_index) {
            *slot = casters;
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn shadow_distance(&self) -> f32 {
        self.shadow_distance
    }

    /// View distances bounding a cascade
    pub fn cascade_range(&self, cascade_index: u32, cascade_count: u32, ratios: Vec3) -> (f32, f32) {
        let count = cascade_count.max(1);
        let index = cascade_index.min(count - 1);
        let split = |i: u32| -> f32 {
            if i == 0 {
                self.camera.near
            } else if i >= count {
                self.shadow_distance
            } else {
                ratios[(i - 1) as usize] * self.shadow_distance
            }
        };

        let near = split(index);
        (near, split(index + 1).max(near))
    }
}

/// Bounding sphere `(center, radius)` of a point set
fn bounding_sphere(points: &[Vec3]) -> (Vec3, f32) {
    let center = points.iter().copied().sum::<Vec3>() / points.len().max(1) as f32;
    let radius = points
        .iter()
        .map(|p| p.distance(center))
        .fold(0.0f32, f32::max);
    (center, radius)
}

/// Up vector that is never parallel to the light direction
fn find_up_vector(light_direction: Vec3) -> Vec3 {
    if light_direction.y.abs() > 0.9 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// Shift clip space so the world origin lands on a texel center line
fn snap_to_texel(view_projection: Mat4, resolution: u32) -> Vec3 {
    let origin = view_projection * Vec4::W;
    let texel_size = 2.0 / resolution.max(1) as f32;

    let snapped_x = (origin.x / texel_size).round() * texel_size;
    let snapped_y = (origin.y / texel_size).round() * texel_size;

    Vec3::new(snapped_x - origin.x, snapped_y - origin.y, 0.0)
}

impl CullingResults for SceneCulling {
    fn visible_lights(&self) -> &[VisibleLight] {
        &self.lights
    }

    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<CasterBounds> {
        self.caster_bounds.get(visible_light_index).copied().flatten()
    }

    fn compute_directional_shadow_matrices(&self, request: &CascadeRequest) -> CascadeMatrices {
        let (near, far) = self.cascade_range(request.cascade_index, request.cascade_count, request.ratios);
        let corners = self.camera.slice_corners(near, far);
        let (center, radius) = bounding_sphere(&corners);

        let forward = self
            .lights
            .get(request.visible_light_index)
            .map(|light| light.forward().normalize_or_zero())
            .filter(|forward| *forward != Vec3::ZERO)
            .unwrap_or(Vec3::NEG_Y);

        let eye = center - forward * radius * 2.0;
        let view = Mat4::look_at_rh(eye, center, find_up_vector(forward));
        let projection = Mat4::orthographic_rh(
            -radius,
            radius,
            -radius,
            radius,
            -request.near_plane_offset,
            radius * 4.0,
        );

        let offset = snap_to_texel(projection * view, request.tile_resolution);
        let projection = Mat4::from_translation(offset) * projection;

        CascadeMatrices {
            view,
            projection,
            split_data: ShadowSplitData {
                culling_sphere: center.extend(radius),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(cascade_index: u32, cascade_count: u32) -> CascadeRequest {
        CascadeRequest {
            visible_light_index: 0,
            cascade_index,
            cascade_count,
            ratios: Vec3::new(0.1, 0.25, 0.5),
            tile_resolution: 512,
            near_plane_offset: 0.0,
        }
    }

    fn scene() -> SceneCulling {
        SceneCulling::new(Camera::default(), 100.0).with_light(
            VisibleLight::directional(Vec3::ONE, Vec3::new(0.3, -1.0, 0.2)),
            Some(CasterBounds::from_center_extents(Vec3::ZERO, Vec3::splat(10.0))),
        )
    }

    #[test]
    fn test_cascade_ranges() {
        let scene = scene();
        let ratios = Vec3::new(0.1, 0.25, 0.5);

        assert_eq!(scene.cascade_range(0, 4, ratios), (0.3, 10.0));
        assert_eq!(scene.cascade_range(1, 4, ratios), (10.0, 25.0));
        assert_eq!(scene.cascade_range(3, 4, ratios), (50.0, 100.0));
        assert_eq!(scene.cascade_range(0, 1, ratios), (0.3, 100.0));
        assert_eq!(scene.cascade_range(1, 2, ratios), (10.0, 100.0));
    }

    #[test]
    fn test_shadow_distance_clamped_to_far_plane() {
        let camera = Camera {
            far: 40.0,
            ..Default::default()
        };
        let scene = SceneCulling::with_settings(camera, &ShadowSettings::default());
        assert_eq!(scene.shadow_distance(), 40.0);
    }

    #[test]
    fn test_slice_corners_along_view() {
        let camera = Camera::default();
        let corners = camera.slice_corners(1.0, 2.0);

        for corner in &corners[..4] {
            assert!((corner.z + 1.0).abs() < 1e-5);
        }
        for corner in &corners[4..] {
            assert!((corner.z + 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_cascade_spheres_grow() {
        let scene = scene();
        let radii: Vec<f32> = (0..4)
            .map(|i| {
                scene
                    .compute_directional_shadow_matrices(&request(i, 4))
                    .split_data
                    .culling_sphere
                    .w
            })
            .collect();

        for pair in radii.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_cascade_sphere_fits_light_volume() {
        let scene = scene();
        let cascade = scene.compute_directional_shadow_matrices(&request(1, 4));
        let sphere = cascade.split_data.culling_sphere;
        let view_projection = cascade.projection * cascade.view;

        // The sphere center projects near the middle of the tile, inside the depth range
        let clip = view_projection * sphere.truncate().extend(1.0);
        let texel = 2.0 / 512.0;
        assert!(clip.x.abs() <= texel && clip.y.abs() <= texel);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn test_texel_snapping() {
        let scene = scene();
        let cascade = scene.compute_directional_shadow_matrices(&request(0, 4));
        let origin = cascade.projection * cascade.view * Vec4::W;

        let texel = 2.0 / 512.0;
        let x = origin.x / texel;
        let y = origin.y / texel;
        assert!((x - x.round()).abs() < 1e-2);
        assert!((y - y.round()).abs() < 1e-2);
    }

    #[test]
    fn test_caster_bounds_lookup() {
        let mut scene = scene();
        assert!(scene.shadow_caster_bounds(0).is_some());
        assert!(scene.shadow_caster_bounds(7).is_none());

        scene.set_caster_bounds(0, None);
        assert!(scene.shadow_caster_bounds(0).is_none());
    }
}
