//! Culling provider interface
//!
//! The lighting and shadow stages never cull anything themselves. Visible
//! lights, shadow caster bounds and per-cascade light matrices come from an
//! external provider implementing [`CullingResults`].

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Light type together with the data that only makes sense for that type
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    Point { range: f32 },
    Spot { range: f32, outer_angle: f32 },
}

/// How a light casts shadows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShadowMode {
    #[default]
    None,
    Hard,
    Soft,
}

impl ShadowMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A light that survived view culling this frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisibleLight {
    pub kind: LightKind,
    /// Linear RGB color premultiplied by intensity
    pub final_color: Vec3,
    /// Light transform; the Z axis is the light's forward (light-to-scene) direction
    pub local_to_world: Mat4,
    pub shadow_mode: ShadowMode,
    /// Shadow darkness (0 = no shadow, 1 = full shadow)
    pub shadow_strength: f32,
}

impl VisibleLight {
    /// Create a light of any kind from its transform
    pub fn new(kind: LightKind, final_color: Vec3, local_to_world: Mat4) -> Self {
        Self {
            kind,
            final_color,
            local_to_world,
            shadow_mode: ShadowMode::None,
            shadow_strength: 0.0,
        }
    }

    /// Create a directional light shining along `forward`
    pub fn directional(final_color: Vec3, forward: Vec3) -> Self {
        let forward = forward.normalize_or_zero();
        let (right, up) = forward.any_orthonormal_pair();
        let local_to_world = Mat4::from_cols(
            right.extend(0.0),
            up.extend(0.0),
            forward.extend(0.0),
            Vec4::W,
        );
        Self::new(LightKind::Directional, final_color, local_to_world)
    }

    /// Enable shadows with the given mode and strength
    pub fn with_shadows(mut self, mode: ShadowMode, strength: f32) -> Self {
        self.shadow_mode = mode;
        self.shadow_strength = strength;
        self
    }

    pub fn is_directional(&self) -> bool {
        matches!(self.kind, LightKind::Directional)
    }

    /// Direction the light travels (light-to-scene)
    pub fn forward(&self) -> Vec3 {
        self.local_to_world.z_axis.truncate()
    }

    /// Direction from a shaded point toward the light
    pub fn direction_to_light(&self) -> Vec3 {
        -self.forward()
    }
}

/// World-space bounds of everything that casts a shadow for one light
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CasterBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl CasterBounds {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Inverted or non-finite bounds contain no casters
    pub fn is_degenerate(&self) -> bool {
        !(self.min.is_finite() && self.max.is_finite())
            || self.min.x > self.max.x
            || self.min.y > self.max.y
            || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

/// Culling data for one cascade split
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowSplitData {
    /// World-space sphere `(center.xyz, radius)` enclosing the cascade
    pub culling_sphere: Vec4,
}

/// Parameters of a single cascade matrix query
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CascadeRequest {
    pub visible_light_index: usize,
    pub cascade_index: u32,
    pub cascade_count: u32,
    /// Cumulative split ratios of the first three cascades
    pub ratios: Vec3,
    /// Resolution in texels of the atlas tile the cascade renders into
    pub tile_resolution: u32,
    pub near_plane_offset: f32,
}

/// Light view and projection for one cascade
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CascadeMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub split_data: ShadowSplitData,
}

/// Per-view culling output consumed by lighting and shadows
pub trait CullingResults {
    /// Lights visible to the current view, in culling order
    fn visible_lights(&self) -> &[VisibleLight];

    /// Bounds of the shadow casters affecting a visible light
    ///
    /// `None` when nothing in view casts a shadow for this light.
    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<CasterBounds>;

    /// Light view/projection and culling sphere for one cascade of a directional light
    fn compute_directional_shadow_matrices(&self, request: &CascadeRequest) -> CascadeMatrices;
}
