//! Cascade Culling and Fade Data
//!
//! The shading stage picks a cascade by testing the shaded point against
//! each cascade's culling sphere, and blends across cascade borders and the
//! shadow distance using the values computed here.

use glam::Vec4;

use super::config::ShadowSettings;

/// Maximum supported cascade count
pub const MAX_CASCADES: usize = 4;

/// Shading data derived from one cascade's culling sphere
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CascadeEntry {
    /// `(center.xyz, radius²)`
    pub culling_sphere: Vec4,
    /// `(1 / radius², texel_size * √2, 0, 0)`
    pub data: Vec4,
}

impl CascadeEntry {
    /// Build from a `(center.xyz, radius)` sphere rendered into a `tile_size` tile
    pub fn new(culling_sphere: Vec4, tile_size: u32) -> Self {
        let radius = culling_sphere.w;
        let texel_size = 2.0 * radius / tile_size as f32;
        let radius_sq = radius * radius;

        Self {
            culling_sphere: culling_sphere.truncate().extend(radius_sq),
            data: Vec4::new(1.0 / radius_sq, texel_size * std::f32::consts::SQRT_2, 0.0, 0.0),
        }
    }
}

/// Shadow fade parameters `(1 / max_distance, 1 / distance_fade, 1 / (1 - f²), 0)`
///
/// `f = 1 - cascade_fade`. The third component lets the shader compute the
/// cascade blend from squared distances without branching.
pub fn distance_fade(settings: &ShadowSettings) -> Vec4 {
    let f = 1.0 - settings.directional.cascade_fade;
    Vec4::new(
        1.0 / settings.max_distance,
        1.0 / settings.distance_fade,
        1.0 / (1.0 - f * f),
        0.0,
    )
}
