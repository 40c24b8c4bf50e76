//! GPU Shadow Data Structures
//!
//! Fixed-size, bytemuck Pod blocks published to the shading stage. Array
//! sizes never change; only the populated prefix varies between frames.

use glam::{Mat4, Vec4};
use serde::{Deserialize, Serialize};

use super::cascade::{CascadeEntry, MAX_CASCADES};

/// Maximum directional lights that can own atlas space in one frame
pub const MAX_SHADOWED_DIRECTIONAL_LIGHTS: usize = 4;

/// Atlas tiles (and cascade slots) available per frame
pub const MAX_CASCADE_SLOTS: usize = MAX_SHADOWED_DIRECTIONAL_LIGHTS * MAX_CASCADES;

/// Directional shadow data for the shading stage (uniform buffer)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuDirectionalShadows {
    /// World-to-atlas transforms, indexed by tile
    pub matrices: [[[f32; 4]; 4]; MAX_CASCADE_SLOTS],

    /// `(center.xyz, radius²)` per cascade
    pub culling_spheres: [[f32; 4]; MAX_CASCADE_SLOTS],

    /// `(1 / radius², texel_size * √2, 0, 0)` per cascade
    pub cascade_data: [[f32; 4]; MAX_CASCADE_SLOTS],

    /// `(1 / max_distance, 1 / distance_fade, 1 / (1 - f²), 0)`
    pub distance_fade: [f32; 4],

    /// Cascades per shadowed light
    pub cascade_count: u32,

    /// Padding to align to 16 bytes
    pub _pad: [u32; 3],
}

impl Default for GpuDirectionalShadows {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl GpuDirectionalShadows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every entry in place
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set_matrix(&mut self, tile_index: usize, matrix: Mat4) {
        self.matrices[tile_index] = matrix.to_cols_array_2d();
    }

    pub fn matrix(&self, tile_index: usize) -> Mat4 {
        Mat4::from_cols_array_2d(&self.matrices[tile_index])
    }

    pub fn set_cascade(&mut self, cascade_index: usize, entry: &CascadeEntry) {
        self.culling_spheres[cascade_index] = entry.culling_sphere.to_array();
        self.cascade_data[cascade_index] = entry.data.to_array();
    }

    pub fn culling_sphere(&self, cascade_index: usize) -> Vec4 {
        Vec4::from_array(self.culling_spheres[cascade_index])
    }

    pub fn cascade_data(&self, cascade_index: usize) -> Vec4 {
        Vec4::from_array(self.cascade_data[cascade_index])
    }

    pub fn distance_fade(&self) -> Vec4 {
        Vec4::from_array(self.distance_fade)
    }

    /// Get uniform data as bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
