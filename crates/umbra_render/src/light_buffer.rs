//! Directional Light Buffer
//!
//! CPU-side storage for the directional lights of one view and the
//! GPU-ready block published to the shading stage.
//!
//! # Light Limits
//!
//! Directional lights: 4 (uniform buffer). Extra lights are dropped.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::shadow::ShadowReservation;

/// Maximum directional lights (uniform buffer, small count)
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// One collected directional light
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLightRecord {
    /// Linear RGB color premultiplied by intensity
    pub color: Vec3,
    /// Unit vector from the shaded point toward the light
    pub direction: Vec3,
    /// Atlas reservation, [`ShadowReservation::NONE`] when unshadowed
    pub shadow: ShadowReservation,
}

/// GPU-ready directional light block
///
/// Matches shader struct layout with proper alignment.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuDirectionalLights {
    /// Number of populated entries
    pub count: u32,
    /// Padding for alignment
    pub _pad: [u32; 3],
    /// Color (linear RGB, w unused)
    pub colors: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// Direction toward the light (xyz, w unused)
    pub directions: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// `(shadow strength, cascade slot base, 0, 0)`
    pub shadow_data: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
}

impl Default for GpuDirectionalLights {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl GpuDirectionalLights {
    /// Size in bytes (must be 16-byte aligned)
    pub const SIZE: usize = core::mem::size_of::<Self>();

    /// Get uniform data as bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Per-frame directional light list
#[derive(Clone, Debug, Default)]
pub struct DirectionalLightBuffer {
    lights: Vec<DirectionalLightRecord>,
    /// Lights dropped this frame because the buffer was full
    overflow_count: u32,
}

impl DirectionalLightBuffer {
    pub fn new() -> Self {
        Self {
            lights: Vec::with_capacity(MAX_DIRECTIONAL_LIGHTS),
            overflow_count: 0,
        }
    }

    /// Clear all lights for a new frame, keeping the allocation
    pub fn clear(&mut self) {
        self.lights.clear();
        self.overflow_count = 0;
    }

    /// Add a directional light
    ///
    /// Returns true if added, false if at limit.
    pub fn add(&mut self, light: DirectionalLightRecord) -> bool {
        if self.is_full() {
            self.overflow_count += 1;
            return false;
        }
        self.lights.push(light);
        true
    }

    pub fn is_full(&self) -> bool {
        self.lights.len() >= MAX_DIRECTIONAL_LIGHTS
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn lights(&self) -> &[DirectionalLightRecord] {
        &self.lights
    }

    pub fn overflow_count(&self) -> u32 {
        self.overflow_count
    }

    /// Build the GPU block; entries past `len()` stay zeroed
    pub fn to_gpu(&self) -> GpuDirectionalLights {
        let mut gpu = GpuDirectionalLights {
            count: self.lights.len() as u32,
            ..Default::default()
        };

        for (i, light) in self.lights.iter().enumerate() {
            gpu.colors[i] = light.color.extend(0.0).to_array();
            gpu.directions[i] = light.direction.extend(0.0).to_array();
            gpu.shadow_data[i] = light.shadow.to_gpu();
        }

        gpu
    }
}
