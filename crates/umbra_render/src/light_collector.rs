//! Directional Light Collection
//!
//! Walks the view's visible lights, keeps the first directional lights up to
//! [`MAX_DIRECTIONAL_LIGHTS`](crate::light_buffer::MAX_DIRECTIONAL_LIGHTS) and asks the shadow planner for atlas space for
//! each of them.
//!
//! # Usage
//!
//! ```ignore
//! let mut collector = LightCollector::new();
//! collector.setup();
//!
//! planner.setup(&settings)?;
//! let lights = collector.collect(&culling, &mut planner)?;
//! backend_upload(lights.to_gpu().as_bytes());
//! ```

use crate::culling::CullingResults;
use crate::error::Result;
use crate::light_buffer::{DirectionalLightBuffer, DirectionalLightRecord};
use crate::shadow::ShadowAtlasPlanner;

/// Per-view directional light collector
#[derive(Clone, Debug, Default)]
pub struct LightCollector {
    buffer: DirectionalLightBuffer,
    /// Visible lights skipped because they are not directional
    skipped: usize,
}

impl LightCollector {
    pub fn new() -> Self {
        Self {
            buffer: DirectionalLightBuffer::new(),
            skipped: 0,
        }
    }

    /// Reset for a new frame
    pub fn setup(&mut self) {
        self.buffer.clear();
        self.skipped = 0;
    }

    /// Collect directional lights in visible order
    ///
    /// Non-directional lights never consume capacity. Collection stops once
    /// the buffer is full; the remaining lights are ignored and get no
    /// shadow reservation.
    pub fn collect<C>(
        &mut self,
        culling: &C,
        planner: &mut ShadowAtlasPlanner,
    ) -> Result<&DirectionalLightBuffer>
    where
        C: CullingResults + ?Sized,
    {
        for (index, light) in culling.visible_lights().iter().enumerate() {
            if self.buffer.is_full() {
                break;
            }
            if !light.is_directional() {
                self.skipped += 1;
                continue;
            }

            let shadow = planner.reserve(culling, light, index)?;
            let added = self.buffer.add(DirectionalLightRecord {
                color: light.final_color,
                direction: light.direction_to_light(),
                shadow,
            });
            debug_assert!(added, "directional light buffer overflowed after a capacity check");
        }

        log::trace!(
            "Collected {} directional lights ({} non-directional skipped)",
            self.buffer.len(),
            self.skipped
        );

        Ok(&self.buffer)
    }

    pub fn lights(&self) -> &DirectionalLightBuffer {
        &self.buffer
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
