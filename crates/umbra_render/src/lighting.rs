//! Per-View Lighting Stage
//!
//! Ties the light collector and the shadow atlas planner together for one
//! camera. Each view owns its own [`Lighting`]; nothing is shared between
//! views.
//!
//! # Frame
//!
//! ```ignore
//! let mut lighting = Lighting::new();
//!
//! lighting.setup(&mut backend, &culling, &settings)?;
//! // ... draw opaque and transparent geometry ...
//! lighting.cleanup(&mut backend)?;
//! ```

use crate::command::{CommandBuffer, RenderBackend, RenderCommand};
use crate::culling::CullingResults;
use crate::error::Result;
use crate::light_collector::LightCollector;
use crate::shadow::{ShadowAtlasPlanner, ShadowSettings};

const BUFFER_NAME: &str = "Lighting";

/// Lighting state for one view
#[derive(Debug)]
pub struct Lighting {
    collector: LightCollector,
    shadows: ShadowAtlasPlanner,
    buffer: CommandBuffer,
}

impl Lighting {
    pub fn new() -> Self {
        Self {
            collector: LightCollector::new(),
            shadows: ShadowAtlasPlanner::new(),
            buffer: CommandBuffer::new(BUFFER_NAME),
        }
    }

    /// Collect lights, render the shadow atlas and publish light data
    ///
    /// Must be paired with [`Lighting::cleanup`] once the view has been drawn.
    pub fn setup<B, C>(&mut self, backend: &mut B, culling: &C, settings: &ShadowSettings) -> Result<()>
    where
        B: RenderBackend + ?Sized,
        C: CullingResults + ?Sized,
    {
        self.buffer.clear();
        self.buffer.begin_sample();

        self.shadows.setup(settings)?;
        self.collector.setup();
        let lights = self.collector.collect(culling, &mut self.shadows)?;
        self.buffer.push(RenderCommand::SetDirectionalLights(Box::new(lights.to_gpu())));

        self.shadows.render(culling, backend)?;

        self.buffer.end_sample();
        let result = backend.execute(&mut self.buffer);
        self.buffer.clear();
        result?;

        log::debug!(
            "Lighting: {} directional lights, {} shadowed",
            self.collector.lights().len(),
            self.shadows.shadowed_light_count()
        );
        Ok(())
    }

    /// Release per-frame resources
    pub fn cleanup<B>(&mut self, backend: &mut B) -> Result<()>
    where
        B: RenderBackend + ?Sized,
    {
        self.shadows.cleanup(backend)
    }

    pub fn collector(&self) -> &LightCollector {
        &self.collector
    }

    pub fn shadows(&self) -> &ShadowAtlasPlanner {
        &self.shadows
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culling::{
        CascadeMatrices, CascadeRequest, CasterBounds, ShadowMode, ShadowSplitData, VisibleLight,
    };
    use crate::error::{BackendError, ShadowError};
    use crate::shadow::PlannerState;
    use glam::{Mat4, Vec3, Vec4};

    struct OneLight(Vec<VisibleLight>);

    impl CullingResults for OneLight {
        fn visible_lights(&self) -> &[VisibleLight] {
            &self.0
        }

        fn shadow_caster_bounds(&self, _visible_light_index: usize) -> Option<CasterBounds> {
            Some(CasterBounds::from_center_extents(Vec3::ZERO, Vec3::ONE))
        }

        fn compute_directional_shadow_matrices(&self, _request: &CascadeRequest) -> CascadeMatrices {
            CascadeMatrices {
                view: Mat4::IDENTITY,
                projection: Mat4::IDENTITY,
                split_data: ShadowSplitData {
                    culling_sphere: Vec4::new(0.0, 0.0, 0.0, 2.0),
                },
            }
        }
    }

    #[derive(Default)]
    struct Log {
        commands: Vec<RenderCommand>,
        buffers: Vec<&'static str>,
    }

    impl RenderBackend for Log {
        fn uses_reversed_z(&self) -> bool {
            false
        }

        fn execute(&mut self, buffer: &mut CommandBuffer) -> core::result::Result<(), BackendError> {
            self.buffers.push(buffer.name());
            self.commands.extend(buffer.drain());
            Ok(())
        }
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn culling() -> OneLight {
        OneLight(vec![
            VisibleLight::directional(Vec3::ONE, Vec3::NEG_Y).with_shadows(ShadowMode::Hard, 1.0)
        ])
    }

    #[test]
    fn test_setup_publishes_lights_in_sample_scope() {
        init_logging();
        let culling = culling();
        let mut backend = Log::default();
        let mut lighting = Lighting::new();

        lighting.setup(&mut backend, &culling, &ShadowSettings::default()).unwrap();

        assert_eq!(backend.buffers.last(), Some(&"Lighting"));
        let n = backend.commands.len();
        assert_eq!(backend.commands[n - 1], RenderCommand::EndSample("Lighting"));
        assert!(matches!(
            &backend.commands[n - 2],
            RenderCommand::SetDirectionalLights(lights) if lights.count == 1 && lights.shadow_data[0][0] == 1.0
        ));
        assert_eq!(backend.commands[n - 3], RenderCommand::BeginSample("Lighting"));
        assert_eq!(lighting.shadows().state(), PlannerState::Built);
    }

    #[test]
    fn test_frame_cycle() {
        init_logging();
        let culling = culling();
        let mut backend = Log::default();
        let mut lighting = Lighting::new();
        let settings = ShadowSettings::default();

        for _ in 0..3 {
            lighting.setup(&mut backend, &culling, &settings).unwrap();
            lighting.cleanup(&mut backend).unwrap();
        }

        assert_eq!(lighting.shadows().state(), PlannerState::Idle);
        assert_eq!(lighting.collector().lights().len(), 1);
    }

    #[test]
    fn test_setup_without_cleanup_fails() {
        let culling = culling();
        let mut backend = Log::default();
        let mut lighting = Lighting::new();
        let settings = ShadowSettings::default();

        lighting.setup(&mut backend, &culling, &settings).unwrap();
        let err = lighting.setup(&mut backend, &culling, &settings).unwrap_err();

        assert_eq!(
            err,
            ShadowError::InvalidState {
                operation: "setup",
                state: PlannerState::Built
            }
        );
    }
}
