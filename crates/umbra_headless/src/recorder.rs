//! Recording Backend
//!
//! A [`RenderBackend`] that executes nothing on a GPU. Every command is
//! validated against the atlas lifecycle and appended to a log that tests
//! can inspect.

use umbra_render::command::{CommandBuffer, RenderBackend, RenderCommand};
use umbra_render::error::BackendError;
use umbra_render::light_buffer::GpuDirectionalLights;
use umbra_render::resource::{AtlasDesc, Viewport};
use umbra_render::shadow::GpuDirectionalShadows;

/// A command together with the buffer it was recorded into
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCommand {
    pub buffer: &'static str,
    pub command: RenderCommand,
}

/// Headless backend that records executed commands
#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
    reversed_z: bool,
    /// Largest atlas side length that can be allocated
    max_atlas_size: Option<u32>,
    log: Vec<RecordedCommand>,
    live_atlas: Option<AtlasDesc>,
    allocations: Vec<AtlasDesc>,
    samples: Vec<&'static str>,
    executions: usize,
    lights: Option<GpuDirectionalLights>,
    shadows: Option<GpuDirectionalShadows>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a reversed depth buffer to the shadow planner
    pub fn with_reversed_z(mut self, reversed_z: bool) -> Self {
        self.reversed_z = reversed_z;
        self
    }

    /// Fail atlas allocations larger than `size` texels per side
    pub fn with_max_atlas_size(mut self, size: u32) -> Self {
        self.max_atlas_size = Some(size);
        self
    }

    fn apply(&mut self, buffer: &'static str, command: &RenderCommand) -> Result<(), BackendError> {
        match command {
            RenderCommand::BeginSample(name) => self.samples.push(*name),
            RenderCommand::EndSample(name) => match self.samples.pop() {
                Some(open) if open == *name => {}
                open => {
                    return Err(BackendError::Other(format!(
                        "sample `{}` closed while `{:?}` was open",
                        name, open
                    )))
                }
            },
            RenderCommand::GetTemporaryAtlas(desc) => {
                if self.live_atlas.is_some() {
                    return Err(BackendError::Other("shadow atlas allocated twice".into()));
                }
                if let Some(max) = self.max_atlas_size {
                    if desc.width > max || desc.height > max {
                        return Err(BackendError::AtlasAllocation {
                            width: desc.width,
                            height: desc.height,
                            reason: format!("exceeds {}x{} limit", max, max),
                        });
                    }
                }
                self.live_atlas = Some(*desc);
                self.allocations.push(*desc);
            }
            RenderCommand::SetAtlasRenderTarget { .. }
            | RenderCommand::ClearDepth
            | RenderCommand::SetViewProjection { .. }
            | RenderCommand::DrawShadows(_) => {
                self.atlas()?;
            }
            RenderCommand::SetViewport(viewport) => {
                let atlas = self.atlas()?;
                if !viewport.fits_within(atlas.width) {
                    return Err(BackendError::Other(format!(
                        "viewport {:?} outside {}x{} atlas",
                        viewport, atlas.width, atlas.height
                    )));
                }
            }
            RenderCommand::ReleaseTemporaryAtlas => {
                self.atlas()?;
                self.live_atlas = None;
            }
            RenderCommand::SetDirectionalLights(lights) => self.lights = Some(**lights),
            RenderCommand::SetDirectionalShadows(shadows) => self.shadows = Some(**shadows),
        }

        log::trace!("[{}] {:?}", buffer, command);
        Ok(())
    }

    fn atlas(&self) -> Result<AtlasDesc, BackendError> {
        self.live_atlas.ok_or(BackendError::AtlasNotAllocated)
    }

    /// Every command executed so far, in order
    pub fn log(&self) -> &[RecordedCommand] {
        &self.log
    }

    pub fn commands(&self) -> impl Iterator<Item = &RenderCommand> {
        self.log.iter().map(|recorded| &recorded.command)
    }

    /// Commands that came from the named buffer
    pub fn commands_from<'a>(&'a self, buffer: &'a str) -> impl Iterator<Item = &'a RenderCommand> + 'a {
        self.log
            .iter()
            .filter(move |recorded| recorded.buffer == buffer)
            .map(|recorded| &recorded.command)
    }

    /// Atlas currently held by the planner, if any
    pub fn live_atlas(&self) -> Option<AtlasDesc> {
        self.live_atlas
    }

    /// Every atlas allocated so far
    pub fn allocations(&self) -> &[AtlasDesc] {
        &self.allocations
    }

    pub fn viewports(&self) -> Vec<Viewport> {
        self.commands()
            .filter_map(|command| match command {
                RenderCommand::SetViewport(viewport) => Some(*viewport),
                _ => None,
            })
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.commands()
            .filter(|command| matches!(command, RenderCommand::DrawShadows(_)))
            .count()
    }

    /// Number of `execute` calls
    pub fn executions(&self) -> usize {
        self.executions
    }

    /// Last published directional light block
    pub fn published_lights(&self) -> Option<&GpuDirectionalLights> {
        self.lights.as_ref()
    }

    /// Last published directional shadow block
    pub fn published_shadows(&self) -> Option<&GpuDirectionalShadows> {
        self.shadows.as_ref()
    }
}

impl RenderBackend for RecordingBackend {
    fn uses_reversed_z(&self) -> bool {
        self.reversed_z
    }

    fn execute(&mut self, buffer: &mut CommandBuffer) -> Result<(), BackendError> {
        self.executions += 1;
        let name = buffer.name();

        // Anything after a failing command is discarded with the buffer.
        for command in buffer.drain() {
            self.apply(name, &command)?;
            self.log.push(RecordedCommand {
                buffer: name,
                command,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(commands: Vec<RenderCommand>) -> CommandBuffer {
        let mut buffer = CommandBuffer::new("Test");
        for command in commands {
            buffer.push(command);
        }
        buffer
    }

    #[test]
    fn test_atlas_lifecycle() {
        let mut backend = RecordingBackend::new();
        let mut commands = buffer(vec![
            RenderCommand::GetTemporaryAtlas(AtlasDesc::shadow_map(1024)),
            RenderCommand::ClearDepth,
        ]);

        backend.execute(&mut commands).unwrap();
        assert!(commands.is_empty());
        assert_eq!(backend.live_atlas(), Some(AtlasDesc::shadow_map(1024)));

        backend.execute(&mut buffer(vec![RenderCommand::ReleaseTemporaryAtlas])).unwrap();
        assert_eq!(backend.live_atlas(), None);
        assert_eq!(backend.allocations().len(), 1);
        assert_eq!(backend.executions(), 2);
    }

    #[test]
    fn test_draw_without_atlas_fails() {
        let mut backend = RecordingBackend::new();
        let err = backend
            .execute(&mut buffer(vec![RenderCommand::ClearDepth]))
            .unwrap_err();

        assert_eq!(err, BackendError::AtlasNotAllocated);
        assert!(backend.log().is_empty());
    }

    #[test]
    fn test_allocation_limit() {
        let mut backend = RecordingBackend::new().with_max_atlas_size(512);
        let mut commands = buffer(vec![
            RenderCommand::GetTemporaryAtlas(AtlasDesc::shadow_map(1024)),
            RenderCommand::ClearDepth,
        ]);

        let err = backend.execute(&mut commands).unwrap_err();
        assert!(matches!(err, BackendError::AtlasAllocation { width: 1024, height: 1024, .. }));
        assert!(commands.is_empty());
        assert_eq!(backend.live_atlas(), None);
    }

    #[test]
    fn test_viewport_outside_atlas() {
        let mut backend = RecordingBackend::new();
        let err = backend
            .execute(&mut buffer(vec![
                RenderCommand::GetTemporaryAtlas(AtlasDesc::shadow_map(256)),
                RenderCommand::SetViewport(Viewport::new(128, 0, 256, 256)),
            ]))
            .unwrap_err();

        assert!(matches!(err, BackendError::Other(_)));
    }

    #[test]
    fn test_unbalanced_samples() {
        let mut backend = RecordingBackend::new();
        assert!(backend
            .execute(&mut buffer(vec![RenderCommand::EndSample("Shadows")]))
            .is_err());
    }
}
