//! Command Recording
//!
//! Lighting and shadow stages never talk to the GPU directly. They record
//! [`RenderCommand`]s into a named [`CommandBuffer`] and hand the buffer to a
//! [`RenderBackend`] at well-defined flush points. Recording is cheap and
//! never blocks; the backend decides how (and when) to submit.

use glam::Mat4;

use crate::culling::ShadowSplitData;
use crate::error::BackendError;
use crate::light_buffer::GpuDirectionalLights;
use crate::resource::{AtlasDesc, LoadAction, StoreAction, Viewport};
use crate::shadow::data::GpuDirectionalShadows;

/// Caster draw request for one light and one cascade
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowDrawSettings {
    pub visible_light_index: usize,
    pub split_data: ShadowSplitData,
}

/// A single recorded command
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    /// Open a named profiling scope
    BeginSample(&'static str),
    /// Close a named profiling scope
    EndSample(&'static str),
    /// Acquire the frame's temporary directional shadow atlas
    GetTemporaryAtlas(AtlasDesc),
    /// Bind the shadow atlas as the depth render target
    SetAtlasRenderTarget {
        load: LoadAction,
        store: StoreAction,
    },
    /// Clear the bound depth target
    ClearDepth,
    SetViewport(Viewport),
    SetViewProjection {
        view: Mat4,
        projection: Mat4,
    },
    /// Draw every shadow caster of a light inside one cascade
    DrawShadows(ShadowDrawSettings),
    /// Release the temporary shadow atlas
    ReleaseTemporaryAtlas,
    /// Publish directional light data to the shading stage
    SetDirectionalLights(Box<GpuDirectionalLights>),
    /// Publish cascade transforms, culling spheres and fade data to the shading stage
    SetDirectionalShadows(Box<GpuDirectionalShadows>),
}

/// Named list of recorded commands
#[derive(Clone, Debug, Default)]
pub struct CommandBuffer {
    name: &'static str,
    commands: Vec<RenderCommand>,
}

impl CommandBuffer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            commands: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    pub fn begin_sample(&mut self) {
        self.push(RenderCommand::BeginSample(self.name));
    }

    pub fn end_sample(&mut self) {
        self.push(RenderCommand::EndSample(self.name));
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Remove and return every recorded command, keeping the allocation
    pub fn drain(&mut self) -> std::vec::Drain<'_, RenderCommand> {
        self.commands.drain(..)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

/// Graphics backend that executes recorded commands
pub trait RenderBackend {
    /// Whether the depth buffer stores far at 0 and near at 1
    fn uses_reversed_z(&self) -> bool;

    /// Execute and clear the buffer
    ///
    /// Atlas allocation failures must be reported, not swallowed. The buffer
    /// is expected to be empty afterwards whether or not execution succeeded.
    fn execute(&mut self, buffer: &mut CommandBuffer) -> Result<(), BackendError>;
}
