//! Directional Shadow Atlas Planner
//!
//! Owns one view's directional shadow atlas for one frame. Lights ask for
//! atlas space through [`ShadowAtlasPlanner::reserve`]; once every request
//! is in, [`ShadowAtlasPlanner::render`] picks the tile grid, renders each
//! light's cascades into its tiles and publishes the atlas transforms.
//!
//! # Frame lifecycle
//!
//! ```text
//! Idle --setup--> Collecting --reserve*--> Collecting --render--> Built --cleanup--> Idle
//! ```
//!
//! Calling an operation from the wrong state is a contract violation and
//! returns [`ShadowError::InvalidState`].

use serde::{Deserialize, Serialize};

use crate::command::{CommandBuffer, RenderBackend, RenderCommand, ShadowDrawSettings};
use crate::culling::{CascadeRequest, CullingResults, VisibleLight};
use crate::error::{Result, ShadowError};
use crate::resource::{AtlasDesc, LoadAction, StoreAction};

use super::cascade::{distance_fade, CascadeEntry, MAX_CASCADES};
use super::config::ShadowSettings;
use super::data::{GpuDirectionalShadows, MAX_SHADOWED_DIRECTIONAL_LIGHTS};
use super::tile::TileGrid;

const BUFFER_NAME: &str = "Shadows";

/// Smallest distance or fade range the fade vector is computed from
const MIN_FADE_RANGE: f32 = 0.001;

/// Lifecycle state of a planner within a frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlannerState {
    /// No frame in progress
    #[default]
    Idle,
    /// Settings stored, accepting reservations
    Collecting,
    /// Atlas allocated and rendered, waiting for cleanup
    Built,
}

/// Result of a shadow reservation, as consumed by the shading stage
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadowReservation {
    /// Shadow strength, 0 when the light is unshadowed
    pub strength: f32,
    /// Index of the light's first cascade slot in the cascade arrays
    pub cascade_slot_base: u32,
}

impl ShadowReservation {
    /// Sentinel for lights without atlas space
    pub const NONE: Self = Self {
        strength: 0.0,
        cascade_slot_base: 0,
    };

    pub fn is_shadowed(&self) -> bool {
        self.strength > 0.0
    }

    /// Shader layout `(strength, cascade_slot_base, 0, 0)`
    pub fn to_gpu(&self) -> [f32; 4] {
        [self.strength, self.cascade_slot_base as f32, 0.0, 0.0]
    }
}

impl Default for ShadowReservation {
    fn default() -> Self {
        Self::NONE
    }
}

/// A directional light granted atlas space this frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShadowedLightSlot {
    /// Index into the view's visible light list
    pub visible_light_index: usize,
}

/// Why a reservation returned [`ShadowReservation::NONE`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationRejection {
    CapacityReached,
    ShadowsDisabled,
    NoStrength,
    NoCasters,
}

/// Whether a light's cascades also write the shared cascade culling data
///
/// Cascade spheres depend only on the camera, not on the light, so exactly
/// one light writes them: the primary light, which is always slot 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CascadeRole {
    Primary,
    Secondary,
}

impl CascadeRole {
    pub fn for_slot(slot_index: usize) -> Self {
        if slot_index == 0 {
            Self::Primary
        } else {
            Self::Secondary
        }
    }
}

/// Per-frame planner statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowStats {
    /// Reservations granted this frame
    pub reserved: u32,
    /// Rejections because all slots were taken
    pub rejected_capacity: u32,
    /// Rejections because the light's shadow mode is off
    pub rejected_disabled: u32,
    /// Rejections because of zero or negative strength
    pub rejected_strength: u32,
    /// Rejections because nothing casts a shadow for the light
    pub rejected_casters: u32,
    /// Atlas tiles rendered
    pub tiles: u32,
    /// Atlas grid split (0 when only the placeholder was allocated)
    pub split: u32,
}

impl ShadowStats {
    pub fn rejected(&self) -> u32 {
        self.rejected_capacity + self.rejected_disabled + self.rejected_strength + self.rejected_casters
    }

    fn record_rejection(&mut self, reason: ReservationRejection) {
        match reason {
            ReservationRejection::CapacityReached => self.rejected_capacity += 1,
            ReservationRejection::ShadowsDisabled => self.rejected_disabled += 1,
            ReservationRejection::NoStrength => self.rejected_strength += 1,
            ReservationRejection::NoCasters => self.rejected_casters += 1,
        }
    }
}

/// Directional shadow atlas planner for one view
///
/// Each rendering context (camera, view) needs its own planner; nothing is
/// shared between instances.
#[derive(Debug)]
pub struct ShadowAtlasPlanner {
    state: PlannerState,
    settings: ShadowSettings,
    slots: Vec<ShadowedLightSlot>,
    grid: Option<TileGrid>,
    shadows: Box<GpuDirectionalShadows>,
    buffer: CommandBuffer,
    stats: ShadowStats,
}

impl ShadowAtlasPlanner {
    pub fn new() -> Self {
        Self {
            state: PlannerState::Idle,
            settings: ShadowSettings::default(),
            slots: Vec::with_capacity(MAX_SHADOWED_DIRECTIONAL_LIGHTS),
            grid: None,
            shadows: Box::default(),
            buffer: CommandBuffer::new(BUFFER_NAME),
            stats: ShadowStats::default(),
        }
    }

    /// Begin a frame: drop last frame's reservations and store the settings
    pub fn setup(&mut self, settings: &ShadowSettings) -> Result<()> {
        self.expect_state("setup", &[PlannerState::Idle, PlannerState::Collecting])?;

        self.settings = settings.clone();
        clamp_frame_settings(&mut self.settings);

        self.slots.clear();
        self.grid = None;
        self.shadows.clear();
        self.buffer.clear();
        self.stats = ShadowStats::default();
        self.state = PlannerState::Collecting;
        Ok(())
    }

    /// Ask for atlas space for a directional light
    ///
    /// Returns [`ShadowReservation::NONE`] when the light cannot or need not
    /// cast shadows. Accepted lights get slots in call order.
    pub fn reserve<C>(
        &mut self,
        culling: &C,
        light: &VisibleLight,
        visible_light_index: usize,
    ) -> Result<ShadowReservation>
    where
        C: CullingResults + ?Sized,
    {
        self.expect_state("reserve", &[PlannerState::Collecting])?;

        if let Err(reason) = self.check_reservation(culling, light, visible_light_index) {
            log::trace!("No shadows for visible light {}: {:?}", visible_light_index, reason);
            self.stats.record_rejection(reason);
            return Ok(ShadowReservation::NONE);
        }

        let slot_index = self.slots.len();
        self.slots.push(ShadowedLightSlot { visible_light_index });
        self.stats.reserved += 1;

        Ok(ShadowReservation {
            strength: light.shadow_strength,
            cascade_slot_base: self.settings.directional.cascade_count * slot_index as u32,
        })
    }

    fn check_reservation<C>(
        &self,
        culling: &C,
        light: &VisibleLight,
        visible_light_index: usize,
    ) -> core::result::Result<(), ReservationRejection>
    where
        C: CullingResults + ?Sized,
    {
        if self.slots.len() >= MAX_SHADOWED_DIRECTIONAL_LIGHTS {
            return Err(ReservationRejection::CapacityReached);
        }
        if !light.shadow_mode.is_enabled() {
            return Err(ReservationRejection::ShadowsDisabled);
        }
        if light.shadow_strength <= 0.0 {
            return Err(ReservationRejection::NoStrength);
        }
        match culling.shadow_caster_bounds(visible_light_index) {
            Some(bounds) if !bounds.is_degenerate() => Ok(()),
            _ => Err(ReservationRejection::NoCasters),
        }
    }

    /// Allocate the atlas, render every reserved light and publish the shadow data
    ///
    /// Without reservations a 1x1 placeholder atlas is allocated so the
    /// shading stage always has something bound.
    pub fn render<C, B>(&mut self, culling: &C, backend: &mut B) -> Result<()>
    where
        C: CullingResults + ?Sized,
        B: RenderBackend + ?Sized,
    {
        self.expect_state("render", &[PlannerState::Collecting])?;

        if self.slots.is_empty() {
            log::debug!("No shadowed directional lights, binding placeholder atlas");
            self.buffer.push(RenderCommand::GetTemporaryAtlas(AtlasDesc::placeholder()));
            self.execute(backend)?;

            self.buffer.push(RenderCommand::SetDirectionalShadows(self.shadows.clone()));
            if let Err(err) = self.execute(backend) {
                self.release_after_failure(backend, false);
                return Err(err);
            }
        } else {
            let atlas_size = self.settings.directional.atlas_size.texels();
            self.buffer.push(RenderCommand::GetTemporaryAtlas(AtlasDesc::shadow_map(atlas_size)));
            self.buffer.push(RenderCommand::SetAtlasRenderTarget {
                load: LoadAction::DontCare,
                store: StoreAction::Store,
            });
            self.buffer.push(RenderCommand::ClearDepth);
            self.buffer.begin_sample();
            self.execute(backend)?;

            if let Err(err) = self.render_directional_shadows(culling, backend, atlas_size) {
                self.release_after_failure(backend, true);
                return Err(err);
            }
        }

        self.state = PlannerState::Built;
        Ok(())
    }

    /// Give the atlas back after a failed render so the next frame can allocate
    ///
    /// The planner stays in `Collecting`; errors from the release itself are
    /// only logged, the caller gets the original failure.
    fn release_after_failure<B>(&mut self, backend: &mut B, sample_open: bool)
    where
        B: RenderBackend + ?Sized,
    {
        self.buffer.clear();
        self.buffer.push(RenderCommand::ReleaseTemporaryAtlas);
        if sample_open {
            self.buffer.end_sample();
        }
        if let Err(err) = self.execute(backend) {
            log::warn!("Failed to release shadow atlas after render error: {}", err);
        }
    }

    /// Render every reserved light into an atlas that is already bound
    fn render_directional_shadows<C, B>(&mut self, culling: &C, backend: &mut B, atlas_size: u32) -> Result<()>
    where
        C: CullingResults + ?Sized,
        B: RenderBackend + ?Sized,
    {
        let cascade_count = self.settings.directional.cascade_count;
        let tiles = self.slots.len() as u32 * cascade_count;
        let grid = TileGrid::new(tiles, atlas_size);
        self.grid = Some(grid);
        self.stats.tiles = tiles;
        self.stats.split = grid.split;

        log::debug!(
            "Rendering {} shadowed directional lights: {} tiles in a {}x{} grid of {}px",
            self.slots.len(),
            tiles,
            grid.split,
            grid.split,
            grid.tile_size
        );

        let reversed_z = backend.uses_reversed_z();
        for slot_index in 0..self.slots.len() {
            let role = CascadeRole::for_slot(slot_index);
            self.render_light_cascades(culling, backend, slot_index, &grid, role, reversed_z)?;
        }

        self.shadows.distance_fade = distance_fade(&self.settings).to_array();
        self.shadows.cascade_count = cascade_count;
        self.buffer.push(RenderCommand::SetDirectionalShadows(self.shadows.clone()));
        self.buffer.end_sample();
        self.execute(backend)
    }

    /// Render all cascades of one reserved light into its atlas tiles
    fn render_light_cascades<C, B>(
        &mut self,
        culling: &C,
        backend: &mut B,
        slot_index: usize,
        grid: &TileGrid,
        role: CascadeRole,
        reversed_z: bool,
    ) -> Result<()>
    where
        C: CullingResults + ?Sized,
        B: RenderBackend + ?Sized,
    {
        let slot = self.slots[slot_index];
        let directional = &self.settings.directional;
        let cascade_count = directional.cascade_count;
        let ratios = directional.cascade_ratios();
        let tile_offset = slot_index as u32 * cascade_count;

        for cascade_index in 0..cascade_count {
            let cascade = culling.compute_directional_shadow_matrices(&CascadeRequest {
                visible_light_index: slot.visible_light_index,
                cascade_index,
                cascade_count,
                ratios,
                tile_resolution: grid.tile_size,
                near_plane_offset: 0.0,
            });

            if role == CascadeRole::Primary {
                let entry = CascadeEntry::new(cascade.split_data.culling_sphere, grid.tile_size);
                self.shadows.set_cascade(cascade_index as usize, &entry);
            }

            let tile_index = tile_offset + cascade_index;
            debug_assert!(tile_index < grid.capacity());

            let view_projection = cascade.projection * cascade.view;
            self.shadows.set_matrix(
                tile_index as usize,
                grid.atlas_matrix(view_projection, tile_index, reversed_z),
            );

            self.buffer.push(RenderCommand::SetViewport(grid.viewport(tile_index)));
            self.buffer.push(RenderCommand::SetViewProjection {
                view: cascade.view,
                projection: cascade.projection,
            });
            self.buffer.push(RenderCommand::DrawShadows(ShadowDrawSettings {
                visible_light_index: slot.visible_light_index,
                split_data: cascade.split_data,
            }));
            self.execute(backend)?;
        }

        Ok(())
    }

    /// Release the atlas; ends the frame
    pub fn cleanup<B>(&mut self, backend: &mut B) -> Result<()>
    where
        B: RenderBackend + ?Sized,
    {
        self.expect_state("cleanup", &[PlannerState::Built])?;

        self.buffer.push(RenderCommand::ReleaseTemporaryAtlas);
        self.state = PlannerState::Idle;
        self.execute(backend)
    }

    fn execute<B>(&mut self, backend: &mut B) -> Result<()>
    where
        B: RenderBackend + ?Sized,
    {
        let result = backend.execute(&mut self.buffer);
        self.buffer.clear();
        result.map_err(ShadowError::from)
    }

    fn expect_state(&self, operation: &'static str, allowed: &[PlannerState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ShadowError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    /// Number of lights granted atlas space this frame
    pub fn shadowed_light_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[ShadowedLightSlot] {
        &self.slots
    }

    /// Tile grid of the current frame, once rendered with at least one light
    pub fn grid(&self) -> Option<TileGrid> {
        self.grid
    }

    /// Shadow data published by the last render
    pub fn shadows(&self) -> &GpuDirectionalShadows {
        &self.shadows
    }

    pub fn stats(&self) -> &ShadowStats {
        &self.stats
    }
}

impl Default for ShadowAtlasPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep the frame settings inside what the atlas and fade vector can hold
///
/// More than four cascades would overflow the 16 atlas tiles, and zero
/// distances or fades would publish infinities. The rest is left to
/// [`ShadowSettings::validate`].
fn clamp_frame_settings(settings: &mut ShadowSettings) {
    let before = settings.clone();

    settings.max_distance = settings.max_distance.max(MIN_FADE_RANGE);
    settings.distance_fade = settings.distance_fade.max(MIN_FADE_RANGE);

    let directional = &mut settings.directional;
    directional.cascade_count = directional.cascade_count.clamp(1, MAX_CASCADES as u32);
    directional.cascade_fade = directional.cascade_fade.clamp(MIN_FADE_RANGE, 1.0);

    if *settings != before {
        log::warn!("Shadow settings out of range for this frame, clamped: {:?} -> {:?}", before, settings);
    }
}
