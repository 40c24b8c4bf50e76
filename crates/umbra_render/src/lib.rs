//! # umbra_render - Directional Lighting and Shadow Atlas
//!
//! Backend-agnostic per-view lighting with:
//! - Directional light collection (up to 4 lights per view)
//! - Cascaded shadow atlas planning (up to 4 shadowed lights, 4 cascades each)
//! - Command recording flushed through a swappable backend
//! - GPU-ready data blocks for the shading stage
//!
//! ## Architecture
//!
//! The lighting system is built on three main concepts:
//!
//! 1. **Culling**: An external provider supplies visible lights, caster bounds
//!    and cascade matrices ([`CullingResults`])
//! 2. **Planning**: The [`ShadowAtlasPlanner`] decides which lights get atlas
//!    space and where their cascades go
//! 3. **Commands**: Everything GPU-facing is recorded into a [`CommandBuffer`]
//!    and executed by a [`RenderBackend`]
//!
//! ## Example
//!
//! ```ignore
//! use umbra_render::prelude::*;
//!
//! let mut lighting = Lighting::new();
//! let settings = ShadowQuality::High.to_settings();
//!
//! // Per frame, per view
//! lighting.setup(&mut backend, &culling, &settings)?;
//! // ... draw geometry sampling the shadow atlas ...
//! lighting.cleanup(&mut backend)?;
//! ```

pub mod error;
pub mod resource;
pub mod culling;
pub mod command;
pub mod light_buffer;
pub mod light_collector;
pub mod lighting;
pub mod shadow;

// Re-exports
pub use error::{BackendError, Result, ShadowError};
pub use resource::*;
pub use culling::{
    CascadeMatrices, CascadeRequest, CasterBounds, CullingResults, LightKind, ShadowMode,
    ShadowSplitData, VisibleLight,
};
pub use command::{CommandBuffer, RenderBackend, RenderCommand, ShadowDrawSettings};

// Lighting
pub use light_buffer::{
    DirectionalLightBuffer, DirectionalLightRecord, GpuDirectionalLights, MAX_DIRECTIONAL_LIGHTS,
};
pub use light_collector::LightCollector;
pub use lighting::Lighting;

// Shadow Atlas
pub use shadow::{
    // Config
    AtlasSize, DirectionalShadowSettings, ShadowSettings, ShadowQuality,
    // Layout
    TileGrid, CascadeEntry, MAX_CASCADES,
    // GPU Data
    GpuDirectionalShadows, MAX_CASCADE_SLOTS, MAX_SHADOWED_DIRECTIONAL_LIGHTS,
    // Planner
    CascadeRole, PlannerState, ReservationRejection, ShadowAtlasPlanner, ShadowReservation,
    ShadowStats, ShadowedLightSlot,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{BackendError, ShadowError};
    pub use crate::resource::{AtlasDesc, LoadAction, StoreAction, Viewport};
    pub use crate::culling::{
        CascadeMatrices, CascadeRequest, CasterBounds, CullingResults, LightKind, ShadowMode,
        ShadowSplitData, VisibleLight,
    };
    pub use crate::command::{CommandBuffer, RenderBackend, RenderCommand};
    pub use crate::light_buffer::{DirectionalLightRecord, GpuDirectionalLights};
    pub use crate::lighting::Lighting;
    pub use crate::shadow::{
        GpuDirectionalShadows, PlannerState, ShadowAtlasPlanner, ShadowQuality,
        ShadowReservation, ShadowSettings, TileGrid,
    };
}
