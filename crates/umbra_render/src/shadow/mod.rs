//! Directional Shadow Atlas
//!
//! Backend-agnostic planning and rendering of cascaded directional light
//! shadows into one shared depth atlas.
//!
//! # Architecture
//!
//! The shadow system is split into:
//!
//! - **Config**: Per-view shadow settings and quality presets
//! - **Tile**: Atlas grid layout and world-to-atlas transforms
//! - **Cascade**: Cascade culling spheres and fade parameters
//! - **Data**: GPU-ready data published to the shading stage
//! - **Planner**: Per-frame reservation, rendering and cleanup
//!
//! # Usage
//!
//! ```ignore
//! use umbra_render::shadow::*;
//!
//! let mut planner = ShadowAtlasPlanner::new();
//!
//! // Per-frame shadow setup
//! planner.setup(&ShadowSettings::default())?;
//!
//! for (index, light) in culling.visible_lights().iter().enumerate() {
//!     let reservation = planner.reserve(&culling, light, index)?;
//!     // reservation.to_gpu() goes into the light's shadow data
//! }
//!
//! planner.render(&culling, &mut backend)?;
//! // ... draw the scene ...
//! planner.cleanup(&mut backend)?;
//! ```

pub mod config;
pub mod tile;
pub mod cascade;
pub mod data;
pub mod planner;

// Re-exports
pub use config::{
    AtlasSize,
    DirectionalShadowSettings,
    ShadowSettings,
    ShadowQuality,
};

pub use tile::{atlas_matrix, TileGrid};

pub use cascade::{distance_fade, CascadeEntry, MAX_CASCADES};

pub use data::{
    GpuDirectionalShadows,
    MAX_CASCADE_SLOTS,
    MAX_SHADOWED_DIRECTIONAL_LIGHTS,
};

pub use planner::{
    CascadeRole,
    PlannerState,
    ReservationRejection,
    ShadowAtlasPlanner,
    ShadowReservation,
    ShadowStats,
    ShadowedLightSlot,
};
