//! # umbra_headless - CPU collaborators for umbra_render
//!
//! Reference implementations of the two interfaces the lighting stage
//! depends on, usable without a GPU:
//!
//! - [`SceneCulling`]: hand-built visible lights and caster bounds, with
//!   cascade matrices solved from a perspective [`Camera`]
//! - [`RecordingBackend`]: validates and logs every executed command
//!
//! ## Example
//!
//! ```ignore
//! use umbra_headless::prelude::*;
//! use umbra_render::prelude::*;
//!
//! let settings = ShadowSettings::default();
//! let culling = SceneCulling::with_settings(Camera::default(), &settings)
//!     .with_light(sun, Some(caster_bounds));
//!
//! let mut backend = RecordingBackend::new();
//! let mut lighting = Lighting::new();
//! lighting.setup(&mut backend, &culling, &settings)?;
//! lighting.cleanup(&mut backend)?;
//!
//! assert_eq!(backend.live_atlas(), None);
//! ```

pub mod culling;
pub mod recorder;

pub use culling::{Camera, SceneCulling};
pub use recorder::{RecordedCommand, RecordingBackend};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::culling::{Camera, SceneCulling};
    pub use crate::recorder::{RecordedCommand, RecordingBackend};
}
