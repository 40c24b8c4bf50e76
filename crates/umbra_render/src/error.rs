//! Error types for lighting and shadow planning

use thiserror::Error;

use crate::shadow::planner::PlannerState;

/// Errors reported by a [`RenderBackend`](crate::command::RenderBackend)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("Failed to allocate {width}x{height} shadow atlas: {reason}")]
    AtlasAllocation {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("Shadow atlas used before it was allocated")]
    AtlasNotAllocated,

    #[error("Backend error: {0}")]
    Other(String),
}

/// Shadow planning errors
///
/// Reservation rejections are never errors; they produce
/// [`ShadowReservation::NONE`](crate::shadow::ShadowReservation::NONE).
/// Only contract violations and backend failures end up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShadowError {
    #[error("`{operation}` called while the shadow planner is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: PlannerState,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ShadowError>;
