//! Render Resources - shadow atlas descriptions
//!
//! Abstract descriptions of the GPU resources the shadow planner asks a
//! backend for. Backends map these onto their own texture types.

use serde::{Deserialize, Serialize};

/// Depth texture format of a shadow atlas
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    /// Backend-native shadow map format (depth with hardware comparison)
    Shadowmap,
}

/// Texture filtering used when sampling the atlas
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterMode {
    Bilinear,
}

/// What happens to existing render target contents when it is bound
///
/// The atlas is cleared right after binding, so its old contents are
/// never loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadAction {
    DontCare,
}

/// What happens to render target contents after rendering
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreAction {
    Store,
}

/// Temporary shadow atlas description
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtlasDesc {
    pub width: u32,
    pub height: u32,
    /// Depth buffer precision in bits
    pub depth_bits: u32,
    pub filter: FilterMode,
    pub format: TextureFormat,
}

impl AtlasDesc {
    /// Square depth-only shadow atlas
    pub fn shadow_map(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            depth_bits: 32,
            filter: FilterMode::Bilinear,
            format: TextureFormat::Shadowmap,
        }
    }

    /// 1x1 atlas bound when no light casts shadows, so shader bindings stay valid
    pub fn placeholder() -> Self {
        Self::shadow_map(1)
    }
}

/// Pixel-space viewport rectangle inside a render target
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Check whether this viewport lies fully inside a `size x size` target
    pub fn fits_within(&self, size: u32) -> bool {
        self.x + self.width <= size && self.y + self.height <= size
    }

    /// Check whether two viewports share any texel
    pub fn overlaps(&self, other: &Viewport) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}
