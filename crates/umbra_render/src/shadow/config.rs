//! Shadow Configuration
//!
//! Frame-level shadow settings with serde support for hot-reload.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::MAX_CASCADES;

/// Side length of the directional shadow atlas in texels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtlasSize {
    _256,
    _512,
    #[default]
    _1024,
    _2048,
    _4096,
    _8192,
}

impl AtlasSize {
    pub fn texels(self) -> u32 {
        match self {
            Self::_256 => 256,
            Self::_512 => 512,
            Self::_1024 => 1024,
            Self::_2048 => 2048,
            Self::_4096 => 4096,
            Self::_8192 => 8192,
        }
    }
}

/// Directional light shadow settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionalShadowSettings {
    pub atlas_size: AtlasSize,

    /// Cascades per light (1-4)
    pub cascade_count: u32,

    /// Cumulative end of cascades 1-3 as a fraction of the shadow distance
    pub cascade_ratio_1: f32,
    pub cascade_ratio_2: f32,
    pub cascade_ratio_3: f32,

    /// Fraction of each cascade over which it fades into the next
    pub cascade_fade: f32,
}

impl Default for DirectionalShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: AtlasSize::_1024,
            cascade_count: 4,
            cascade_ratio_1: 0.1,
            cascade_ratio_2: 0.25,
            cascade_ratio_3: 0.5,
            cascade_fade: 0.1,
        }
    }
}

impl DirectionalShadowSettings {
    /// Cascade ratios as passed to the culling provider
    pub fn cascade_ratios(&self) -> Vec3 {
        Vec3::new(self.cascade_ratio_1, self.cascade_ratio_2, self.cascade_ratio_3)
    }
}

/// Global shadow settings for one view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    /// Maximum distance from the camera at which shadows are rendered
    pub max_distance: f32,

    /// Fraction of `max_distance` over which shadows fade out
    pub distance_fade: f32,

    pub directional: DirectionalShadowSettings,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            distance_fade: 0.1,
            directional: DirectionalShadowSettings::default(),
        }
    }
}

impl ShadowSettings {
    /// Create a high-quality shadow configuration
    pub fn high_quality() -> Self {
        Self {
            max_distance: 150.0,
            directional: DirectionalShadowSettings {
                atlas_size: AtlasSize::_4096,
                cascade_count: 4,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Create a low-quality shadow configuration for performance
    pub fn low_quality() -> Self {
        Self {
            max_distance: 50.0,
            directional: DirectionalShadowSettings {
                atlas_size: AtlasSize::_512,
                cascade_count: 2,
                cascade_ratio_1: 0.3,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Shadow distance handed to culling: shadows never reach past the far clip plane
    pub fn culling_distance(&self, far_clip_plane: f32) -> f32 {
        self.max_distance.min(far_clip_plane)
    }

    /// Validate configuration and clamp values to valid ranges
    pub fn validate(&mut self) {
        let before = self.clone();

        self.max_distance = self.max_distance.max(0.001);
        self.distance_fade = self.distance_fade.clamp(0.001, 1.0);

        let dir = &mut self.directional;
        dir.cascade_count = dir.cascade_count.clamp(1, MAX_CASCADES as u32);
        dir.cascade_ratio_1 = dir.cascade_ratio_1.clamp(0.0, 1.0);
        dir.cascade_ratio_2 = dir.cascade_ratio_2.clamp(dir.cascade_ratio_1, 1.0);
        dir.cascade_ratio_3 = dir.cascade_ratio_3.clamp(dir.cascade_ratio_2, 1.0);
        dir.cascade_fade = dir.cascade_fade.clamp(0.001, 1.0);

        if *self != before {
            log::warn!("Shadow settings clamped: {:?} -> {:?}", before, self);
        }
    }
}

/// Shadow quality preset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowQuality {
    Low,
    Medium,
    High,
}

impl ShadowQuality {
    /// Convert to a ShadowSettings
    pub fn to_settings(self) -> ShadowSettings {
        match self {
            Self::Low => ShadowSettings::low_quality(),
            Self::Medium => ShadowSettings::default(),
            Self::High => ShadowSettings::high_quality(),
        }
    }
}
