//! Atlas Tile Grid
//!
//! The directional shadow atlas is one square depth texture divided into a
//! `split x split` grid of equally sized tiles, one tile per light cascade.
//! Tile `i` sits at column `i % split`, row `i / split`.

use glam::{Mat4, UVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::resource::Viewport;

/// Square grid of atlas tiles for one frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    /// Tiles per row and column (1, 2 or 4)
    pub split: u32,
    /// Tile side length in texels
    pub tile_size: u32,
}

impl TileGrid {
    /// Smallest allowed grid holding `tile_count` tiles
    ///
    /// Grids stop at 4x4, which matches the most tiles a frame can request
    /// (4 shadowed lights with 4 cascades each).
    pub fn split_for(tile_count: u32) -> u32 {
        if tile_count <= 1 {
            1
        } else if tile_count <= 4 {
            2
        } else {
            4
        }
    }

    pub fn new(tile_count: u32, atlas_size: u32) -> Self {
        let split = Self::split_for(tile_count);
        Self {
            split,
            tile_size: atlas_size / split,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.split * self.split
    }

    /// Grid cell `(column, row)` of a tile
    pub fn tile_offset(&self, tile_index: u32) -> UVec2 {
        UVec2::new(tile_index % self.split, tile_index / self.split)
    }

    /// Texel rectangle covered by a tile
    pub fn viewport(&self, tile_index: u32) -> Viewport {
        let offset = self.tile_offset(tile_index) * self.tile_size;
        Viewport::new(offset.x, offset.y, self.tile_size, self.tile_size)
    }

    /// Remap a light view-projection into a tile's normalized atlas coordinates
    ///
    /// Clip-space X/Y in `[-1, 1]` become `[0, 1]`, are scaled by `1 / split`
    /// and shifted to the tile's cell. Depth is remapped to `[0, 1]` but not
    /// scaled. With a reversed depth buffer the depth row is negated first.
    pub fn atlas_matrix(&self, view_projection: Mat4, tile_index: u32, reversed_z: bool) -> Mat4 {
        atlas_matrix(view_projection, self.tile_offset(tile_index).as_vec2(), self.split, reversed_z)
    }
}

/// World-to-atlas transform for a tile at grid `offset` in a `split x split` atlas
pub fn atlas_matrix(view_projection: Mat4, offset: Vec2, split: u32, reversed_z: bool) -> Mat4 {
    // Columns hold one element of each row: col[r] is row r.
    let mut cols = view_projection.to_cols_array_2d();
    let scale = 1.0 / split as f32;

    for col in cols.iter_mut() {
        if reversed_z {
            col[2] = -col[2];
        }

        let w = col[3];
        col[0] = (0.5 * (col[0] + w) + offset.x * w) * scale;
        col[1] = (0.5 * (col[1] + w) + offset.y * w) * scale;
        col[2] = 0.5 * (col[2] + w);
    }

    Mat4::from_cols_array_2d(&cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn test_split_for_tile_count() {
        assert_eq!(TileGrid::split_for(0), 1);
        assert_eq!(TileGrid::split_for(1), 1);
        assert_eq!(TileGrid::split_for(2), 2);
        assert_eq!(TileGrid::split_for(4), 2);
        assert_eq!(TileGrid::split_for(5), 4);
        assert_eq!(TileGrid::split_for(16), 4);
    }

    #[test]
    fn test_tile_size() {
        let grid = TileGrid::new(6, 2048);
        assert_eq!(grid.split, 4);
        assert_eq!(grid.tile_size, 512);
        assert_eq!(grid.capacity(), 16);
    }

    #[test]
    fn test_tile_offsets() {
        let grid = TileGrid::new(16, 1024);
        assert_eq!(grid.tile_offset(0), UVec2::new(0, 0));
        assert_eq!(grid.tile_offset(3), UVec2::new(3, 0));
        assert_eq!(grid.tile_offset(5), UVec2::new(1, 1));
        assert_eq!(grid.tile_offset(15), UVec2::new(3, 3));
    }

    #[test]
    fn test_tile_viewports_do_not_overlap() {
        let grid = TileGrid::new(16, 1024);
        let viewports: Vec<_> = (0..16).map(|i| grid.viewport(i)).collect();

        for (i, a) in viewports.iter().enumerate() {
            assert!(a.fits_within(1024));
            for b in &viewports[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
        assert_eq!(grid.viewport(6), Viewport::new(512, 256, 256, 256));
    }

    #[test]
    fn test_atlas_matrix_identity_single_tile() {
        let m = atlas_matrix(Mat4::IDENTITY, Vec2::ZERO, 1, false);
        let p = m * Vec4::new(0.0, 0.0, 0.0, 1.0);

        assert!((p.x - 0.5).abs() < 1e-6);
        assert!((p.y - 0.5).abs() < 1e-6);
        assert!((p.z - 0.5).abs() < 1e-6);
        assert!((p.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_atlas_matrix_maps_clip_corners_into_tile() {
        let grid = TileGrid::new(4, 1024);
        // Tile 3 is the bottom-right cell of a 2x2 grid.
        let m = grid.atlas_matrix(Mat4::IDENTITY, 3, false);

        let lo = m * Vec4::new(-1.0, -1.0, 0.0, 1.0);
        let hi = m * Vec4::new(1.0, 1.0, 0.0, 1.0);

        assert!((lo.x - 0.5).abs() < 1e-6 && (lo.y - 0.5).abs() < 1e-6);
        assert!((hi.x - 1.0).abs() < 1e-6 && (hi.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_atlas_matrix_reversed_z() {
        let standard = atlas_matrix(Mat4::IDENTITY, Vec2::ZERO, 1, false);
        let reversed = atlas_matrix(Mat4::IDENTITY, Vec2::ZERO, 1, true);
        let near = Vec4::new(0.0, 0.0, 1.0, 1.0);

        assert!(((standard * near).z - 1.0).abs() < 1e-6);
        assert!(((reversed * near).z - 0.0).abs() < 1e-6);
        // X/Y are unaffected by depth orientation
        assert_eq!((standard * near).x, (reversed * near).x);
    }

    #[test]
    fn test_atlas_matrix_composes_with_translation() {
        let view_projection = Mat4::from_translation(Vec3::new(0.5, -0.5, 0.0));
        let m = atlas_matrix(view_projection, Vec2::new(1.0, 0.0), 2, false);
        let p = m * Vec4::new(0.0, 0.0, 0.0, 1.0);

        // Clip (0.5, -0.5) -> uv (0.75, 0.25) -> tile (1, 0) of 2x2
        assert!((p.x - 0.875).abs() < 1e-6);
        assert!((p.y - 0.125).abs() < 1e-6);
    }
}
