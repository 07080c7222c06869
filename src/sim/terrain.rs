//! Terrain collision grid
//!
//! Downsamples a bitmap's alpha channel into a coarse solid/empty grid and
//! answers point-in-solid queries in world space. Queries that fall outside
//! the mapped world rectangle are never solid, so agents near an ambiguous
//! edge are allowed to move rather than getting stuck.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::TerrainTuning;

/// Axis-aligned world rectangle (screen space, +y down)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl WorldRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Map a world point into [0,1]² grid-normalized space
    ///
    /// Degenerate rectangles map everything to NaN, which fails every range check.
    #[inline]
    pub fn normalize(&self, point: Vec2) -> Vec2 {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Vec2::NAN;
        }
        Vec2::new(
            (point.x - self.left) / self.width,
            (point.y - self.top) / self.height,
        )
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }
}

/// Something that can be rasterized into an alpha mask
///
/// This is the seam to whatever owns the terrain image (a decoded PNG, a
/// browser `ImageData`, a procedurally generated mask).
pub trait BitmapSource {
    /// Pixel dimensions of the source image
    fn dimensions(&self) -> (u32, u32);

    /// Draw the source scaled to `width × height` and return one alpha byte per
    /// output pixel, row-major. `None` means no raster target was available.
    fn rasterize_alpha(&self, width: u32, height: u32) -> Option<Vec<u8>>;
}

/// Owned RGBA8 bitmap
#[derive(Debug, Clone)]
pub struct RgbaBitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Byte length of a `width × height` RGBA buffer (`None` if it can't be addressed)
fn rgba_len(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)?.checked_mul(4)
}

impl RgbaBitmap {
    /// Wrap raw RGBA bytes. Returns `None` if the buffer length doesn't match.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if rgba_len(width, height) != Some(pixels.len()) {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Zero-size bitmap; builds a never-solid grid
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    /// Bitmap where every pixel has the given alpha
    pub fn filled(width: u32, height: u32, alpha: u8) -> Self {
        let Some(len) = rgba_len(width, height) else {
            log::warn!("Bitmap size {}x{} is too large; using an empty bitmap", width, height);
            return Self::empty();
        };
        Self {
            width,
            height,
            pixels: [0, 0, 0, alpha].repeat(len / 4),
        }
    }

    /// Build a bitmap from a per-pixel alpha function
    pub fn from_fn(width: u32, height: u32, mut alpha: impl FnMut(u32, u32) -> u8) -> Self {
        let Some(len) = rgba_len(width, height) else {
            log::warn!("Bitmap size {}x{} is too large; using an empty bitmap", width, height);
            return Self::empty();
        };
        let mut pixels = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[0, 0, 0, alpha(x, y)]);
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    #[inline]
    fn alpha(&self, x: u32, y: u32) -> u8 {
        self.pixels[(y as usize * self.width as usize + x as usize) * 4 + 3]
    }
}

impl BitmapSource for RgbaBitmap {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Box-filter downsample, like drawing the image into a smaller canvas
    fn rasterize_alpha(&self, width: u32, height: u32) -> Option<Vec<u8>> {
        if width == 0 || height == 0 || self.width == 0 || self.height == 0 {
            return None;
        }

        let sx = self.width as f32 / width as f32;
        let sy = self.height as f32 / height as f32;
        let mut out = Vec::with_capacity(width as usize * height as usize);

        for gy in 0..height {
            let y0 = ((gy as f32 * sy).floor() as u32).min(self.height - 1);
            let y1 = (((gy + 1) as f32 * sy).ceil() as u32).clamp(y0 + 1, self.height);
            for gx in 0..width {
                let x0 = ((gx as f32 * sx).floor() as u32).min(self.width - 1);
                let x1 = (((gx + 1) as f32 * sx).ceil() as u32).clamp(x0 + 1, self.width);

                let mut sum = 0u32;
                for y in y0..y1 {
                    for x in x0..x1 {
                        sum += self.alpha(x, y) as u32;
                    }
                }
                let count = (y1 - y0) * (x1 - x0);
                out.push((sum / count) as u8);
            }
        }

        Some(out)
    }
}

/// Low-resolution solid/empty lookup derived from a bitmap's opacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionGrid {
    width: u32,
    height: u32,
    /// Row-major solid flags (empty when the grid is degraded)
    cells: Vec<bool>,
    bounds: WorldRect,
}

impl CollisionGrid {
    /// Grid that is never solid
    pub fn empty(bounds: WorldRect) -> Self {
        Self {
            width: 0,
            height: 0,
            cells: Vec::new(),
            bounds,
        }
    }

    /// Rasterize `source` into a grid mapped onto `bounds`
    ///
    /// Zero-size sources or a missing raster target leave the grid empty.
    pub fn build<B: BitmapSource + ?Sized>(
        source: &B,
        bounds: WorldRect,
        tuning: &TerrainTuning,
    ) -> Self {
        let mut grid = Self::empty(bounds);
        grid.rebuild(source, tuning);
        grid
    }

    /// Re-rasterize from a (possibly new) source, keeping the current bounds
    pub fn rebuild<B: BitmapSource + ?Sized>(&mut self, source: &B, tuning: &TerrainTuning) {
        self.width = 0;
        self.height = 0;
        self.cells.clear();

        let (src_w, src_h) = source.dimensions();
        if src_w == 0 || src_h == 0 {
            log::warn!("Terrain bitmap has zero size; collision grid disabled");
            return;
        }

        let grid_w = src_w.min(tuning.max_grid_width.max(1));
        let grid_h = ((src_h as f32 * grid_w as f32 / src_w as f32).round() as u32).max(1);

        let Some(alpha) = source.rasterize_alpha(grid_w, grid_h) else {
            log::warn!("Terrain raster target unavailable; collision grid disabled");
            return;
        };
        if alpha.len() != grid_w as usize * grid_h as usize {
            log::warn!(
                "Terrain raster returned {} samples, expected {}x{}; collision grid disabled",
                alpha.len(),
                grid_w,
                grid_h
            );
            return;
        }

        self.cells = alpha
            .iter()
            .map(|&a| a > tuning.solid_alpha_threshold)
            .collect();
        self.width = grid_w;
        self.height = grid_h;

        log::debug!(
            "Built collision grid {}x{} from {}x{} bitmap ({} solid cells)",
            grid_w,
            grid_h,
            src_w,
            src_h,
            self.solid_count()
        );
    }

    /// Replace the world mapping without re-rasterizing
    pub fn update_bounds(&mut self, bounds: WorldRect) {
        self.bounds = bounds;
    }

    pub fn bounds(&self) -> WorldRect {
        self.bounds
    }

    /// Grid size in cells (0×0 when degraded)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Is the world point inside solid terrain?
    pub fn is_solid(&self, x: f32, y: f32) -> bool {
        self.is_solid_at(Vec2::new(x, y))
    }

    pub fn is_solid_at(&self, point: Vec2) -> bool {
        if self.cells.is_empty() {
            return false;
        }

        let n = self.bounds.normalize(point);
        // NaN fails both comparisons
        if !(0.0..=1.0).contains(&n.x) || !(0.0..=1.0).contains(&n.y) {
            return false;
        }

        let gx = ((n.x * self.width as f32).floor() as u32).min(self.width - 1);
        let gy = ((n.y * self.height as f32).floor() as u32).min(self.height - 1);
        self.cells[gy as usize * self.width as usize + gx as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bounds() -> WorldRect {
        WorldRect::new(0.0, 0.0, 100.0, 100.0)
    }

    /// Bitmap provider whose raster target is never available
    struct NoCanvas;

    impl BitmapSource for NoCanvas {
        fn dimensions(&self) -> (u32, u32) {
            (32, 32)
        }

        fn rasterize_alpha(&self, _width: u32, _height: u32) -> Option<Vec<u8>> {
            None
        }
    }

    #[test]
    fn test_opaque_bitmap_is_solid_everywhere() {
        let bitmap = RgbaBitmap::filled(64, 64, 255);
        let grid = CollisionGrid::build(&bitmap, bounds(), &TerrainTuning::default());
        assert_eq!(grid.dimensions(), (64, 64));

        for i in 0..=20 {
            for j in 0..=20 {
                let x = i as f32 * 5.0;
                let y = j as f32 * 5.0;
                assert!(grid.is_solid(x, y), "({}, {}) should be solid", x, y);
            }
        }
    }

    #[test]
    fn test_transparent_bitmap_is_never_solid() {
        let bitmap = RgbaBitmap::filled(64, 64, 0);
        let grid = CollisionGrid::build(&bitmap, bounds(), &TerrainTuning::default());
        assert_eq!(grid.solid_count(), 0);
        assert!(!grid.is_solid(50.0, 50.0));
    }

    #[test]
    fn test_faint_edges_count_as_solid() {
        let bitmap = RgbaBitmap::filled(8, 8, 40);
        let grid = CollisionGrid::build(&bitmap, bounds(), &TerrainTuning::default());
        assert!(grid.is_solid(50.0, 50.0));
    }

    #[test]
    fn test_wide_bitmap_downsampled_preserving_aspect() {
        let bitmap = RgbaBitmap::filled(1024, 512, 255);
        let grid = CollisionGrid::build(&bitmap, bounds(), &TerrainTuning::default());
        assert_eq!(grid.dimensions(), (256, 128));
    }

    #[test]
    fn test_half_solid_bitmap() {
        // Bottom half opaque (ground)
        let bitmap = RgbaBitmap::from_fn(64, 64, |_, y| if y >= 32 { 255 } else { 0 });
        let grid = CollisionGrid::build(&bitmap, bounds(), &TerrainTuning::default());
        assert!(!grid.is_solid(50.0, 25.0));
        assert!(grid.is_solid(50.0, 75.0));
    }

    #[test]
    fn test_zero_size_source_degrades() {
        let bitmap = RgbaBitmap::filled(0, 0, 255);
        let grid = CollisionGrid::build(&bitmap, bounds(), &TerrainTuning::default());
        assert!(grid.is_empty());
        assert!(!grid.is_solid(50.0, 50.0));
    }

    #[test]
    fn test_missing_raster_target_degrades() {
        let grid = CollisionGrid::build(&NoCanvas, bounds(), &TerrainTuning::default());
        assert!(grid.is_empty());
        assert_eq!(grid.dimensions(), (0, 0));
        assert!(!grid.is_solid(10.0, 10.0));
    }

    #[test]
    fn test_update_bounds_remaps_without_rebuild() {
        let bitmap = RgbaBitmap::from_fn(64, 64, |x, _| if x < 32 { 255 } else { 0 });
        let mut grid = CollisionGrid::build(&bitmap, bounds(), &TerrainTuning::default());
        assert!(grid.is_solid(25.0, 50.0));
        assert!(!grid.is_solid(150.0, 50.0));

        grid.update_bounds(WorldRect::new(0.0, 0.0, 400.0, 100.0));
        assert_eq!(grid.dimensions(), (64, 64));
        assert!(grid.is_solid(150.0, 50.0));
        assert!(!grid.is_solid(250.0, 50.0));
    }

    #[test]
    fn test_rgba_length_mismatch_rejected() {
        assert!(RgbaBitmap::from_rgba(4, 4, vec![0; 10]).is_none());
        assert!(RgbaBitmap::from_rgba(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn test_oversized_bitmap_rejected() {
        // Byte length would overflow usize
        assert!(RgbaBitmap::from_rgba(1 << 31, 1 << 31, vec![]).is_none());
        assert!(RgbaBitmap::from_rgba(u32::MAX, u32::MAX, vec![]).is_none());

        let bitmap = RgbaBitmap::filled(u32::MAX, u32::MAX, 255);
        assert_eq!(bitmap.dimensions(), (0, 0));
        let bitmap = RgbaBitmap::from_fn(u32::MAX, u32::MAX, |_, _| 255);
        assert_eq!(bitmap.dimensions(), (0, 0));

        let grid = CollisionGrid::build(&bitmap, bounds(), &TerrainTuning::default());
        assert!(grid.is_empty());
        assert!(!grid.is_solid(50.0, 50.0));
    }

    proptest! {
        #[test]
        fn prop_outside_bounds_never_solid(x in -1000.0f32..1000.0, y in -1000.0f32..1000.0) {
            let bitmap = RgbaBitmap::filled(16, 16, 255);
            let grid = CollisionGrid::build(&bitmap, bounds(), &TerrainTuning::default());
            let inside = (0.0..=100.0).contains(&x) && (0.0..=100.0).contains(&y);
            prop_assert_eq!(grid.is_solid(x, y), inside);
        }
    }
}
