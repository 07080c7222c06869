//! Shroom Terrarium - spore emitters steering through a terrain mask
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain grid, spores, shrooms, tick driver)
//! - `tuning`: Data-driven balance (forces, ranges, spawn tables)
//! - `platform`: Browser bindings (wasm32 only)

#[cfg(target_arch = "wasm32")]
pub mod platform;
pub mod sim;
pub mod tuning;

pub use sim::{CollisionGrid, Shroom, ShroomKind, Spore, Terrarium, TerrariumEvent, tick};
pub use tuning::{Tuning, TuningError};

use rand::Rng;

/// Simulation configuration constants
pub mod consts {
    /// Collision grids are never wider than this many cells
    pub const GRID_MAX_WIDTH: u32 = 256;
    /// Alpha above which a sampled cell counts as solid (catches anti-aliased edges)
    pub const SOLID_ALPHA_THRESHOLD: u8 = 10;

    /// Highest shroom level
    pub const MAX_LEVEL: u8 = 5;

    /// Reference frame step used by the native driver and tests (~60 Hz)
    pub const FRAME_MS: f32 = 16.0;
}

/// Uniform draw from `[min, max]`, collapsing to `min` for empty or inverted ranges
#[inline]
pub fn random_between(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..=max)
    } else {
        min
    }
}

/// Clamp an arbitrary level value into `[0, max_level]`
#[inline]
pub fn clamp_level(level: i32, max_level: u8) -> u8 {
    level.clamp(0, max_level as i32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_random_between_degenerate_range() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(random_between(&mut rng, 3.0, 3.0), 3.0);
        assert_eq!(random_between(&mut rng, 5.0, 2.0), 5.0);
        for _ in 0..100 {
            let v = random_between(&mut rng, -1.0, 1.0);
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_clamp_level() {
        assert_eq!(clamp_level(-4, 5), 0);
        assert_eq!(clamp_level(3, 5), 3);
        assert_eq!(clamp_level(99, 5), 5);
    }
}
