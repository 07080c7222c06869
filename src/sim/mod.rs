//! Deterministic terrarium simulation
//!
//! All spore and shroom logic lives here. This module must be pure and deterministic:
//! - Caller-driven ticks only (no timers, no threads)
//! - Seeded RNG only, threaded through every random draw
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod shroom;
pub mod spore;
pub mod state;
pub mod terrain;
pub mod tick;

pub use shroom::{
    PulsePhase, PulseState, Shroom, ShroomKind, ShroomSnapshot, ShroomVariant, pulse_envelope,
    update_base, update_pulsing, update_steady,
};
pub use spore::{Spore, SporeContext, SporeSnapshot, SporeTarget, Target};
pub use state::{Terrarium, TerrariumEvent, TerrariumSnapshot};
pub use terrain::{BitmapSource, CollisionGrid, RgbaBitmap, WorldRect};
pub use tick::tick;
