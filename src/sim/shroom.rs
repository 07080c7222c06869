//! Shroom emitters
//!
//! A shroom is a stationary, leveled entity with a decaying glow boost and a
//! flicker oscillator. Steady shrooms only glow. Pulsing shrooms run a small
//! Idle/Pulsing state machine and ask their owner to release spores each time
//! a pulse starts; they never construct spores themselves.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::spore::SporeTarget;
use crate::tuning::ShroomTuning;
use crate::{clamp_level, random_between};

/// Phase of a pulsing shroom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PulsePhase {
    Idle,
    /// Progress runs 0 → 1 over the pulse duration
    Pulsing { progress: f32 },
}

/// Timer state carried only by pulsing shrooms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseState {
    pub time_since_last_pulse_ms: f32,
    pub next_pulse_interval_ms: f32,
    pub phase: PulsePhase,
}

impl PulseState {
    pub fn new(tuning: &ShroomTuning, rng: &mut impl Rng) -> Self {
        Self {
            time_since_last_pulse_ms: 0.0,
            next_pulse_interval_ms: draw_interval(tuning, rng),
            phase: PulsePhase::Idle,
        }
    }

    pub fn is_pulsing(&self) -> bool {
        matches!(self.phase, PulsePhase::Pulsing { .. })
    }

    /// Pulse progress in [0, 1] (0 while idle)
    pub fn progress(&self) -> f32 {
        match self.phase {
            PulsePhase::Idle => 0.0,
            PulsePhase::Pulsing { progress } => progress,
        }
    }
}

fn draw_interval(tuning: &ShroomTuning, rng: &mut impl Rng) -> f32 {
    random_between(
        rng,
        tuning.pulse_interval_min_ms,
        tuning.pulse_interval_max_ms,
    )
}

/// Emitter variant plus its variant-only state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShroomKind {
    /// Glows passively ("phi")
    Steady,
    /// Pulses and releases spores ("psi")
    Pulsing(PulseState),
}

/// Variant tag without state, for snapshots and bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShroomVariant {
    Steady,
    Pulsing,
}

/// Per-frame render data for one shroom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShroomSnapshot {
    pub id: u32,
    pub pos: Vec2,
    pub level: u8,
    pub variant: ShroomVariant,
    pub intensity: f32,
    pub is_pulsing: bool,
    pub pulse_progress: f32,
}

/// A stationary emitter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shroom {
    pub id: u32,
    pub pos: Vec2,
    /// Target size for spore hit tests
    pub size: f32,
    /// Always within [0, max_level]
    level: u8,
    /// Transient brightness bonus in [0, 1]
    pub glow_boost: f32,
    pub flicker_phase: f32,
    pub kind: ShroomKind,
}

impl Shroom {
    pub fn steady(id: u32, pos: Vec2, level: i32, tuning: &ShroomTuning) -> Self {
        Self {
            id,
            pos,
            size: tuning.size,
            level: clamp_level(level, tuning.max_level),
            glow_boost: 0.0,
            flicker_phase: 0.0,
            kind: ShroomKind::Steady,
        }
    }

    pub fn pulsing(
        id: u32,
        pos: Vec2,
        level: i32,
        tuning: &ShroomTuning,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            kind: ShroomKind::Pulsing(PulseState::new(tuning, rng)),
            ..Self::steady(id, pos, level, tuning)
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Assign a level, clamping malformed values
    pub fn set_level(&mut self, level: i32, tuning: &ShroomTuning) {
        self.level = clamp_level(level, tuning.max_level);
    }

    pub fn variant(&self) -> ShroomVariant {
        match self.kind {
            ShroomKind::Steady => ShroomVariant::Steady,
            ShroomKind::Pulsing(_) => ShroomVariant::Pulsing,
        }
    }

    pub fn pulse(&self) -> Option<&PulseState> {
        match &self.kind {
            ShroomKind::Steady => None,
            ShroomKind::Pulsing(pulse) => Some(pulse),
        }
    }

    /// External hit notification: glow at full boost
    pub fn apply_hit_boost(&mut self) {
        self.glow_boost = 1.0;
    }

    /// Advance one step, dispatching on the variant
    pub fn update(
        &mut self,
        dt_ms: f32,
        tuning: &ShroomTuning,
        rng: &mut impl Rng,
        spawn: impl FnMut(&Shroom, u32),
    ) {
        match self.variant() {
            ShroomVariant::Steady => update_steady(self, dt_ms, tuning),
            ShroomVariant::Pulsing => update_pulsing(self, dt_ms, tuning, rng, spawn),
        }
    }

    /// Current brightness for the renderer
    pub fn intensity(&self, tuning: &ShroomTuning) -> f32 {
        let value = match &self.kind {
            ShroomKind::Steady => {
                let base = tuning.steady_base + tuning.steady_per_level * self.level as f32;
                let flicker = self.flicker_phase.sin() * tuning.flicker_amplitude;
                base + flicker + self.glow_boost * tuning.glow_weight
            }
            ShroomKind::Pulsing(pulse) => {
                let envelope = match pulse.phase {
                    PulsePhase::Idle => 0.0,
                    PulsePhase::Pulsing { progress } => {
                        pulse_envelope(progress, tuning.pulse_attack)
                    }
                };
                (envelope * tuning.pulse_ceiling(self.level)).max(self.glow_boost)
            }
        };
        value.clamp(tuning.intensity_min, tuning.intensity_max)
    }

    /// This shroom as a spore target
    pub fn as_target(&self) -> SporeTarget {
        SporeTarget {
            id: self.id,
            pos: self.pos,
            size: self.size,
            alive: true,
        }
    }

    pub fn snapshot(&self, tuning: &ShroomTuning) -> ShroomSnapshot {
        let (is_pulsing, pulse_progress) = self
            .pulse()
            .map(|p| (p.is_pulsing(), p.progress()))
            .unwrap_or((false, 0.0));
        ShroomSnapshot {
            id: self.id,
            pos: self.pos,
            level: self.level,
            variant: self.variant(),
            intensity: self.intensity(tuning),
            is_pulsing,
            pulse_progress,
        }
    }
}

/// Quick attack, slow release: 0 → 1 over `attack`, then back to 0
pub fn pulse_envelope(progress: f32, attack: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    if p < attack {
        p / attack
    } else {
        ((1.0 - p) / (1.0 - attack)).max(0.0)
    }
}

/// Shared per-tick work: glow decay and flicker
pub fn update_base(shroom: &mut Shroom, dt_ms: f32, tuning: &ShroomTuning) {
    if shroom.glow_boost > 0.0 {
        shroom.glow_boost = (shroom.glow_boost - tuning.glow_decay_per_ms * dt_ms).max(0.0);
    }
    shroom.flicker_phase =
        (shroom.flicker_phase + tuning.flicker_rate * dt_ms) % std::f32::consts::TAU;
}

pub fn update_steady(shroom: &mut Shroom, dt_ms: f32, tuning: &ShroomTuning) {
    update_base(shroom, dt_ms, tuning);
}

/// Run the pulse state machine, calling `spawn(shroom, count)` when a pulse starts
pub fn update_pulsing(
    shroom: &mut Shroom,
    dt_ms: f32,
    tuning: &ShroomTuning,
    rng: &mut impl Rng,
    mut spawn: impl FnMut(&Shroom, u32),
) {
    update_base(shroom, dt_ms, tuning);

    let ShroomKind::Pulsing(pulse) = &mut shroom.kind else {
        return;
    };

    let mut started = false;
    match pulse.phase {
        PulsePhase::Idle => {
            pulse.time_since_last_pulse_ms += dt_ms;
            if pulse.time_since_last_pulse_ms >= pulse.next_pulse_interval_ms {
                pulse.phase = PulsePhase::Pulsing { progress: 0.0 };
                started = true;
            }
        }
        PulsePhase::Pulsing { progress } => {
            let step = if tuning.pulse_duration_ms > 0.0 {
                dt_ms / tuning.pulse_duration_ms
            } else {
                1.0
            };
            let progress = progress + step;
            if progress >= 1.0 {
                pulse.phase = PulsePhase::Idle;
                pulse.time_since_last_pulse_ms = 0.0;
                pulse.next_pulse_interval_ms = draw_interval(tuning, rng);
            } else {
                pulse.phase = PulsePhase::Pulsing { progress };
            }
        }
    }

    if started && shroom.level > 0 {
        let max = tuning.max_spores_for_level(shroom.level);
        let count = rng.random_range(0..=max);
        spawn(&*shroom, count);
    }
}
