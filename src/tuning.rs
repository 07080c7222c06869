//! Data-driven terrarium balance
//!
//! Every design constant of the simulation lives here so it can be tweaked
//! from JSON without touching code. Missing fields fall back to defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors produced while loading or validating tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid range for {field}: min {min} > max {max}")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

/// Terrain rasterization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTuning {
    /// Maximum collision grid width in cells
    pub max_grid_width: u32,
    /// Sampled alpha must exceed this to be solid
    pub solid_alpha_threshold: u8,
}

impl Default for TerrainTuning {
    fn default() -> Self {
        Self {
            max_grid_width: GRID_MAX_WIDTH,
            solid_alpha_threshold: SOLID_ALPHA_THRESHOLD,
        }
    }
}

/// Spore physics and lifetime parameters
///
/// Forces are accelerations in px/s², multiplied by dt in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SporeTuning {
    pub life_min_ms: f32,
    pub life_max_ms: f32,
    pub size_min: f32,
    pub size_max: f32,
    /// Horizontal launch speed is drawn from ±this
    pub launch_spread_x: f32,
    /// Upward launch speed range (px/s)
    pub launch_up_min: f32,
    pub launch_up_max: f32,
    /// Horizontal offset from the emitter at spawn
    pub spawn_jitter: f32,
    /// Wander phase advance range (rad/s)
    pub wander_rate_min: f32,
    pub wander_rate_max: f32,
    pub wander_strength: f32,
    /// Y wobble runs at this multiple of the X wobble rate
    pub wander_y_ratio: f32,
    /// Constant pull toward the nearest target, independent of distance
    pub seek_strength: f32,
    pub gravity: f32,
    /// Per-tick velocity damping
    pub damping: f32,
    pub max_speed: f32,
    /// Velocity scale applied when bouncing off terrain
    pub bounce_damping: f32,
    /// Random velocity jitter (±) added on terrain bounce
    pub bounce_jitter: f32,
    /// Inward padding from the world edges
    pub edge_padding: f32,
    /// Velocity scale applied when reflecting off a world edge
    pub edge_bounce: f32,
    /// Hit radius as a fraction of target size
    pub hit_radius_factor: f32,
    pub fade_in_ms: f32,
    pub fade_out_ms: f32,
    /// Cap on live spores owned by the orchestrator
    pub max_live: usize,
}

impl Default for SporeTuning {
    fn default() -> Self {
        Self {
            life_min_ms: 4000.0,
            life_max_ms: 8000.0,
            size_min: 2.0,
            size_max: 4.0,
            launch_spread_x: 30.0,
            launch_up_min: 40.0,
            launch_up_max: 80.0,
            spawn_jitter: 6.0,
            wander_rate_min: 1.5,
            wander_rate_max: 3.0,
            wander_strength: 40.0,
            wander_y_ratio: 1.3,
            seek_strength: 60.0,
            gravity: 15.0,
            damping: 0.98,
            max_speed: 120.0,
            bounce_damping: 0.5,
            bounce_jitter: 10.0,
            edge_padding: 4.0,
            edge_bounce: 0.5,
            hit_radius_factor: 0.6,
            fade_in_ms: 300.0,
            fade_out_ms: 1000.0,
            max_live: 400,
        }
    }
}

/// Shroom glow, flicker and pulse parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShroomTuning {
    pub max_level: u8,
    /// Default shroom size (used as target size for hit tests)
    pub size: f32,
    /// Linear glow boost decay per millisecond
    pub glow_decay_per_ms: f32,
    /// Weight of glow boost in steady intensity
    pub glow_weight: f32,
    /// Flicker phase advance (rad/ms)
    pub flicker_rate: f32,
    pub flicker_amplitude: f32,
    /// Steady intensity = base + per_level * level
    pub steady_base: f32,
    pub steady_per_level: f32,
    pub intensity_min: f32,
    pub intensity_max: f32,
    pub pulse_interval_min_ms: f32,
    pub pulse_interval_max_ms: f32,
    pub pulse_duration_ms: f32,
    /// Fraction of the pulse spent rising to peak
    pub pulse_attack: f32,
    /// Pulse brightness ceiling = base + per_level * level
    pub pulse_ceiling_base: f32,
    pub pulse_ceiling_per_level: f32,
    /// Maximum spores released per pulse, indexed by level
    pub spawn_table: Vec<u32>,
}

impl Default for ShroomTuning {
    fn default() -> Self {
        Self {
            max_level: MAX_LEVEL,
            size: 24.0,
            glow_decay_per_ms: 0.002,
            glow_weight: 0.4,
            flicker_rate: 0.003,
            flicker_amplitude: 0.05,
            steady_base: 0.35,
            steady_per_level: 0.1,
            intensity_min: 0.0,
            intensity_max: 1.0,
            pulse_interval_min_ms: 3000.0,
            pulse_interval_max_ms: 7000.0,
            pulse_duration_ms: 1200.0,
            pulse_attack: 0.2,
            pulse_ceiling_base: 0.5,
            pulse_ceiling_per_level: 0.1,
            spawn_table: vec![0, 2, 3, 4, 5, 6],
        }
    }
}

impl ShroomTuning {
    /// Spawn cap for a level (0 for levels past the table)
    pub fn max_spores_for_level(&self, level: u8) -> u32 {
        self.spawn_table.get(level as usize).copied().unwrap_or(0)
    }

    /// Pulse brightness ceiling for a level
    pub fn pulse_ceiling(&self, level: u8) -> f32 {
        self.pulse_ceiling_base + self.pulse_ceiling_per_level * level as f32
    }
}

/// Complete terrarium tuning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub terrain: TerrainTuning,
    pub spores: SporeTuning,
    pub shrooms: ShroomTuning,
}

fn check_range(field: &'static str, min: f32, max: f32) -> Result<(), TuningError> {
    if min > max || !min.is_finite() || !max.is_finite() {
        return Err(TuningError::InvalidRange { field, min, max });
    }
    Ok(())
}

fn check(field: &'static str, ok: bool, reason: &'static str) -> Result<(), TuningError> {
    if ok {
        Ok(())
    } else {
        Err(TuningError::InvalidValue { field, reason })
    }
}

fn check_finite(fields: &[(&'static str, f32)]) -> Result<(), TuningError> {
    for &(field, value) in fields {
        check(field, value.is_finite(), "must be finite")?;
    }
    Ok(())
}

impl Tuning {
    /// Parse and validate tuning from JSON (missing fields use defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded terrarium tuning from JSON");
        Ok(tuning)
    }

    /// Parse tuning JSON, falling back to defaults on any error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::warn!("Using default tuning: {}", err);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every range is ordered and every factor is usable
    pub fn validate(&self) -> Result<(), TuningError> {
        let t = &self.terrain;
        check("terrain.max_grid_width", t.max_grid_width > 0, "must be positive")?;

        let s = &self.spores;
        check_finite(&[
            ("spores.launch_spread_x", s.launch_spread_x),
            ("spores.spawn_jitter", s.spawn_jitter),
            ("spores.wander_strength", s.wander_strength),
            ("spores.wander_y_ratio", s.wander_y_ratio),
            ("spores.seek_strength", s.seek_strength),
            ("spores.gravity", s.gravity),
            ("spores.max_speed", s.max_speed),
            ("spores.bounce_jitter", s.bounce_jitter),
            ("spores.edge_padding", s.edge_padding),
            ("spores.hit_radius_factor", s.hit_radius_factor),
            ("spores.fade_in_ms", s.fade_in_ms),
            ("spores.fade_out_ms", s.fade_out_ms),
        ])?;
        check_range("spores.life", s.life_min_ms, s.life_max_ms)?;
        check_range("spores.size", s.size_min, s.size_max)?;
        check_range("spores.launch_up", s.launch_up_min, s.launch_up_max)?;
        check_range("spores.wander_rate", s.wander_rate_min, s.wander_rate_max)?;
        check("spores.life_min_ms", s.life_min_ms > 0.0, "must be positive")?;
        check(
            "spores.damping",
            s.damping > 0.0 && s.damping < 1.0,
            "must be in (0, 1)",
        )?;
        check(
            "spores.bounce_damping",
            (0.0..1.0).contains(&s.bounce_damping),
            "must be in [0, 1)",
        )?;
        check(
            "spores.edge_bounce",
            (0.0..=1.0).contains(&s.edge_bounce),
            "must be in [0, 1]",
        )?;
        check("spores.max_speed", s.max_speed > 0.0, "must be positive")?;
        check("spores.edge_padding", s.edge_padding >= 0.0, "must be non-negative")?;

        let m = &self.shrooms;
        check_finite(&[
            ("shrooms.size", m.size),
            ("shrooms.glow_decay_per_ms", m.glow_decay_per_ms),
            ("shrooms.glow_weight", m.glow_weight),
            ("shrooms.flicker_rate", m.flicker_rate),
            ("shrooms.flicker_amplitude", m.flicker_amplitude),
            ("shrooms.steady_base", m.steady_base),
            ("shrooms.steady_per_level", m.steady_per_level),
            ("shrooms.pulse_duration_ms", m.pulse_duration_ms),
            ("shrooms.pulse_ceiling_base", m.pulse_ceiling_base),
            ("shrooms.pulse_ceiling_per_level", m.pulse_ceiling_per_level),
        ])?;
        check("shrooms.max_level", m.max_level > 0, "must be positive")?;
        check_range(
            "shrooms.pulse_interval",
            m.pulse_interval_min_ms,
            m.pulse_interval_max_ms,
        )?;
        check_range("shrooms.intensity", m.intensity_min, m.intensity_max)?;
        check(
            "shrooms.pulse_duration_ms",
            m.pulse_duration_ms > 0.0,
            "must be positive",
        )?;
        check(
            "shrooms.pulse_attack",
            m.pulse_attack > 0.0 && m.pulse_attack < 1.0,
            "must be in (0, 1)",
        )?;
        check(
            "shrooms.glow_decay_per_ms",
            m.glow_decay_per_ms >= 0.0,
            "must be non-negative",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "spores": { "gravity": 5.0 } }"#).unwrap();
        assert_eq!(tuning.spores.gravity, 5.0);
        assert_eq!(tuning.spores.damping, SporeTuning::default().damping);
        assert_eq!(tuning.shrooms, ShroomTuning::default());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let json = r#"{ "spores": { "life_min_ms": 9000.0, "life_max_ms": 100.0 } }"#;
        let err = Tuning::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            TuningError::InvalidRange {
                field: "spores.life",
                ..
            }
        ));
    }

    #[test]
    fn test_bad_factor_rejected() {
        let err = Tuning::from_json(r#"{ "spores": { "damping": 1.5 } }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::InvalidValue {
                field: "spores.damping",
                ..
            }
        ));
    }

    #[test]
    fn test_infinite_factor_rejected() {
        let mut tuning = Tuning::default();
        tuning.shrooms.flicker_rate = f32::INFINITY;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::InvalidValue {
                field: "shrooms.flicker_rate",
                reason: "must be finite"
            })
        ));

        // f32 overflow in JSON lands on infinity too
        let tuning = Tuning::from_json_or_default(r#"{ "spores": { "gravity": 1e39 } }"#);
        assert_eq!(tuning, Tuning::default());
    }

    #[test]
    fn test_bad_json_falls_back() {
        let tuning = Tuning::from_json_or_default("{ not json");
        assert_eq!(tuning, Tuning::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let tuning = Tuning::default();
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_spawn_table_lookup() {
        let shrooms = ShroomTuning {
            spawn_table: vec![0, 1, 2, 3, 4],
            ..Default::default()
        };
        assert_eq!(shrooms.max_spores_for_level(3), 3);
        assert_eq!(shrooms.max_spores_for_level(0), 0);
        assert_eq!(shrooms.max_spores_for_level(9), 0);
    }
}
