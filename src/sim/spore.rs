//! Spore particles
//!
//! Spores are released by pulsing shrooms. Each tick they wander, drift toward
//! the nearest live target, sink under gravity, bounce off solid terrain and
//! either get absorbed by a target or expire. Removal from the live set is
//! left to whoever owns the spore list.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::terrain::{CollisionGrid, WorldRect};
use crate::random_between;
use crate::tuning::SporeTuning;

/// Anything a spore can seek toward and be absorbed by
pub trait Target {
    fn position(&self) -> Vec2;
    fn size(&self) -> f32;
    fn is_alive(&self) -> bool;
}

/// Plain target record, rebuilt by the orchestrator each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SporeTarget {
    /// Id of the entity this target stands for
    pub id: u32,
    pub pos: Vec2,
    pub size: f32,
    pub alive: bool,
}

impl Target for SporeTarget {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> f32 {
        self.size
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Read-only world a spore steps against
pub struct SporeContext<'a, T: Target> {
    pub terrain: &'a CollisionGrid,
    pub targets: &'a [T],
    pub tuning: &'a SporeTuning,
}

/// Per-frame render data for one spore
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SporeSnapshot {
    pub id: u32,
    pub pos: Vec2,
    pub size: f32,
    pub opacity: f32,
}

/// A mobile spore particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spore {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Milliseconds alive
    pub age_ms: f32,
    pub life_span_ms: f32,
    /// Radius-like size for rendering
    pub size: f32,
    pub wander_phase: f32,
    /// Set once expired or absorbed
    pub dead: bool,
}

impl Spore {
    /// Launch a spore upward from an emitter at `origin`
    pub fn spawn(id: u32, origin: Vec2, tuning: &SporeTuning, rng: &mut impl Rng) -> Self {
        let offset = random_between(rng, -tuning.spawn_jitter, tuning.spawn_jitter);
        let vx = random_between(rng, -tuning.launch_spread_x, tuning.launch_spread_x);
        let vy = -random_between(rng, tuning.launch_up_min, tuning.launch_up_max);

        Self {
            id,
            pos: origin + Vec2::new(offset, 0.0),
            vel: Vec2::new(vx, vy),
            age_ms: 0.0,
            life_span_ms: random_between(rng, tuning.life_min_ms, tuning.life_max_ms),
            size: random_between(rng, tuning.size_min, tuning.size_max),
            wander_phase: random_between(rng, 0.0, std::f32::consts::TAU),
            dead: false,
        }
    }

    /// Advance one step. Returns the index of the target struck this tick, if any.
    pub fn update<T: Target>(
        &mut self,
        dt_ms: f32,
        ctx: &SporeContext<'_, T>,
        rng: &mut impl Rng,
    ) -> Option<usize> {
        if self.dead {
            return None;
        }

        self.age_ms += dt_ms;
        if self.age_ms >= self.life_span_ms {
            self.dead = true;
            return None;
        }

        let tuning = ctx.tuning;
        let dt = dt_ms / 1000.0;

        // Decorrelated X/Y wobble
        let wander_rate = random_between(rng, tuning.wander_rate_min, tuning.wander_rate_max);
        self.wander_phase += wander_rate * dt;
        let wander = Vec2::new(
            self.wander_phase.sin(),
            (self.wander_phase * tuning.wander_y_ratio).cos(),
        ) * tuning.wander_strength;

        // Constant pull, independent of distance
        let seek = self
            .nearest_target(ctx.targets)
            .map(|target| (target - self.pos).normalize_or_zero() * tuning.seek_strength)
            .unwrap_or(Vec2::ZERO);

        let gravity = Vec2::new(0.0, tuning.gravity);

        self.vel += (wander + seek + gravity) * dt;
        self.vel *= tuning.damping;
        self.vel = self.vel.clamp_length_max(tuning.max_speed);

        let predicted = self.pos + self.vel * dt;
        if ctx.terrain.is_solid_at(predicted) {
            let jitter = Vec2::new(
                random_between(rng, -tuning.bounce_jitter, tuning.bounce_jitter),
                random_between(rng, -tuning.bounce_jitter, tuning.bounce_jitter),
            );
            self.vel = -self.vel * tuning.bounce_damping + jitter;
        } else {
            self.pos = predicted;
        }

        self.clamp_to_bounds(ctx.terrain.bounds(), tuning);

        for (index, target) in ctx.targets.iter().enumerate() {
            if !target.is_alive() {
                continue;
            }
            let hit_radius = target.size() * tuning.hit_radius_factor;
            if self.pos.distance(target.position()) <= hit_radius {
                self.dead = true;
                return Some(index);
            }
        }

        None
    }

    /// Position of the closest live target
    fn nearest_target<T: Target>(&self, targets: &[T]) -> Option<Vec2> {
        targets
            .iter()
            .filter(|t| t.is_alive())
            .map(|t| t.position())
            .filter(|p| p.is_finite())
            .min_by(|a, b| {
                a.distance_squared(self.pos)
                    .partial_cmp(&b.distance_squared(self.pos))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Keep the spore inside the padded world, reflecting velocity at the edges
    fn clamp_to_bounds(&mut self, bounds: WorldRect, tuning: &SporeTuning) {
        if !self.pos.is_finite() || !self.vel.is_finite() {
            self.pos = Vec2::new(
                bounds.left + bounds.width * 0.5,
                bounds.top + bounds.height * 0.5,
            );
            self.vel = Vec2::ZERO;
        }

        let (min_x, max_x) = padded_span(bounds.left, bounds.right(), tuning.edge_padding);
        let (min_y, max_y) = padded_span(bounds.top, bounds.bottom(), tuning.edge_padding);

        if self.pos.x < min_x {
            self.pos.x = min_x;
            self.vel.x = self.vel.x.abs() * tuning.edge_bounce;
        } else if self.pos.x > max_x {
            self.pos.x = max_x;
            self.vel.x = -self.vel.x.abs() * tuning.edge_bounce;
        }

        if self.pos.y < min_y {
            self.pos.y = min_y;
            self.vel.y = self.vel.y.abs() * tuning.edge_bounce;
        } else if self.pos.y > max_y {
            self.pos.y = max_y;
            self.vel.y = -self.vel.y.abs() * tuning.edge_bounce;
        }
    }

    /// Render opacity: fade in after spawn, fade out before expiry
    pub fn opacity(&self, tuning: &SporeTuning) -> f32 {
        if self.dead {
            return 0.0;
        }
        let fade_in = if tuning.fade_in_ms > 0.0 {
            (self.age_ms / tuning.fade_in_ms).min(1.0)
        } else {
            1.0
        };
        let fade_out = if tuning.fade_out_ms > 0.0 {
            ((self.life_span_ms - self.age_ms) / tuning.fade_out_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };
        fade_in.min(fade_out)
    }

    pub fn snapshot(&self, tuning: &SporeTuning) -> SporeSnapshot {
        SporeSnapshot {
            id: self.id,
            pos: self.pos,
            size: self.size,
            opacity: self.opacity(tuning),
        }
    }
}

/// Padded [min, max] span; collapses to the midpoint if padding swallows it
fn padded_span(min: f32, max: f32, padding: f32) -> (f32, f32) {
    let lo = min + padding;
    let hi = max - padding;
    if lo <= hi {
        (lo, hi)
    } else {
        let mid = (min + max) * 0.5;
        (mid, mid)
    }
}
