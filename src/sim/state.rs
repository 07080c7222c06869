//! Terrarium state and render snapshots
//!
//! The terrarium owns everything the entities themselves don't: the seeded
//! RNG, the live spore list, the target list and entity ids.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::shroom::{Shroom, ShroomSnapshot};
use super::spore::{Spore, SporeSnapshot, SporeTarget};
use super::terrain::{BitmapSource, CollisionGrid, WorldRect};
use crate::random_between;
use crate::tuning::Tuning;

/// Something the presentation layer may want to react to (audio, achievements)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TerrariumEvent {
    /// A pulsing shroom started a pulse
    SporesReleased {
        shroom: u32,
        requested: u32,
        spawned: u32,
    },
    /// A spore was absorbed by a shroom
    SporeAbsorbed { spore: u32, shroom: u32 },
    /// A spore ran out of life
    SporeExpired { spore: u32 },
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrariumSnapshot {
    pub time_ms: f64,
    pub bounds: WorldRect,
    pub shrooms: Vec<ShroomSnapshot>,
    pub spores: Vec<SporeSnapshot>,
}

/// Complete terrarium state (deterministic for a given seed and tick sequence)
#[derive(Debug, Clone)]
pub struct Terrarium {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub terrain: CollisionGrid,
    /// Emitters, in insertion (id) order
    pub shrooms: Vec<Shroom>,
    /// Live spores, in spawn (id) order
    pub spores: Vec<Spore>,
    /// Spore targets, rebuilt from steady shrooms every tick
    pub targets: Vec<SporeTarget>,
    /// Simulated time
    pub time_ms: f64,
    pub tick_count: u64,
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl Terrarium {
    /// Empty terrarium with a never-solid terrain covering `bounds`
    pub fn new(seed: u64, bounds: WorldRect, tuning: Tuning) -> Self {
        Self {
            seed,
            tuning,
            terrain: CollisionGrid::empty(bounds),
            shrooms: Vec::new(),
            spores: Vec::new(),
            targets: Vec::new(),
            time_ms: 0.0,
            tick_count: 0,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID (wraps back to 1 after `u32::MAX`)
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Rasterize a terrain bitmap over the current bounds
    pub fn set_terrain<B: BitmapSource + ?Sized>(&mut self, source: &B) {
        self.terrain.rebuild(source, &self.tuning.terrain);
    }

    /// Drop the terrain mask; nothing blocks spores afterwards
    pub fn clear_terrain(&mut self) {
        self.terrain = CollisionGrid::empty(self.terrain.bounds());
    }

    /// Viewport reflow: remap the existing grid onto new bounds
    pub fn resize(&mut self, bounds: WorldRect) {
        self.terrain.update_bounds(bounds);
    }

    pub fn bounds(&self) -> WorldRect {
        self.terrain.bounds()
    }

    pub fn add_steady_shroom(&mut self, pos: Vec2, level: i32) -> u32 {
        let id = self.next_entity_id();
        let mut shroom = Shroom::steady(id, pos, level, &self.tuning.shrooms);
        self.desync_flicker(&mut shroom);
        self.shrooms.push(shroom);
        self.refresh_targets();
        id
    }

    pub fn add_pulsing_shroom(&mut self, pos: Vec2, level: i32) -> u32 {
        let id = self.next_entity_id();
        let mut shroom = Shroom::pulsing(id, pos, level, &self.tuning.shrooms, &mut self.rng);
        self.desync_flicker(&mut shroom);
        self.shrooms.push(shroom);
        id
    }

    fn desync_flicker(&mut self, shroom: &mut Shroom) {
        shroom.flicker_phase = random_between(&mut self.rng, 0.0, std::f32::consts::TAU);
    }

    pub fn shroom(&self, id: u32) -> Option<&Shroom> {
        self.shrooms.iter().find(|s| s.id == id)
    }

    pub fn shroom_mut(&mut self, id: u32) -> Option<&mut Shroom> {
        self.shrooms.iter_mut().find(|s| s.id == id)
    }

    /// Change a shroom's level (clamped). Returns false for unknown ids.
    pub fn set_shroom_level(&mut self, id: u32, level: i32) -> bool {
        let tuning = &self.tuning.shrooms;
        match self.shrooms.iter_mut().find(|s| s.id == id) {
            Some(shroom) => {
                shroom.set_level(level, tuning);
                true
            }
            None => false,
        }
    }

    /// Forward an external hit notification. Returns false for unknown ids.
    pub fn boost_shroom(&mut self, id: u32) -> bool {
        match self.shroom_mut(id) {
            Some(shroom) => {
                shroom.apply_hit_boost();
                true
            }
            None => false,
        }
    }

    /// Spawn up to `count` spores at `origin`, respecting the live cap
    pub fn spawn_spores(&mut self, origin: Vec2, count: u32) -> u32 {
        let room = self.tuning.spores.max_live.saturating_sub(self.spores.len());
        let n = (count as usize).min(room);
        if n < count as usize {
            log::debug!("Spore cap reached: spawning {} of {}", n, count);
        }

        for _ in 0..n {
            let id = self.next_entity_id();
            let spore = Spore::spawn(id, origin, &self.tuning.spores, &mut self.rng);
            self.spores.push(spore);
        }
        n as u32
    }

    /// Rebuild the target list from steady shrooms
    pub fn refresh_targets(&mut self) {
        self.targets.clear();
        self.targets.extend(
            self.shrooms
                .iter()
                .filter(|s| s.pulse().is_none())
                .map(Shroom::as_target),
        );
    }

    /// Remove spores that were marked dead
    pub fn reap_dead_spores(&mut self) -> usize {
        let before = self.spores.len();
        self.spores.retain(|s| !s.dead);
        before - self.spores.len()
    }

    pub fn live_spore_count(&self) -> usize {
        self.spores.iter().filter(|s| !s.dead).count()
    }

    pub fn snapshot(&self) -> TerrariumSnapshot {
        TerrariumSnapshot {
            time_ms: self.time_ms,
            bounds: self.bounds(),
            shrooms: self
                .shrooms
                .iter()
                .map(|s| s.snapshot(&self.tuning.shrooms))
                .collect(),
            spores: self
                .spores
                .iter()
                .filter(|s| !s.dead)
                .map(|s| s.snapshot(&self.tuning.spores))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::terrain::RgbaBitmap;

    fn world() -> WorldRect {
        WorldRect::new(0.0, 0.0, 320.0, 240.0)
    }

    #[test]
    fn test_entity_ids_are_unique() {
        let mut state = Terrarium::new(1, world(), Tuning::default());
        let a = state.add_steady_shroom(Vec2::new(10.0, 10.0), 1);
        let b = state.add_pulsing_shroom(Vec2::new(20.0, 10.0), 2);
        state.spawn_spores(Vec2::new(20.0, 10.0), 3);
        let mut ids: Vec<u32> = state.spores.iter().map(|s| s.id).collect();
        ids.push(a);
        ids.push(b);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_entity_ids_wrap_without_panicking() {
        let mut state = Terrarium::new(1, world(), Tuning::default());
        state.next_id = u32::MAX;
        assert_eq!(state.next_entity_id(), u32::MAX);
        assert_eq!(state.next_entity_id(), 1);
        assert_eq!(state.spawn_spores(Vec2::new(50.0, 50.0), 2), 2);
        assert_eq!(state.spores[1].id, 3);
    }

    #[test]
    fn test_targets_are_steady_shrooms() {
        let mut state = Terrarium::new(1, world(), Tuning::default());
        let steady = state.add_steady_shroom(Vec2::new(10.0, 10.0), 1);
        state.add_pulsing_shroom(Vec2::new(20.0, 10.0), 2);
        state.refresh_targets();
        assert_eq!(state.targets.len(), 1);
        assert_eq!(state.targets[0].id, steady);
    }

    #[test]
    fn test_spawn_respects_cap() {
        let mut tuning = Tuning::default();
        tuning.spores.max_live = 5;
        let mut state = Terrarium::new(1, world(), tuning);

        assert_eq!(state.spawn_spores(Vec2::new(50.0, 50.0), 3), 3);
        assert_eq!(state.spawn_spores(Vec2::new(50.0, 50.0), 3), 2);
        assert_eq!(state.spawn_spores(Vec2::new(50.0, 50.0), 3), 0);
        assert_eq!(state.spores.len(), 5);
    }

    #[test]
    fn test_level_changes_are_clamped() {
        let mut state = Terrarium::new(1, world(), Tuning::default());
        let id = state.add_pulsing_shroom(Vec2::ZERO, 3);
        assert!(state.set_shroom_level(id, 100));
        assert_eq!(state.shroom(id).unwrap().level(), state.tuning.shrooms.max_level);
        assert!(!state.set_shroom_level(999, 1));
        assert!(!state.boost_shroom(999));
    }

    #[test]
    fn test_terrain_set_resize_clear() {
        let mut state = Terrarium::new(1, world(), Tuning::default());
        assert!(!state.terrain.is_solid(10.0, 10.0));

        state.set_terrain(&RgbaBitmap::filled(32, 24, 255));
        assert!(state.terrain.is_solid(10.0, 10.0));
        assert!(!state.terrain.is_solid(400.0, 10.0));

        state.resize(WorldRect::new(0.0, 0.0, 640.0, 480.0));
        assert!(state.terrain.is_solid(400.0, 10.0));

        state.clear_terrain();
        assert!(!state.terrain.is_solid(10.0, 10.0));
        assert_eq!(state.bounds().width, 640.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut state = Terrarium::new(7, world(), Tuning::default());
        state.add_steady_shroom(Vec2::new(10.0, 200.0), 2);
        state.add_pulsing_shroom(Vec2::new(100.0, 200.0), 3);
        state.spawn_spores(Vec2::new(100.0, 200.0), 2);
        state.spores[0].dead = true;

        let snapshot = state.snapshot();
        assert_eq!(snapshot.shrooms.len(), 2);
        assert_eq!(snapshot.spores.len(), 1);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"variant\":\"Pulsing\""));
    }
}
