//! Per-frame terrarium tick
//!
//! Order within a tick: reap spores that died last tick, update emitters and
//! collect their spawn requests, spawn, then step every spore (new ones
//! included) against the terrain and target list.

use glam::Vec2;

use super::spore::SporeContext;
use super::state::{Terrarium, TerrariumEvent};

/// Advance the terrarium by `dt_ms` milliseconds
///
/// Non-positive or non-finite steps are ignored.
pub fn tick(state: &mut Terrarium, dt_ms: f32) -> Vec<TerrariumEvent> {
    let mut events = Vec::new();
    if !dt_ms.is_finite() || dt_ms <= 0.0 {
        return events;
    }

    state.reap_dead_spores();
    state.time_ms += dt_ms as f64;
    state.tick_count += 1;

    // Emitters first; spawning is deferred until they're all done
    let mut requests: Vec<(u32, Vec2, u32)> = Vec::new();
    {
        let Terrarium {
            shrooms,
            tuning,
            rng,
            ..
        } = &mut *state;
        for shroom in shrooms.iter_mut() {
            shroom.update(dt_ms, &tuning.shrooms, rng, |s, count| {
                requests.push((s.id, s.pos, count))
            });
        }
    }

    for (shroom, origin, requested) in requests {
        let spawned = state.spawn_spores(origin, requested);
        events.push(TerrariumEvent::SporesReleased {
            shroom,
            requested,
            spawned,
        });
    }

    state.refresh_targets();

    let mut absorbed_by = Vec::new();
    {
        let Terrarium {
            terrain,
            spores,
            targets,
            tuning,
            rng,
            ..
        } = &mut *state;
        let ctx = SporeContext {
            terrain: &*terrain,
            targets: targets.as_slice(),
            tuning: &tuning.spores,
        };

        for spore in spores.iter_mut() {
            let was_dead = spore.dead;
            match spore.update(dt_ms, &ctx, rng) {
                Some(index) => {
                    let shroom = ctx.targets[index].id;
                    absorbed_by.push(shroom);
                    events.push(TerrariumEvent::SporeAbsorbed {
                        spore: spore.id,
                        shroom,
                    });
                }
                None if spore.dead && !was_dead => {
                    events.push(TerrariumEvent::SporeExpired { spore: spore.id });
                }
                None => {}
            }
        }
    }

    for id in absorbed_by {
        state.boost_shroom(id);
    }

    events
}
