//! Shroom Terrarium headless driver
//!
//! Builds a small procedural terrarium, runs it at a fixed frame step and
//! logs what happened. Tuning JSON may be passed as the first argument.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;
    use shroom_terrarium::consts::FRAME_MS;
    use shroom_terrarium::sim::{RgbaBitmap, Terrarium, TerrariumEvent, WorldRect, tick};
    use shroom_terrarium::tuning::Tuning;

    env_logger::init();
    log::info!("Shroom terrarium (native) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => Tuning::from_json_or_default(&json),
            Err(err) => {
                log::warn!("Could not read tuning file {}: {}", path, err);
                Tuning::default()
            }
        },
        None => Tuning::default(),
    };

    let bounds = WorldRect::new(0.0, 0.0, 640.0, 360.0);
    let mut state = Terrarium::new(0x5eed, bounds, tuning);

    // Rolling soil line with a rock in the middle
    let soil = RgbaBitmap::from_fn(640, 360, |x, y| {
        let ground = 290.0 + 18.0 * (x as f32 * 0.02).sin();
        let rock = (x as f32 - 320.0).powi(2) + (y as f32 - 250.0).powi(2) < 40.0 * 40.0;
        if y as f32 >= ground || rock { 255 } else { 0 }
    });
    state.set_terrain(&soil);

    for (i, x) in [120.0, 260.0, 420.0, 540.0].into_iter().enumerate() {
        state.add_pulsing_shroom(Vec2::new(x, 270.0), i as i32 + 2);
    }
    for x in [60.0, 340.0, 600.0] {
        state.add_steady_shroom(Vec2::new(x, 120.0), 3);
    }

    let frames = 60 * 30;
    let (mut released, mut absorbed, mut expired) = (0u32, 0u32, 0u32);
    let mut peak = 0;

    for frame in 0..frames {
        for event in tick(&mut state, FRAME_MS) {
            match event {
                TerrariumEvent::SporesReleased { spawned, .. } => released += spawned,
                TerrariumEvent::SporeAbsorbed { .. } => absorbed += 1,
                TerrariumEvent::SporeExpired { .. } => expired += 1,
            }
        }
        peak = peak.max(state.live_spore_count());

        if frame % 600 == 0 {
            log::debug!(
                "t={:.1}s live={} released={} absorbed={}",
                state.time_ms / 1000.0,
                state.live_spore_count(),
                released,
                absorbed
            );
        }
    }

    log::info!(
        "{} frames: released={} absorbed={} expired={} peak_live={}",
        frames,
        released,
        absorbed,
        expired,
        peak
    );
    for shroom in &state.shrooms {
        log::info!(
            "shroom {} {:?} level {} intensity {:.2}",
            shroom.id,
            shroom.variant(),
            shroom.level(),
            shroom.intensity(&state.tuning.shrooms)
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::start, this is just to satisfy the compiler
}
