//! Browser bindings
//!
//! Thin `wasm_bindgen` wrapper around [`Terrarium`] for the JS presentation
//! layer. Terrain arrives as raw `ImageData` bytes; snapshots and events leave
//! as JSON strings.

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::sim::{RgbaBitmap, Terrarium, WorldRect, tick};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        // Logger already installed by the host page
        return;
    }
    log::info!("Shroom terrarium loaded");
}

fn to_js(err: serde_json::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WebTerrarium {
    inner: Terrarium,
}

#[wasm_bindgen]
impl WebTerrarium {
    /// `tuning_json` may be omitted; invalid tuning falls back to defaults
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32, width: f32, height: f32, tuning_json: Option<String>) -> WebTerrarium {
        let tuning = tuning_json
            .as_deref()
            .map(Tuning::from_json_or_default)
            .unwrap_or_default();
        let bounds = WorldRect::new(0.0, 0.0, width, height);
        WebTerrarium {
            inner: Terrarium::new(seed as u64, bounds, tuning),
        }
    }

    /// Rasterize terrain from `ImageData` bytes. A malformed buffer disables terrain.
    pub fn set_terrain(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> bool {
        match RgbaBitmap::from_rgba(width, height, rgba) {
            Some(bitmap) => {
                self.inner.set_terrain(&bitmap);
                true
            }
            None => {
                log::warn!("Terrain buffer does not match {}x{} RGBA", width, height);
                self.inner.clear_terrain();
                false
            }
        }
    }

    pub fn resize(&mut self, left: f32, top: f32, width: f32, height: f32) {
        self.inner.resize(WorldRect::new(left, top, width, height));
    }

    pub fn add_shroom(&mut self, pulsing: bool, x: f32, y: f32, level: i32) -> u32 {
        let pos = Vec2::new(x, y);
        if pulsing {
            self.inner.add_pulsing_shroom(pos, level)
        } else {
            self.inner.add_steady_shroom(pos, level)
        }
    }

    pub fn set_shroom_level(&mut self, id: u32, level: i32) -> bool {
        self.inner.set_shroom_level(id, level)
    }

    pub fn boost_shroom(&mut self, id: u32) -> bool {
        self.inner.boost_shroom(id)
    }

    /// Advance one frame; returns the frame's events as JSON
    pub fn tick(&mut self, dt_ms: f32) -> Result<String, JsValue> {
        let events = tick(&mut self.inner, dt_ms);
        serde_json::to_string(&events).map_err(to_js)
    }

    /// Render snapshot as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.snapshot()).map_err(to_js)
    }

    pub fn spore_count(&self) -> u32 {
        self.inner.live_spore_count() as u32
    }
}
