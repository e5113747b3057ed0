use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use crate::carousel::Carousel;
use crate::config::{CarouselConfig, Preset};
use crate::display_item::{load_items, StaticProvider};
use crate::frame::FrameClock;

/// Floats per item in the packed frame buffer:
/// `[original_index, resolved_x, scale, opacity, brightness, grayscale, z_order]`.
pub const PACKED_STRIDE: usize = 7;

#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Names accepted by `WasmCarousel::new`.
#[wasm_bindgen]
pub fn preset_names() -> Vec<String> {
    Preset::ALL.iter().map(|p| p.name().to_string()).collect()
}

/// Stride of the buffer returned by `frame`/`step`.
#[wasm_bindgen]
pub fn packed_stride() -> usize {
    PACKED_STRIDE
}

/// One carousel owned by a page section. Freeing it (or letting the JS
/// wrapper be collected) tears the carousel down; the host must also cancel
/// its animation-frame loop.
#[wasm_bindgen]
pub struct WasmCarousel {
    inner: Rc<RefCell<Carousel>>,
    clock: FrameClock,
}

#[wasm_bindgen]
impl WasmCarousel {
    /// Create a carousel from a preset name (`city-hubs`, `mentors`, ...).
    #[wasm_bindgen(constructor)]
    pub fn new(preset: &str) -> Result<WasmCarousel, JsError> {
        let preset: Preset = preset.parse().map_err(|e: String| JsError::new(&e))?;
        Self::with_config(preset.config())
    }

    /// Create a carousel from a JSON config (optionally naming a `preset`).
    pub fn from_config_json(json: &str) -> Result<WasmCarousel, JsError> {
        let config = CarouselConfig::from_json_str(json).map_err(|e| JsError::new(&format!("{:#}", e)))?;
        Self::with_config(config)
    }

    fn with_config(config: CarouselConfig) -> Result<WasmCarousel, JsError> {
        let carousel = Carousel::new(config).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self {
            inner: Rc::new(RefCell::new(carousel)),
            clock: FrameClock::new(),
        })
    }

    /// Replace the dataset with raw backend records (JSON array or `{ data }`).
    /// Malformed input degrades to an empty carousel. Returns the item count.
    pub fn set_items_json(&self, json: &str) -> usize {
        let items = match StaticProvider::from_json_str(json) {
            Ok(provider) => load_items(&provider),
            Err(e) => {
                log::error!("Failed to parse display items: {:#}", e);
                Vec::new()
            }
        };
        let count = items.len();
        self.inner.borrow_mut().set_items(items);
        count
    }

    pub fn item_count(&self) -> usize {
        self.inner.borrow().items().len()
    }

    /// Step using a `requestAnimationFrame` timestamp.
    pub fn frame(&mut self, timestamp_ms: f64) -> Vec<f32> {
        let elapsed = self.clock.tick(timestamp_ms);
        self.step(elapsed)
    }

    /// Step by an explicit elapsed time and return the packed states.
    pub fn step(&self, elapsed_ms: f32) -> Vec<f32> {
        let mut carousel = self.inner.borrow_mut();
        let states = carousel.step(elapsed_ms);
        let mut packed = Vec::with_capacity(states.len() * PACKED_STRIDE);
        for s in states {
            packed.extend_from_slice(&[
                s.original_index as f32,
                s.resolved_x,
                s.scale,
                s.opacity,
                s.brightness,
                s.grayscale,
                s.z_order as f32,
            ]);
        }
        packed
    }

    /// Last frame's states as JSON, for debugging.
    pub fn states_json(&self) -> String {
        serde_json::to_string(self.inner.borrow().visual_states()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Label, image and text of an item as JSON, or `null`.
    pub fn item_json(&self, original_index: usize) -> String {
        let carousel = self.inner.borrow();
        match carousel.item(original_index) {
            Some(item) => serde_json::to_string(item).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    pub fn pause(&self) {
        self.inner.borrow_mut().pause();
    }

    pub fn resume(&self) {
        self.inner.borrow_mut().resume();
    }

    pub fn set_hovered(&self, hovered: bool) {
        self.inner.borrow_mut().set_hovered(hovered);
    }

    pub fn is_paused(&self) -> bool {
        self.inner.borrow().is_paused()
    }

    pub fn set_offset(&self, offset: f64) {
        self.inner.borrow_mut().set_raw_offset(offset);
    }

    pub fn raw_offset(&self) -> f64 {
        self.inner.borrow().scroll_state().raw_offset
    }

    pub fn smoothed_offset(&self) -> f64 {
        self.inner.borrow().scroll_state().smoothed_offset
    }

    /// Call when the page becomes visible again so the hidden interval is not
    /// reported as one long frame.
    pub fn reset_clock(&mut self) {
        self.clock.reset();
    }
}
