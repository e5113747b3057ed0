//! The composed carousel engine.
//!
//! A [`Carousel`] owns everything that moves: the scroll driver, the offset
//! spring and one spring per visual property per slot. [`Carousel::step`] is
//! the only place that state changes, and it runs once per frame:
//!
//! 1. advance the raw offset (skipped while paused),
//! 2. smooth it,
//! 3. resolve every slot's x coordinate from the smoothed offset,
//! 4. map x to visual targets and smooth each target.

use std::rc::Rc;

use serde::Serialize;

use crate::config::{CarouselConfig, LayoutMode};
use crate::display_item::DisplayItem;
use crate::error::ConfigError;
use crate::falloff::VisualMapper;
use crate::frame_stats::FrameStats;
use crate::loop_buffer::LoopBuffer;
use crate::position::PositionResolver;
use crate::scroll_driver::{ScrollDriver, ScrollState};
use crate::spring::SpringSmoother;

/// What the render surface receives for one visible slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemVisualState {
    /// Slot on the ring (equals `original_index` in wrap layout).
    pub slot: usize,
    pub original_index: usize,
    pub resolved_x: f32,
    pub scale: f32,
    pub opacity: f32,
    pub brightness: f32,
    pub grayscale: f32,
    pub z_order: i32,
}

/// Smoothers for one slot's visual properties.
#[derive(Clone, Debug)]
struct SlotMotion {
    scale: SpringSmoother,
    opacity: SpringSmoother,
    brightness: SpringSmoother,
    grayscale: SpringSmoother,
}

impl SlotMotion {
    fn new(config: &CarouselConfig) -> Self {
        let springs = &config.springs;
        Self {
            scale: SpringSmoother::new(springs.scale),
            opacity: SpringSmoother::new(springs.opacity),
            brightness: SpringSmoother::new(springs.brightness),
            grayscale: SpringSmoother::new(springs.grayscale),
        }
    }
}

/// One auto-scrolling carousel.
#[derive(Debug)]
pub struct Carousel {
    config: CarouselConfig,
    items: Vec<Rc<DisplayItem>>,
    buffer: LoopBuffer,
    driver: ScrollDriver,
    /// Smoothed minus raw offset. Tracking the lag rather than the offset
    /// keeps the spring in small numbers however far the strip has travelled.
    offset_lag: SpringSmoother,
    /// `config.visuals` with the z-order rule fitted to the current ring.
    visuals: VisualMapper,
    motions: Vec<SlotMotion>,
    states: Vec<ItemVisualState>,
    paused: bool,
    hovered: bool,
    stats: FrameStats,
}

impl Carousel {
    /// Validate `config` and build an empty carousel.
    pub fn new(config: CarouselConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let driver = ScrollDriver::new(config.velocity, config.reference_frame_ms, config.elapsed_policy);
        let offset_lag = SpringSmoother::new(config.springs.offset);
        let visuals = config.visuals.clone();
        Ok(Self {
            config,
            items: Vec::new(),
            buffer: LoopBuffer::default(),
            driver,
            offset_lag,
            visuals,
            motions: Vec::new(),
            states: Vec::new(),
            paused: false,
            hovered: false,
            stats: FrameStats::new(),
        })
    }

    pub fn with_items(config: CarouselConfig, items: Vec<DisplayItem>) -> Result<Self, ConfigError> {
        let mut carousel = Self::new(config)?;
        carousel.set_items(items);
        Ok(carousel)
    }

    pub fn config(&self) -> &CarouselConfig {
        &self.config
    }

    /// Replace the dataset. The scroll position is kept; per-slot smoothers
    /// restart on their first target so the new cards appear in place.
    pub fn set_items(&mut self, items: Vec<DisplayItem>) {
        self.items = items.into_iter().map(Rc::new).collect();
        self.buffer = LoopBuffer::build(&self.items);
        let slots = self.slot_count();
        let mut visuals = self.config.visuals.clone();
        if let Some(resolver) = self.resolver() {
            visuals.z_order = visuals.z_order.spanning(resolver.modulus() * 0.5);
        }
        self.visuals = visuals;
        self.motions = (0..slots).map(|_| SlotMotion::new(&self.config)).collect();
        self.states.clear();
        self.states.reserve(slots);
        log::info!(
            "Carousel dataset set: {} items, {} slots ({:?} layout)",
            self.items.len(),
            slots,
            self.config.layout
        );
    }

    pub fn items(&self) -> &[Rc<DisplayItem>] {
        &self.items
    }

    pub fn item(&self, original_index: usize) -> Option<&DisplayItem> {
        self.items.get(original_index).map(|item| item.as_ref())
    }

    pub fn loop_buffer(&self) -> &LoopBuffer {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of slots on the ring for the current layout.
    pub fn slot_count(&self) -> usize {
        match self.config.layout {
            LayoutMode::Wrap => self.items.len(),
            LayoutMode::Marquee => self.buffer.len(),
        }
    }

    /// Resolver for the current ring, `None` while the dataset is empty.
    pub fn resolver(&self) -> Option<PositionResolver> {
        PositionResolver::new(self.config.geometry, self.slot_count())
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Report pointer hover. Pauses the strip when the config asks for it.
    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    pub fn is_paused(&self) -> bool {
        self.paused || (self.hovered && self.config.pause_on_hover)
    }

    /// Overwrite the raw offset. The smoothed offset follows through its spring.
    pub fn set_raw_offset(&mut self, offset: f64) {
        let before = self.driver.raw_offset();
        self.driver.set_raw_offset(offset);
        self.follow_raw(before);
    }

    /// Keep the smoothed offset in place while the raw offset moves away from
    /// `before`.
    fn follow_raw(&mut self, before: f64) {
        let moved = self.driver.raw_offset() - before;
        self.offset_lag.shift((-moved) as f32);
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.driver.set_velocity(velocity);
        self.config.velocity = self.driver.velocity();
    }

    pub fn scroll_state(&self) -> ScrollState {
        ScrollState {
            raw_offset: self.driver.raw_offset(),
            smoothed_offset: self.driver.raw_offset() + f64::from(self.offset_lag.value()),
        }
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// States computed by the last [`Carousel::step`].
    pub fn visual_states(&self) -> &[ItemVisualState] {
        &self.states
    }

    /// Run one frame and return the visible states.
    pub fn step(&mut self, elapsed_ms: f32) -> &[ItemVisualState] {
        let paused = self.is_paused();
        let elapsed = if paused {
            self.driver.effective_elapsed(elapsed_ms)
        } else {
            let before = self.driver.raw_offset();
            let elapsed = self.driver.advance(elapsed_ms);
            self.follow_raw(before);
            elapsed
        };
        let lag = self.offset_lag.update(0.0, elapsed);
        let smoothed = self.driver.raw_offset() + f64::from(lag);

        self.states.clear();
        if let Some(resolver) = self.resolver() {
            let dataset_len = self.items.len();
            let mapper = &self.visuals;
            let cull_radius = self.config.cull_radius;
            for (slot, motion) in self.motions.iter_mut().enumerate() {
                let resolved_x = resolver.resolve(smoothed, slot);
                let targets = mapper.map(resolved_x);
                // Smoothers advance even for culled slots so they re-enter
                // without a jump.
                let scale = motion.scale.update(targets.scale, elapsed);
                let opacity = motion.opacity.update(targets.opacity, elapsed);
                let brightness = motion.brightness.update(targets.brightness, elapsed);
                let grayscale = motion.grayscale.update(targets.grayscale, elapsed);
                if cull_radius.is_some_and(|radius| resolved_x.abs() > radius) {
                    continue;
                }
                self.states.push(ItemVisualState {
                    slot,
                    original_index: slot % dataset_len,
                    resolved_x,
                    scale,
                    opacity,
                    brightness,
                    grayscale,
                    z_order: targets.z_order,
                });
            }
        }

        self.stats.record(elapsed_ms, elapsed, paused, self.states.len());
        &self.states
    }
}
