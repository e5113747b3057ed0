//! Kinetic infinite-loop carousel engine.
//!
//! Drives an endless, auto-scrolling strip of cards from a finite dataset and
//! computes, once per frame, each card's position, scale, opacity,
//! brightness, grayscale and stacking order. Painting is left to the host.

pub mod carousel;
pub mod config;
pub mod display_item;
pub mod error;
pub mod falloff;
pub mod frame;
pub mod frame_stats;
pub mod loop_buffer;
pub mod position;
pub mod scroll_driver;
pub mod spring;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use carousel::{Carousel, ItemVisualState};
pub use config::{CarouselConfig, LayoutMode, Preset};
pub use display_item::DisplayItem;
pub use error::ConfigError;
