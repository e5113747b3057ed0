use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use crate::carousel::{Carousel, ItemVisualState};
use crate::config::{CarouselConfig, Preset};
use crate::display_item::{load_items, DisplayItem, JsonFileProvider};
use crate::frame::{mount, FrameScheduler};
use crate::scroll_driver::ScrollState;

#[derive(Parser)]
#[command(author, version, about = "Headless driver for the kinetic carousel engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a carousel offline and dump every frame's visual state as JSON
    Simulate {
        /// Section preset to start from
        #[arg(long, default_value_t = Preset::CityHubs)]
        preset: Preset,

        /// JSON config layered over the preset
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON file of display items (array, or object with a "data" array)
        #[arg(long)]
        items: Option<PathBuf>,

        /// Number of placeholder items when --items is not given
        #[arg(long, default_value_t = 5)]
        demo_items: usize,

        /// Number of frames to simulate
        #[arg(long, default_value_t = 120)]
        frames: usize,

        /// Frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// First frame of a pause (the carousel is paused explicitly, whatever
        /// the preset's hover setting)
        #[arg(long)]
        pause_from: Option<usize>,

        /// Frame at which the pause ends (runs to the end when omitted)
        #[arg(long, requires = "pause_from")]
        pause_until: Option<usize>,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the configuration of every preset as JSON
    Presets,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameRecord {
    frame: usize,
    timestamp_ms: f64,
    elapsed_ms: f32,
    paused: bool,
    scroll: ScrollState,
    items: Vec<ItemVisualState>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationReport<'a> {
    preset: Preset,
    config: &'a CarouselConfig,
    items: Vec<DisplayItem>,
    frames: Vec<FrameRecord>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            preset,
            config,
            items,
            demo_items,
            frames,
            fps,
            pause_from,
            pause_until,
            out,
            pretty,
        } => {
            let config = match config {
                Some(path) => {
                    let json = std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read config {}", path.display()))?;
                    CarouselConfig::from_json_str_over(&preset.config(), &json)
                        .with_context(|| format!("invalid config {}", path.display()))?
                }
                None => preset.config(),
            };
            let items = match items {
                Some(path) => load_items(&JsonFileProvider::new(path)),
                None => demo_dataset(demo_items),
            };
            let pause = match (pause_from, pause_until) {
                (Some(from), Some(until)) => {
                    anyhow::ensure!(
                        until > from,
                        "--pause-until ({}) must be after --pause-from ({})",
                        until,
                        from
                    );
                    Some(from..until)
                }
                (Some(from), None) => Some(from..usize::MAX),
                (None, _) => None,
            };
            let frames = simulate(&config, items.clone(), frames, fps, pause)?;
            let report = SimulationReport {
                preset,
                config: &config,
                items,
                frames,
            };
            write_json(&report, out, pretty)?;
        }
        Commands::Presets => {
            let presets: BTreeMap<_, _> = Preset::ALL.iter().map(|p| (p.name(), p.config())).collect();
            write_json(&presets, None, true)?;
        }
    }
    Ok(())
}

fn demo_dataset(count: usize) -> Vec<DisplayItem> {
    (0..count)
        .map(|i| DisplayItem::new(format!("demo-{}", i), i, format!("Card {}", i + 1)))
        .collect()
}

/// Drive a carousel through `frame_count` frames on a fixed clock.
fn simulate(
    config: &CarouselConfig,
    items: Vec<DisplayItem>,
    frame_count: usize,
    fps: f64,
    pause: Option<std::ops::Range<usize>>,
) -> Result<Vec<FrameRecord>> {
    anyhow::ensure!(fps.is_finite() && fps > 0.0, "fps must be positive, got {}", fps);

    let carousel = Rc::new(RefCell::new(Carousel::with_items(config.clone(), items)?));
    let records: Rc<RefCell<Vec<FrameRecord>>> = Rc::new(RefCell::new(Vec::with_capacity(frame_count)));

    let mut scheduler = FrameScheduler::new();
    let subscription = {
        let records = Rc::clone(&records);
        mount(&scheduler, Rc::clone(&carousel), move |tick, carousel| {
            let mut records = records.borrow_mut();
            let frame = records.len();
            records.push(FrameRecord {
                frame,
                timestamp_ms: tick.timestamp_ms,
                elapsed_ms: tick.elapsed_ms,
                paused: carousel.is_paused(),
                scroll: carousel.scroll_state(),
                items: carousel.visual_states().to_vec(),
            });
        })
    };

    log::info!("Simulating {} frames at {} fps", frame_count, fps);
    let frame_ms = 1000.0 / fps;
    for frame in 0..frame_count {
        if let Some(range) = &pause {
            let mut carousel = carousel.borrow_mut();
            if range.contains(&frame) {
                carousel.pause();
            } else {
                carousel.resume();
            }
        }
        scheduler.dispatch(frame as f64 * frame_ms);
    }
    drop(subscription);

    let frames = std::mem::take(&mut *records.borrow_mut());
    Ok(frames)
}

fn write_json<T: Serialize>(value: &T, out: Option<PathBuf>, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match out {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
