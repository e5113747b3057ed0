//! Carousel configuration and the per-section presets.
//!
//! The JSON format uses camelCase keys to match the TypeScript front end.
//! A config file only needs to list the fields it changes; everything else is
//! taken from the preset it is layered on.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::falloff::{FalloffCurve, VisualMapper, ZOrderRule};
use crate::position::Geometry;
use crate::scroll_driver::{ElapsedPolicy, DEFAULT_REFERENCE_FRAME_MS};
use crate::spring::SpringParams;

/// How items are laid out on the ring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutMode {
    /// Each item appears once; the ring holds `N` slots.
    #[default]
    Wrap,
    /// The loop buffer's `2N` slots are laid out side by side, so strips wider
    /// than `N` slots never show a gap.
    Marquee,
}

/// One spring per smoothed signal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringSet {
    pub offset: SpringParams,
    pub scale: SpringParams,
    pub opacity: SpringParams,
    pub brightness: SpringParams,
    pub grayscale: SpringParams,
}

impl SpringSet {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.offset.validate("offset")?;
        self.scale.validate("scale")?;
        self.opacity.validate("opacity")?;
        self.brightness.validate("brightness")?;
        self.grayscale.validate("grayscale")
    }
}

/// Everything that distinguishes one carousel from another.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselConfig {
    pub geometry: Geometry,
    /// Pixels per reference frame; negative scrolls right-to-left.
    pub velocity: f32,
    pub reference_frame_ms: f32,
    pub elapsed_policy: ElapsedPolicy,
    pub layout: LayoutMode,
    /// Items further than this from the centre are not emitted.
    pub cull_radius: Option<f32>,
    pub pause_on_hover: bool,
    pub springs: SpringSet,
    pub visuals: VisualMapper,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Preset::CityHubs.config()
    }
}

impl CarouselConfig {
    /// Check every value that could break the per-frame math.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry.validate()?;
        if !self.reference_frame_ms.is_finite() || self.reference_frame_ms <= 0.0 {
            return Err(ConfigError::InvalidReferenceFrame(self.reference_frame_ms));
        }
        if !self.velocity.is_finite() {
            return Err(ConfigError::InvalidVelocity(self.velocity));
        }
        if let ElapsedPolicy::Clamp { max_ms } = self.elapsed_policy {
            if !max_ms.is_finite() || max_ms <= 0.0 {
                return Err(ConfigError::InvalidElapsedClamp(max_ms));
            }
        }
        if let Some(radius) = self.cull_radius {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ConfigError::InvalidCullRadius(radius));
            }
        }
        self.springs.validate()?;
        self.visuals.validate()
    }

    /// Parse a JSON config layered over `base`, then validate it.
    pub fn from_json_str_over(base: &CarouselConfig, json: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(json).context("carousel config is not valid JSON")?;
        let mut merged = serde_json::to_value(base).context("failed to serialise base config")?;
        merge_json(&mut merged, overrides);
        let config: CarouselConfig =
            serde_json::from_value(merged).context("carousel config has an invalid shape")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config. A top-level `"preset"` key selects the base.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).context("carousel config is not valid JSON")?;
        let preset = match value.get("preset").and_then(Value::as_str) {
            Some(name) => name.parse::<Preset>().map_err(anyhow::Error::msg)?,
            None => Preset::CityHubs,
        };
        Self::from_json_str_over(&preset.config(), json)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&contents).with_context(|| format!("invalid config {}", path.display()))
    }
}

/// Recursively overlay `overrides` onto `base`. Objects merge key by key;
/// any other value replaces. `preset` selects the base and is not a config
/// field, so it is skipped.
fn merge_json(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                if key == "preset" {
                    continue;
                }
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

/// The homepage sections that run a carousel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    CityHubs,
    Mentors,
    Partners,
    Technologies,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::CityHubs,
        Preset::Mentors,
        Preset::Partners,
        Preset::Technologies,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::CityHubs => "city-hubs",
            Preset::Mentors => "mentors",
            Preset::Partners => "partners",
            Preset::Technologies => "technologies",
        }
    }

    /// Section tuning. Each section keeps its own feel: hubs and mentors are
    /// large cards with a pronounced focus effect, partners and technologies
    /// are fast marquees of small logos.
    pub fn config(&self) -> CarouselConfig {
        match self {
            Preset::CityHubs => CarouselConfig {
                geometry: Geometry {
                    item_width: 280.0,
                    gap: 30.0,
                },
                velocity: -0.6,
                reference_frame_ms: DEFAULT_REFERENCE_FRAME_MS,
                elapsed_policy: ElapsedPolicy::default(),
                layout: LayoutMode::Wrap,
                cull_radius: None,
                pause_on_hover: true,
                springs: SpringSet {
                    offset: SpringParams::new(100.0, 30.0, 1.0),
                    scale: SpringParams::new(300.0, 30.0, 1.0),
                    opacity: SpringParams::new(150.0, 25.0, 1.0),
                    brightness: SpringParams::new(150.0, 25.0, 1.0),
                    grayscale: SpringParams::new(150.0, 25.0, 1.0),
                },
                visuals: VisualMapper {
                    scale: FalloffCurve::symmetric(600.0, 1.05, 0.85),
                    opacity: FalloffCurve::symmetric(1000.0, 1.0, 0.3),
                    brightness: FalloffCurve::symmetric(350.0, 1.0, 0.6),
                    grayscale: FalloffCurve::symmetric(350.0, 0.0, 1.0),
                    z_order: ZOrderRule {
                        peak: 30,
                        flat_radius: 40.0,
                        step: 50.0,
                    },
                },
            },
            Preset::Mentors => CarouselConfig {
                geometry: Geometry {
                    item_width: 320.0,
                    gap: 40.0,
                },
                velocity: -0.45,
                reference_frame_ms: DEFAULT_REFERENCE_FRAME_MS,
                elapsed_policy: ElapsedPolicy::default(),
                layout: LayoutMode::Wrap,
                cull_radius: Some(1_400.0),
                pause_on_hover: true,
                springs: SpringSet {
                    offset: SpringParams::new(80.0, 25.0, 1.0),
                    scale: SpringParams::new(260.0, 28.0, 1.0),
                    opacity: SpringParams::new(120.0, 24.0, 1.0),
                    brightness: SpringParams::new(120.0, 24.0, 1.0),
                    grayscale: SpringParams::new(120.0, 24.0, 1.0),
                },
                visuals: VisualMapper {
                    scale: FalloffCurve::from_points(vec![
                        (-600.0, 0.8),
                        (-300.0, 0.92),
                        (0.0, 1.08),
                        (300.0, 0.92),
                        (600.0, 0.8),
                    ]),
                    opacity: FalloffCurve::symmetric(1000.0, 1.0, 0.25),
                    brightness: FalloffCurve::symmetric(400.0, 1.0, 0.5),
                    grayscale: FalloffCurve::symmetric(400.0, 0.0, 1.0),
                    z_order: ZOrderRule {
                        peak: 30,
                        flat_radius: 60.0,
                        step: 60.0,
                    },
                },
            },
            Preset::Partners => CarouselConfig {
                geometry: Geometry {
                    item_width: 180.0,
                    gap: 48.0,
                },
                velocity: -0.8,
                reference_frame_ms: DEFAULT_REFERENCE_FRAME_MS,
                elapsed_policy: ElapsedPolicy::default(),
                layout: LayoutMode::Marquee,
                cull_radius: None,
                pause_on_hover: true,
                springs: SpringSet {
                    offset: SpringParams::new(120.0, 30.0, 1.0),
                    scale: SpringParams::new(320.0, 36.0, 1.0),
                    opacity: SpringParams::new(160.0, 26.0, 1.0),
                    brightness: SpringParams::new(160.0, 26.0, 1.0),
                    grayscale: SpringParams::new(160.0, 26.0, 1.0),
                },
                visuals: VisualMapper {
                    scale: FalloffCurve::symmetric(500.0, 1.1, 0.9),
                    opacity: FalloffCurve::symmetric(900.0, 1.0, 0.4),
                    brightness: FalloffCurve::symmetric(300.0, 1.0, 0.7),
                    grayscale: FalloffCurve::symmetric(300.0, 0.0, 1.0),
                    z_order: ZOrderRule {
                        peak: 20,
                        flat_radius: 30.0,
                        step: 80.0,
                    },
                },
            },
            Preset::Technologies => CarouselConfig {
                geometry: Geometry {
                    item_width: 140.0,
                    gap: 24.0,
                },
                velocity: 1.0,
                reference_frame_ms: DEFAULT_REFERENCE_FRAME_MS,
                elapsed_policy: ElapsedPolicy::default(),
                layout: LayoutMode::Marquee,
                cull_radius: None,
                pause_on_hover: false,
                springs: SpringSet {
                    offset: SpringParams::new(150.0, 30.0, 1.0),
                    scale: SpringParams::new(400.0, 40.0, 1.0),
                    opacity: SpringParams::new(200.0, 30.0, 1.0),
                    brightness: SpringParams::new(200.0, 30.0, 1.0),
                    grayscale: SpringParams::new(200.0, 30.0, 1.0),
                },
                visuals: VisualMapper {
                    scale: FalloffCurve::symmetric(450.0, 1.15, 0.9),
                    opacity: FalloffCurve::symmetric(800.0, 1.0, 0.35),
                    brightness: FalloffCurve::symmetric(300.0, 1.0, 0.65),
                    grayscale: FalloffCurve::symmetric(320.0, 0.0, 1.0),
                    z_order: ZOrderRule {
                        peak: 20,
                        flat_radius: 20.0,
                        step: 60.0,
                    },
                },
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Preset::ALL.iter().map(|p| p.name()).collect();
                format!("unknown preset '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for preset in Preset::ALL {
            assert!(preset.config().validate().is_ok(), "{} is invalid", preset);
            assert_eq!(preset.name().parse::<Preset>(), Ok(preset));
        }
        assert!("carousel".parse::<Preset>().is_err());
    }

    #[test]
    fn test_partial_json_layers_over_preset() {
        let config = CarouselConfig::from_json_str(
            r#"{ "preset": "mentors", "velocity": 2.5, "geometry": { "gap": 10 } }"#,
        )
        .unwrap();
        let mentors = Preset::Mentors.config();
        assert_eq!(config.velocity, 2.5);
        assert_eq!(config.geometry.gap, 10.0);
        assert_eq!(config.geometry.item_width, mentors.geometry.item_width);
        assert_eq!(config.springs, mentors.springs);
    }

    #[test]
    fn test_invalid_geometry_fails_fast() {
        let err = CarouselConfig::from_json_str(r#"{ "geometry": { "itemWidth": 0, "gap": 0 } }"#)
            .unwrap_err();
        let config_err = err.downcast_ref::<ConfigError>().unwrap();
        assert!(matches!(config_err, ConfigError::InvalidGeometry { .. }));
    }

    #[test]
    fn test_validate_catches_each_field() {
        let mut config = CarouselConfig::default();
        config.reference_frame_ms = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidReferenceFrame(0.0)));

        let mut config = CarouselConfig::default();
        config.elapsed_policy = ElapsedPolicy::Clamp { max_ms: -1.0 };
        assert_eq!(config.validate(), Err(ConfigError::InvalidElapsedClamp(-1.0)));

        let mut config = CarouselConfig::default();
        config.cull_radius = Some(0.0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidCullRadius(0.0)));

        let mut config = CarouselConfig::default();
        config.springs.opacity.mass = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSpring { signal: "opacity", .. })
        ));
    }

    #[test]
    fn test_unknown_preset_in_json() {
        assert!(CarouselConfig::from_json_str(r#"{ "preset": "courses" }"#).is_err());
    }
}
