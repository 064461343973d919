//! Configuration types for automation.
//!
//! Screen coordinates arrive as loosely typed values (strings or numbers,
//! the way they were typed into the calibration fields) and are validated in
//! one pass before automation starts. Calibration constants live in an
//! optional `tuning` section where every field has a default.

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::automation::docking::DockingSettings;
use crate::error::ConfigError;
use crate::geometry::{ScreenPoint, ScreenRegion};
use crate::motion::TrajectoryParams;
use crate::ocr::OcrSettings;

/// Named coordinate and timing values a [`ConfigSource`] provides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    SelectionTopLeftX,
    SelectionTopLeftY,
    SelectionBottomRightX,
    SelectionBottomRightY,
    DockButtonTopLeftX,
    DockButtonTopLeftY,
    DockButtonBottomRightX,
    DockButtonBottomRightY,
    MiningPointX,
    MiningPointY,
    VerificationPointX,
    VerificationPointY,
    LoopIntervalSeconds,
}

impl ConfigKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConfigKey::SelectionTopLeftX => "selection_box_top_left_x",
            ConfigKey::SelectionTopLeftY => "selection_box_top_left_y",
            ConfigKey::SelectionBottomRightX => "selection_box_bottom_right_x",
            ConfigKey::SelectionBottomRightY => "selection_box_bottom_right_y",
            ConfigKey::DockButtonTopLeftX => "dock_button_top_left_x",
            ConfigKey::DockButtonTopLeftY => "dock_button_top_left_y",
            ConfigKey::DockButtonBottomRightX => "dock_button_bottom_right_x",
            ConfigKey::DockButtonBottomRightY => "dock_button_bottom_right_y",
            ConfigKey::MiningPointX => "mining_module_x",
            ConfigKey::MiningPointY => "mining_module_y",
            ConfigKey::VerificationPointX => "verification_point_x",
            ConfigKey::VerificationPointY => "verification_point_y",
            ConfigKey::LoopIntervalSeconds => "loop_interval_seconds",
        }
    }
}

/// Where raw configuration values come from.
pub trait ConfigSource {
    /// The raw text for `key`, or `None` if it was never set.
    fn value(&self, key: ConfigKey) -> Option<String>;

    /// Calibration constants; defaults unless the source overrides them.
    fn tuning(&self) -> Result<Tuning, ConfigError> {
        Ok(Tuning::default())
    }
}

/// Inclusive random delay range in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    fn validate(&self, key: &'static str) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms {
            return Err(ConfigError::OutOfRange {
                key,
                reason: format!("min {} ms exceeds max {} ms", self.min_ms, self.max_ms),
            });
        }
        Ok(())
    }
}

/// Where the context-menu entry appears relative to the right-click point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuGeometry {
    pub x_offset: i32,
    pub y_offset: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for MenuGeometry {
    fn default() -> Self {
        // Measured from a right click at (390, 850): entry spans (407, 910)-(541, 926)
        Self {
            x_offset: 17,
            y_offset: 60,
            width: 134,
            height: 16,
        }
    }
}

impl MenuGeometry {
    /// The menu entry's rectangle for a right click at `anchor`.
    pub fn item_region(&self, anchor: ScreenPoint) -> Option<ScreenRegion> {
        ScreenRegion::new(
            anchor.offset(self.x_offset, self.y_offset),
            self.width,
            self.height,
        )
    }
}

/// A rectangle written as two corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl RegionSpec {
    pub fn to_region(&self, name: &'static str) -> Result<ScreenRegion, ConfigError> {
        ScreenRegion::from_corners(
            ScreenPoint::new(self.left, self.top),
            ScreenPoint::new(self.right, self.bottom),
        )
        .ok_or(ConfigError::EmptyRegion { name })
    }
}

/// Calibration constants, loaded from the `tuning` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Text the context-menu entry must show before it is clicked.
    pub menu_label: String,
    pub menu_item: MenuGeometry,
    /// Where the pointer parks between cycles.
    pub rest_area: RegionSpec,
    /// Pause between consecutive steps of the action cycle.
    pub pacing: DelayRange,
    /// Interval between mining-indicator samples.
    pub mining_check: DelayRange,
    /// Identical samples in a row that count as a stall.
    pub sample_window: usize,
    /// Per-channel tolerance for stall comparisons; exact when unset.
    pub color_tolerance: Option<u8>,
    pub docking: DockingSettings,
    pub ocr: OcrSettings,
    pub motion: TrajectoryParams,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            menu_label: "compress".to_string(),
            menu_item: MenuGeometry::default(),
            rest_area: RegionSpec {
                left: 1100,
                top: 500,
                right: 1300,
                bottom: 700,
            },
            pacing: DelayRange::new(500, 1000),
            mining_check: DelayRange::new(1000, 5000),
            sample_window: 5,
            color_tolerance: None,
            docking: DockingSettings::default(),
            ocr: OcrSettings::default(),
            motion: TrajectoryParams::default(),
        }
    }
}

impl Tuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.menu_label.trim().is_empty() {
            return Err(ConfigError::OutOfRange {
                key: "tuning.menu_label",
                reason: "label must not be empty".to_string(),
            });
        }
        if self.menu_item.width == 0 || self.menu_item.height == 0 {
            return Err(ConfigError::EmptyRegion { name: "menu item" });
        }
        if self.sample_window == 0 {
            return Err(ConfigError::OutOfRange {
                key: "tuning.sample_window",
                reason: "at least one sample is required".to_string(),
            });
        }
        self.pacing.validate("tuning.pacing")?;
        self.mining_check.validate("tuning.mining_check")?;
        self.docking.delay.validate("tuning.docking.delay")?;
        self.motion.validate().map_err(ConfigError::Tuning)?;
        Ok(())
    }
}

/// Validated configuration for one automation run.
#[derive(Clone, Debug, PartialEq)]
pub struct AutomationConfig {
    pub selection_box: ScreenRegion,
    pub dock_button: ScreenRegion,
    /// Pixel watched for mining activity.
    pub mining_point: ScreenPoint,
    /// Pixel compared before and after docking; the mining point unless set.
    pub verification_point: ScreenPoint,
    pub loop_interval: Duration,
    pub rest_area: ScreenRegion,
    pub tuning: Tuning,
}

impl AutomationConfig {
    /// Reads and validates every value, failing on the first bad one.
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let loop_interval = parse_interval(source, ConfigKey::LoopIntervalSeconds)?;

        let selection_box = parse_region(
            source,
            "selection box",
            [
                ConfigKey::SelectionTopLeftX,
                ConfigKey::SelectionTopLeftY,
                ConfigKey::SelectionBottomRightX,
                ConfigKey::SelectionBottomRightY,
            ],
        )?;
        let dock_button = parse_region(
            source,
            "dock button",
            [
                ConfigKey::DockButtonTopLeftX,
                ConfigKey::DockButtonTopLeftY,
                ConfigKey::DockButtonBottomRightX,
                ConfigKey::DockButtonBottomRightY,
            ],
        )?;
        let mining_point = parse_point(source, ConfigKey::MiningPointX, ConfigKey::MiningPointY)?;

        let verification_set = is_set(source, ConfigKey::VerificationPointX)
            || is_set(source, ConfigKey::VerificationPointY);
        let verification_point = if verification_set {
            parse_point(
                source,
                ConfigKey::VerificationPointX,
                ConfigKey::VerificationPointY,
            )?
        } else {
            mining_point
        };

        let tuning = source.tuning()?;
        tuning.validate()?;
        let rest_area = tuning.rest_area.to_region("rest area")?;

        Ok(Self {
            selection_box,
            dock_button,
            mining_point,
            verification_point,
            loop_interval,
            rest_area,
            tuning,
        })
    }
}

fn is_set(source: &dyn ConfigSource, key: ConfigKey) -> bool {
    source
        .value(key)
        .is_some_and(|value| !value.trim().is_empty())
}

fn raw_value(source: &dyn ConfigSource, key: ConfigKey) -> Result<String, ConfigError> {
    match source.value(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::Missing { key: key.as_str() }),
    }
}

fn parse_int(source: &dyn ConfigSource, key: ConfigKey) -> Result<i32, ConfigError> {
    let value = raw_value(source, key)?;
    value.parse::<i32>().map_err(|_| ConfigError::NotNumeric {
        key: key.as_str(),
        value,
    })
}

fn parse_point(
    source: &dyn ConfigSource,
    x: ConfigKey,
    y: ConfigKey,
) -> Result<ScreenPoint, ConfigError> {
    Ok(ScreenPoint::new(parse_int(source, x)?, parse_int(source, y)?))
}

fn parse_region(
    source: &dyn ConfigSource,
    name: &'static str,
    [left, top, right, bottom]: [ConfigKey; 4],
) -> Result<ScreenRegion, ConfigError> {
    let top_left = parse_point(source, left, top)?;
    let bottom_right = parse_point(source, right, bottom)?;
    ScreenRegion::from_corners(top_left, bottom_right).ok_or(ConfigError::EmptyRegion { name })
}

fn parse_interval(source: &dyn ConfigSource, key: ConfigKey) -> Result<Duration, ConfigError> {
    let value = raw_value(source, key)?;
    let seconds = value.parse::<f64>().map_err(|_| ConfigError::NotNumeric {
        key: key.as_str(),
        value: value.clone(),
    })?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(ConfigError::OutOfRange {
            key: key.as_str(),
            reason: format!("{} is not a positive number of seconds", value),
        });
    }
    let interval =
        Duration::try_from_secs_f64(seconds).map_err(|e| ConfigError::OutOfRange {
            key: key.as_str(),
            reason: format!("{} seconds: {}", value, e),
        })?;
    if interval < Duration::from_millis(1) {
        return Err(ConfigError::OutOfRange {
            key: key.as_str(),
            reason: "interval must be at least one millisecond".to_string(),
        });
    }
    Ok(interval)
}

/// Configuration read from a JSON object.
///
/// Top-level keys are the [`ConfigKey`] names; values may be strings or
/// numbers. An optional `tuning` object overrides calibration constants.
#[derive(Clone, Debug, Default)]
pub struct JsonConfigSource {
    root: Map<String, Value>,
}

impl JsonConfigSource {
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(anyhow::anyhow!(
                "config must be a JSON object, found {}",
                other
            )),
        }
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(contents).context("Failed to parse config")?;
        Self::from_value(value)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&contents)
    }

    /// Loads `config.json` from next to the executable.
    pub fn load_default() -> Result<Self> {
        let path = crate::paths::get_config_path();
        tracing::info!("Looking for config at: {}", path.display());
        Self::load(&path)
    }
}

impl ConfigSource for JsonConfigSource {
    fn value(&self, key: ConfigKey) -> Option<String> {
        match self.root.get(key.as_str())? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn tuning(&self) -> Result<Tuning, ConfigError> {
        match self.root.get("tuning") {
            None | Some(Value::Null) => Ok(Tuning::default()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| ConfigError::Tuning(e.to_string())),
        }
    }
}
