use std::fs;
use std::path::Path;

use layers::layer::LayerId;
use layers::symbology::{Color, DEFAULT_RADIUS};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Static configuration of the map component.
///
/// Every field has a default matching the dashboard's base style, so a config
/// file only needs the fields it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Style descriptor handed to the renderer factory.
    pub style: String,
    /// Source holding the submission points.
    pub source_id: String,
    pub points_layer: LayerId,
    /// Single-point layer drawn over the hovered submission.
    pub hover_layer: LayerId,
    /// Outline layer of the selected geographic unit.
    pub highlight_layer: LayerId,
    /// Stable identifier property of geographic units.
    pub feature_id_property: String,
    /// Identifier property of submission points.
    pub point_id_property: String,
    pub points: PointStyle,
    pub fill: FillStyle,
    pub tooltip: TooltipConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            style: "mapbox://styles/piecewise/dashboard".to_string(),
            source_id: "submissions".to_string(),
            points_layer: LayerId::from("submissions"),
            hover_layer: LayerId::from("current-submission"),
            highlight_layer: LayerId::from("clicked"),
            feature_id_property: "fips".to_string(),
            point_id_property: "id".to_string(),
            points: PointStyle::default(),
            fill: FillStyle::default(),
            tooltip: TooltipConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointStyle {
    pub radius: f64,
    pub color: Color,
    pub opacity: f64,
    pub hover_opacity: f64,
    pub stroke_color: Color,
    pub stroke_width: f64,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            color: Color::rgb(94, 66, 166),
            opacity: 0.6,
            hover_opacity: 1.0,
            stroke_color: Color::rgb(47, 35, 77),
            stroke_width: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillStyle {
    /// Fill of every unit while no fill metric is selected.
    pub flat_color: Color,
    /// Fill of units lacking the selected metric.
    pub missing_color: Color,
    /// Fill opacity while a fill metric is selected.
    pub active_opacity: f64,
}

impl Default for FillStyle {
    fn default() -> Self {
        Self {
            flat_color: Color::rgb(0xEC, 0xE1, 0xCB),
            missing_color: Color::WHITE,
            active_opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TooltipConfig {
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            offset_x: 20.0,
            offset_y: 10.0,
            width: 300.0,
        }
    }
}

impl MapConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&payload)
    }
}
