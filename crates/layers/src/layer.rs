use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use crate::symbology::PaintValue;

/// Renderer layer identifier, e.g. `counties-fill`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Granularity of the polygon boundaries on screen.
///
/// Each level owns a layer triple in the base style: `{level}-fill`,
/// `{level}-stroke` (the outlines toggled on level change) and `{level}-data`
/// (the choropleth fill that clicks are resolved against).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeographyLevel {
    #[default]
    Counties,
    Blocks,
}

impl GeographyLevel {
    pub const ALL: [GeographyLevel; 2] = [GeographyLevel::Counties, GeographyLevel::Blocks];

    pub fn as_str(self) -> &'static str {
        match self {
            GeographyLevel::Counties => "counties",
            GeographyLevel::Blocks => "blocks",
        }
    }

    pub fn fill_layer(self) -> LayerId {
        LayerId(format!("{}-fill", self.as_str()))
    }

    pub fn stroke_layer(self) -> LayerId {
        LayerId(format!("{}-stroke", self.as_str()))
    }

    pub fn data_layer(self) -> LayerId {
        LayerId(format!("{}-data", self.as_str()))
    }
}

impl std::str::FromStr for GeographyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counties" => Ok(GeographyLevel::Counties),
            "blocks" => Ok(GeographyLevel::Blocks),
            other => Err(format!("unknown geography level: {other}")),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Circle,
    Fill,
    Line,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PaintProperty {
    #[serde(rename = "circle-radius")]
    CircleRadius,
    #[serde(rename = "circle-color")]
    CircleColor,
    #[serde(rename = "circle-opacity")]
    CircleOpacity,
    #[serde(rename = "circle-stroke-color")]
    CircleStrokeColor,
    #[serde(rename = "circle-stroke-width")]
    CircleStrokeWidth,
    #[serde(rename = "fill-color")]
    FillColor,
    #[serde(rename = "fill-opacity")]
    FillOpacity,
}

impl PaintProperty {
    pub fn as_str(self) -> &'static str {
        match self {
            PaintProperty::CircleRadius => "circle-radius",
            PaintProperty::CircleColor => "circle-color",
            PaintProperty::CircleOpacity => "circle-opacity",
            PaintProperty::CircleStrokeColor => "circle-stroke-color",
            PaintProperty::CircleStrokeWidth => "circle-stroke-width",
            PaintProperty::FillColor => "fill-color",
            PaintProperty::FillOpacity => "fill-opacity",
        }
    }
}

/// Declarative layer definition handed to the renderer once at setup.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: LayerId,
    pub kind: LayerKind,
    pub source: String,
    pub paint: Vec<(PaintProperty, PaintValue)>,
    pub filter: Filter,
}

impl LayerSpec {
    pub fn new(id: LayerId, kind: LayerKind, source: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            source: source.into(),
            paint: Vec::new(),
            filter: Filter::All,
        }
    }

    pub fn with_paint(mut self, property: PaintProperty, value: impl Into<PaintValue>) -> Self {
        self.paint.push((property, value.into()));
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}
