use serde_json::{Map, Value};

use crate::config::TooltipConfig;
use crate::store::HoverState;

/// Tooltip for the hovered submission, placed next to the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub properties: Map<String, Value>,
    pub left: f64,
    pub top: f64,
    pub width: f64,
}

impl Tooltip {
    pub fn for_hover(hover: &HoverState, config: &TooltipConfig) -> Self {
        Self {
            properties: hover.properties.clone(),
            left: hover.position.x + config.offset_x,
            top: hover.position.y + config.offset_y,
            width: config.width,
        }
    }
}
