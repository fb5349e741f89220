use formats::geojson::Feature;
use foundation::geo::ScreenPoint;
use layers::layer::LayerId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// The style finished loading; layer operations are allowed from here on.
    Load,
    Click,
    MouseEnter,
    MouseLeave,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Load => "load",
            EventKind::Click => "click",
            EventKind::MouseEnter => "mouseenter",
            EventKind::MouseLeave => "mouseleave",
        }
    }
}

/// Handle returned by [`crate::MapRenderer::on`], used to detach the handler.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

/// An event emitted by the renderer.
///
/// Layer-scoped pointer events carry the features under the pointer on that
/// layer, topmost first.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEvent {
    pub kind: EventKind,
    pub layer: Option<LayerId>,
    pub point: ScreenPoint,
    pub features: Vec<Feature>,
}

impl MapEvent {
    pub fn load() -> Self {
        Self {
            kind: EventKind::Load,
            layer: None,
            point: ScreenPoint::default(),
            features: Vec::new(),
        }
    }

    pub fn click(point: ScreenPoint) -> Self {
        Self {
            kind: EventKind::Click,
            layer: None,
            point,
            features: Vec::new(),
        }
    }

    pub fn mouse_enter(layer: LayerId, point: ScreenPoint, features: Vec<Feature>) -> Self {
        Self {
            kind: EventKind::MouseEnter,
            layer: Some(layer),
            point,
            features,
        }
    }

    pub fn mouse_leave(layer: LayerId, point: ScreenPoint) -> Self {
        Self {
            kind: EventKind::MouseLeave,
            layer: Some(layer),
            point,
            features: Vec::new(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}
