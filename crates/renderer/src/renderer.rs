use formats::geojson::{Feature, FeatureCollection};
use foundation::geo::ScreenPoint;
use layers::filter::Filter;
use layers::layer::{LayerId, LayerSpec, PaintProperty};
use layers::symbology::Expression;

use crate::event::{Cursor, EventKind, HandlerId};

/// The map rendering capability.
///
/// Implementations own the underlying map instance. All calls are
/// declarative: applying the same filter or paint value twice leaves the map
/// in the same state as applying it once.
pub trait MapRenderer {
    /// Subscribes to `kind`, optionally scoped to one layer.
    fn on(&mut self, kind: EventKind, layer: Option<&LayerId>) -> HandlerId;
    fn off(&mut self, handler: HandlerId);

    /// Rendered features under `point` on `layers`, topmost first. Features
    /// hidden by a layer filter are not returned.
    fn query_rendered_features(&self, point: ScreenPoint, layers: &[LayerId]) -> Vec<Feature>;

    fn add_source(&mut self, id: &str, data: &FeatureCollection);
    fn set_source_data(&mut self, id: &str, data: &FeatureCollection);
    fn add_layer(&mut self, layer: &LayerSpec);
    fn set_filter(&mut self, layer: &LayerId, filter: &Filter);
    fn set_paint_property(&mut self, layer: &LayerId, property: PaintProperty, value: &Expression);
    fn set_cursor(&mut self, cursor: Cursor);
    fn resize(&mut self);

    /// Releases the map instance. No other call is valid afterwards.
    fn remove(&mut self);
}

/// Creates the renderer for a style descriptor.
///
/// Called at most once per map component.
pub trait RendererFactory {
    type Renderer: MapRenderer;

    fn create(&mut self, style: &str) -> Self::Renderer;
}

impl<R, F> RendererFactory for F
where
    R: MapRenderer,
    F: FnMut(&str) -> R,
{
    type Renderer = R;

    fn create(&mut self, style: &str) -> R {
        self(style)
    }
}
