use std::collections::BTreeMap;

use compute::analysis::spatial::SpatialAnalysis;
use formats::geojson::{Feature, FeatureCollection, Geometry};
use foundation::geo::{LonLat, ScreenPoint};
use layers::filter::Filter;
use layers::layer::{LayerId, LayerSpec, PaintProperty};
use layers::symbology::Expression;

use crate::event::{Cursor, EventKind, HandlerId};
use crate::renderer::MapRenderer;

/// Linear screen → lon/lat mapping over a fixed extent.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// `[west, south, east, north]` in degrees.
    pub extent: [f64; 4],
}

impl Viewport {
    pub fn new(width: f64, height: f64, extent: [f64; 4]) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            extent,
        }
    }

    pub fn unproject(&self, p: ScreenPoint) -> LonLat {
        let [west, south, east, north] = self.extent;
        LonLat::new(
            west + (p.x / self.width) * (east - west),
            north - (p.y / self.height) * (north - south),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1024.0, 768.0, [-180.0, -85.0, 180.0, 85.0])
    }
}

/// Every call made on a [`HeadlessRenderer`], in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    On {
        handler: HandlerId,
        kind: EventKind,
        layer: Option<LayerId>,
    },
    Off(HandlerId),
    AddSource {
        id: String,
        features: usize,
    },
    SetSourceData {
        id: String,
        features: usize,
    },
    AddLayer(LayerId),
    SetFilter {
        layer: LayerId,
        filter: Filter,
    },
    SetPaint {
        layer: LayerId,
        property: PaintProperty,
        value: Expression,
    },
    SetCursor(Cursor),
    Resize,
    Remove,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct LayerState {
    source: Option<String>,
    /// Features drawn by a base-style layer with no engine-managed source.
    style_features: Vec<Feature>,
    filter: Filter,
    paint: BTreeMap<PaintProperty, Expression>,
}

/// A renderer without a display.
///
/// Keeps the declarative map state (sources, layer filters, paint values,
/// cursor, subscriptions) and a command log. Base-style layers, such as the
/// geography boundaries, are registered up front with
/// [`HeadlessRenderer::with_style_layer`].
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    viewport: Viewport,
    commands: Vec<RenderCommand>,
    sources: BTreeMap<String, FeatureCollection>,
    layers: BTreeMap<LayerId, LayerState>,
    /// Draw order, bottom first.
    layer_order: Vec<LayerId>,
    cursor: Cursor,
    handlers: BTreeMap<HandlerId, (EventKind, Option<LayerId>)>,
    next_handler: u64,
    removed: bool,
}

impl HeadlessRenderer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn with_style_layer(mut self, id: impl Into<LayerId>, features: Vec<Feature>) -> Self {
        let id = id.into();
        self.layer_order.push(id.clone());
        self.layers.insert(
            id,
            LayerState {
                style_features: features,
                ..Default::default()
            },
        );
        self
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn source(&self, id: &str) -> Option<&FeatureCollection> {
        self.sources.get(id)
    }

    pub fn has_layer(&self, layer: &LayerId) -> bool {
        self.layers.contains_key(layer)
    }

    pub fn filter(&self, layer: &LayerId) -> Option<&Filter> {
        self.layers.get(layer).map(|l| &l.filter)
    }

    pub fn paint(&self, layer: &LayerId, property: PaintProperty) -> Option<&Expression> {
        self.layers.get(layer).and_then(|l| l.paint.get(&property))
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn active_handlers(&self) -> Vec<(EventKind, Option<LayerId>)> {
        self.handlers.values().cloned().collect()
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Features of `layer` that pass its current filter, in draw order.
    pub fn rendered_features(&self, layer: &LayerId) -> Vec<&Feature> {
        let Some(state) = self.layers.get(layer) else {
            return Vec::new();
        };
        let features: &[Feature] = match &state.source {
            Some(source) => self
                .sources
                .get(source)
                .map(|fc| fc.features.as_slice())
                .unwrap_or(&[]),
            None => &state.style_features,
        };
        features
            .iter()
            .filter(|f| state.filter.matches(&f.properties))
            .collect()
    }

    fn layer_mut(&mut self, layer: &LayerId) -> &mut LayerState {
        if !self.layers.contains_key(layer) {
            self.layer_order.push(layer.clone());
        }
        self.layers.entry(layer.clone()).or_default()
    }
}

impl MapRenderer for HeadlessRenderer {
    fn on(&mut self, kind: EventKind, layer: Option<&LayerId>) -> HandlerId {
        let handler = HandlerId(self.next_handler);
        self.next_handler += 1;
        self.handlers.insert(handler, (kind, layer.cloned()));
        self.commands.push(RenderCommand::On {
            handler,
            kind,
            layer: layer.cloned(),
        });
        handler
    }

    fn off(&mut self, handler: HandlerId) {
        self.handlers.remove(&handler);
        self.commands.push(RenderCommand::Off(handler));
    }

    fn query_rendered_features(&self, point: ScreenPoint, layers: &[LayerId]) -> Vec<Feature> {
        let at = self.viewport.unproject(point);
        let mut hits = Vec::new();
        for layer in self.layer_order.iter().rev() {
            if !layers.contains(layer) {
                continue;
            }
            for feature in self.rendered_features(layer).into_iter().rev() {
                let hit = match feature.geometry {
                    Geometry::Point(p) => p == at,
                    _ => SpatialAnalysis::geometry_contains(&feature.geometry, at),
                };
                if hit {
                    hits.push(feature.clone());
                }
            }
        }
        hits
    }

    fn add_source(&mut self, id: &str, data: &FeatureCollection) {
        self.sources.insert(id.to_string(), data.clone());
        self.commands.push(RenderCommand::AddSource {
            id: id.to_string(),
            features: data.len(),
        });
    }

    fn set_source_data(&mut self, id: &str, data: &FeatureCollection) {
        self.sources.insert(id.to_string(), data.clone());
        self.commands.push(RenderCommand::SetSourceData {
            id: id.to_string(),
            features: data.len(),
        });
    }

    fn add_layer(&mut self, layer: &LayerSpec) {
        let state = self.layer_mut(&layer.id);
        state.source = Some(layer.source.clone());
        state.filter = layer.filter.clone();
        for (property, value) in &layer.paint {
            state.paint.insert(*property, Expression::Literal(*value));
        }
        self.commands.push(RenderCommand::AddLayer(layer.id.clone()));
    }

    fn set_filter(&mut self, layer: &LayerId, filter: &Filter) {
        self.layer_mut(layer).filter = filter.clone();
        self.commands.push(RenderCommand::SetFilter {
            layer: layer.clone(),
            filter: filter.clone(),
        });
    }

    fn set_paint_property(&mut self, layer: &LayerId, property: PaintProperty, value: &Expression) {
        self.layer_mut(layer).paint.insert(property, value.clone());
        self.commands.push(RenderCommand::SetPaint {
            layer: layer.clone(),
            property,
            value: value.clone(),
        });
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
        self.commands.push(RenderCommand::SetCursor(cursor));
    }

    fn resize(&mut self) {
        self.commands.push(RenderCommand::Resize);
    }

    fn remove(&mut self) {
        self.handlers.clear();
        self.removed = true;
        self.commands.push(RenderCommand::Remove);
    }
}

#[cfg(test)]
mod tests {
    use super::{HeadlessRenderer, RenderCommand, Viewport};
    use crate::event::EventKind;
    use crate::renderer::MapRenderer;
    use formats::geojson::{Feature, FeatureCollection, Geometry};
    use foundation::geo::{LonLat, ScreenPoint};
    use layers::filter::Filter;
    use layers::layer::{LayerId, LayerKind, LayerSpec, PaintProperty};
    use layers::symbology::Expression;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    fn square(fips: &str, west: f64, south: f64, size: f64) -> Feature {
        let ring = vec![
            LonLat::new(west, south),
            LonLat::new(west + size, south),
            LonLat::new(west + size, south + size),
            LonLat::new(west, south + size),
            LonLat::new(west, south),
        ];
        let mut props = Map::new();
        props.insert("fips".to_string(), json!(fips));
        Feature::new(Geometry::Polygon(vec![ring]), props)
    }

    fn viewport() -> Viewport {
        Viewport::new(100.0, 100.0, [0.0, 0.0, 10.0, 10.0])
    }

    #[test]
    fn viewport_unprojects_from_top_left() {
        let vp = viewport();
        assert_eq!(vp.unproject(ScreenPoint::new(25.0, 75.0)), LonLat::new(2.5, 2.5));
        assert_eq!(vp.unproject(ScreenPoint::new(0.0, 0.0)), LonLat::new(0.0, 10.0));
    }

    #[test]
    fn query_respects_layer_and_filter() {
        let mut r = HeadlessRenderer::new(viewport())
            .with_style_layer("counties-data", vec![square("A", 0.0, 0.0, 5.0), square("B", 5.0, 0.0, 5.0)])
            .with_style_layer("blocks-data", vec![square("C", 0.0, 0.0, 10.0)]);
        let counties = LayerId::from("counties-data");
        // lon 7.5, lat 2.5
        let point = ScreenPoint::new(75.0, 75.0);

        let hits = r.query_rendered_features(point, &[counties.clone()]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].property("fips"), Some(&json!("B")));

        r.set_filter(&counties, &Filter::Nothing);
        assert!(r.query_rendered_features(point, &[counties]).is_empty());
    }

    #[test]
    fn later_layers_are_on_top() {
        let r = HeadlessRenderer::new(viewport())
            .with_style_layer("bottom", vec![square("low", 0.0, 0.0, 10.0)])
            .with_style_layer("top", vec![square("high", 0.0, 0.0, 10.0)]);
        let hits = r.query_rendered_features(
            ScreenPoint::new(50.0, 50.0),
            &["bottom".into(), "top".into()],
        );
        let fips: Vec<_> = hits.iter().map(|f| f.property("fips").cloned()).collect();
        assert_eq!(fips, vec![Some(json!("high")), Some(json!("low"))]);
    }

    #[test]
    fn source_layers_render_source_features_through_filter() {
        let mut r = HeadlessRenderer::new(viewport());
        let mut props = Map::new();
        props.insert("id".to_string(), json!(1));
        let fc = FeatureCollection::new(vec![Feature::new(Geometry::Point(LonLat::new(1.0, 1.0)), props)]);
        r.add_source("submissions", &fc);
        let spec = LayerSpec::new("current-submission".into(), LayerKind::Circle, "submissions")
            .with_filter(Filter::Nothing)
            .with_paint(PaintProperty::CircleRadius, 4.0);
        r.add_layer(&spec);

        assert!(r.rendered_features(&spec.id).is_empty());
        r.set_filter(&spec.id, &Filter::property_eq("id", 1));
        assert_eq!(r.rendered_features(&spec.id).len(), 1);
        assert_eq!(
            r.paint(&spec.id, PaintProperty::CircleRadius),
            Some(&Expression::literal(4.0))
        );
    }

    #[test]
    fn off_and_remove_detach_handlers() {
        let mut r = HeadlessRenderer::default();
        let click = r.on(EventKind::Click, None);
        r.on(EventKind::MouseEnter, Some(&"submissions".into()));
        assert_eq!(r.active_handlers().len(), 2);
        r.off(click);
        assert_eq!(r.active_handlers(), vec![(EventKind::MouseEnter, Some("submissions".into()))]);
        r.remove();
        assert!(r.active_handlers().is_empty());
        assert!(r.is_removed());
        assert_eq!(r.commands().last(), Some(&RenderCommand::Remove));
    }
}
