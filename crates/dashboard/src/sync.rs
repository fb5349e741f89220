use std::collections::BTreeSet;

use layers::filter::Filter;
use layers::layer::{GeographyLevel, LayerId, PaintProperty};
use layers::symbology::{
    Expression, PaintValue, resolve_color_expression, resolve_radius_expression,
};
use renderer::renderer::MapRenderer;
use tracing::debug;

use crate::config::{FillStyle, MapConfig};
use crate::store::{Slice, ViewStateStore};

/// Reacts to changes of specific store slices by updating the renderer.
pub trait Observer {
    fn name(&self) -> &'static str;

    /// Slices this observer reads. It runs when any of them changed.
    fn slices(&self) -> &'static [Slice];

    fn apply(&self, store: &ViewStateStore, renderer: &mut dyn MapRenderer);
}

/// Pushes the rebuilt point collection into the submissions source.
pub struct PointSource {
    source_id: String,
}

impl Observer for PointSource {
    fn name(&self) -> &'static str {
        "point-source"
    }

    fn slices(&self) -> &'static [Slice] {
        &[Slice::Points]
    }

    fn apply(&self, store: &ViewStateStore, renderer: &mut dyn MapRenderer) {
        if let Some(points) = store.points() {
            renderer.set_source_data(&self.source_id, points);
        }
    }
}

/// Shows the fill/stroke pair of the current geography and hides the other.
pub struct GeographyOutlines;

impl Observer for GeographyOutlines {
    fn name(&self) -> &'static str {
        "geography-outlines"
    }

    fn slices(&self) -> &'static [Slice] {
        &[Slice::Geography]
    }

    fn apply(&self, store: &ViewStateStore, renderer: &mut dyn MapRenderer) {
        let current = store.geography();
        for level in GeographyLevel::ALL {
            let filter = if level == current {
                Filter::All
            } else {
                Filter::Nothing
            };
            renderer.set_filter(&level.fill_layer(), &filter);
            renderer.set_filter(&level.stroke_layer(), &filter);
        }
    }
}

/// Colors geographic units by the fill metric.
pub struct UnitFill {
    style: FillStyle,
}

impl Observer for UnitFill {
    fn name(&self) -> &'static str {
        "unit-fill"
    }

    fn slices(&self) -> &'static [Slice] {
        &[Slice::FillEncoding]
    }

    fn apply(&self, store: &ViewStateStore, renderer: &mut dyn MapRenderer) {
        let fill = store.fill();
        for level in GeographyLevel::ALL {
            let layer = level.data_layer();
            let Some(metric) = fill.metric.as_deref() else {
                let flat = Expression::literal(self.style.flat_color);
                renderer.set_paint_property(&layer, PaintProperty::FillColor, &flat);
                continue;
            };
            let opacity = Expression::literal(self.style.active_opacity);
            renderer.set_paint_property(&layer, PaintProperty::FillOpacity, &opacity);
            let color = resolve_color_expression(
                metric,
                fill.domain,
                fill.range,
                PaintValue::Color(self.style.missing_color),
            );
            renderer.set_paint_property(&layer, PaintProperty::FillColor, &color);
        }
    }
}

/// Sizes submission points (and the hover point) by the radius metric.
pub struct PointRadius {
    layers: [LayerId; 2],
    missing_radius: f64,
}

impl Observer for PointRadius {
    fn name(&self) -> &'static str {
        "point-radius"
    }

    fn slices(&self) -> &'static [Slice] {
        &[Slice::RadiusEncoding]
    }

    fn apply(&self, store: &ViewStateStore, renderer: &mut dyn MapRenderer) {
        let radius = store.radius();
        let expr = resolve_radius_expression(
            radius.metric.as_deref(),
            radius.domain,
            radius.range,
            self.missing_radius,
        );
        for layer in &self.layers {
            renderer.set_paint_property(layer, PaintProperty::CircleRadius, &expr);
        }
    }
}

/// Keeps renderer layers consistent with the store.
///
/// Observers run in [`Slice`] order, so the point source is always updated
/// before any paint that reads point properties. An observer depending on
/// several changed slices runs once.
pub struct LayerSynchronizer {
    observers: Vec<Box<dyn Observer>>,
}

impl LayerSynchronizer {
    pub fn new(observers: Vec<Box<dyn Observer>>) -> Self {
        Self { observers }
    }

    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(vec![
            Box::new(PointSource {
                source_id: config.source_id.clone(),
            }),
            Box::new(GeographyOutlines),
            Box::new(UnitFill {
                style: config.fill.clone(),
            }),
            Box::new(PointRadius {
                layers: [config.points_layer.clone(), config.hover_layer.clone()],
                missing_radius: config.points.radius,
            }),
        ])
    }

    /// Runs observers depending on `changed`. Returns how many ran.
    pub fn dispatch(
        &self,
        changed: &BTreeSet<Slice>,
        store: &ViewStateStore,
        renderer: &mut dyn MapRenderer,
    ) -> usize {
        let mut ran = vec![false; self.observers.len()];
        for slice in changed {
            for (i, observer) in self.observers.iter().enumerate() {
                if ran[i] || !observer.slices().contains(slice) {
                    continue;
                }
                debug!("sync {} after {:?} change", observer.name(), slice);
                observer.apply(store, renderer);
                ran[i] = true;
            }
        }
        ran.into_iter().filter(|r| *r).count()
    }
}
