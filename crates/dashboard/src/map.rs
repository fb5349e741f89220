use std::sync::Arc;

use formats::geojson::{Feature, FeatureCollection};
use formats::submission::Submission;
use layers::filter::Filter;
use layers::layer::{GeographyLevel, LayerId, LayerKind, LayerSpec, PaintProperty};
use renderer::event::{EventKind, HandlerId, MapEvent};
use renderer::renderer::{MapRenderer, RendererFactory};
use tracing::{debug, info};

use crate::config::MapConfig;
use crate::controller::{InteractionController, Outbound};
use crate::store::{FillEncoding, RadiusEncoding, Slice, ViewStateStore};
use crate::sync::LayerSynchronizer;
use crate::tooltip::Tooltip;

/// Renderer lifecycle. Layer operations need a `Ready` renderer.
enum Lifecycle<R> {
    /// No points yet, so no renderer.
    Waiting,
    /// Renderer created, style still loading.
    Loading(R),
    Ready(R),
    Disposed,
}

#[derive(Debug, Clone, PartialEq)]
struct Subscription {
    handler: HandlerId,
    kind: EventKind,
    layer: Option<LayerId>,
}

impl Subscription {
    fn accepts(&self, event: &MapEvent) -> bool {
        self.kind == event.kind && (self.layer.is_none() || self.layer == event.layer)
    }
}

/// The map component.
///
/// Props are pushed in with the `set_*` methods and renderer events with
/// [`MapView::handle_event`], in whatever order the host delivers them.
/// Changes made before the renderer is ready are kept in the store and
/// applied in one full sync once it is.
pub struct MapView<F: RendererFactory> {
    config: MapConfig,
    factory: F,
    lifecycle: Lifecycle<F::Renderer>,
    store: ViewStateStore,
    controller: InteractionController,
    sync: LayerSynchronizer,
    subscriptions: Vec<Subscription>,
    outbound: Vec<Outbound>,
}

impl<F: RendererFactory> MapView<F> {
    pub fn new(config: MapConfig, factory: F) -> Self {
        let controller = InteractionController::from_config(&config);
        let sync = LayerSynchronizer::from_config(&config);
        Self {
            config,
            factory,
            lifecycle: Lifecycle::Waiting,
            store: ViewStateStore::new(),
            controller,
            sync,
            subscriptions: Vec::new(),
            outbound: Vec::new(),
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn store(&self) -> &ViewStateStore {
        &self.store
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Ready(_))
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Disposed)
    }

    /// The live renderer, for inspection. `None` before creation and after
    /// disposal.
    pub fn renderer(&self) -> Option<&F::Renderer> {
        match &self.lifecycle {
            Lifecycle::Loading(r) | Lifecycle::Ready(r) => Some(r),
            Lifecycle::Waiting | Lifecycle::Disposed => None,
        }
    }

    pub fn set_submissions(&mut self, submissions: Option<Arc<[Submission]>>) {
        if self.is_disposed() || !self.store.set_submissions(submissions) {
            return;
        }
        self.ensure_renderer();
        self.flush();
    }

    pub fn set_geography(&mut self, level: GeographyLevel) {
        if !self.is_disposed() && self.store.set_geography(level) {
            self.flush();
        }
    }

    pub fn set_fill_encoding(&mut self, fill: FillEncoding) {
        if !self.is_disposed() && self.store.set_fill_encoding(fill) {
            self.flush();
        }
    }

    pub fn set_radius_encoding(&mut self, radius: RadiusEncoding) {
        if !self.is_disposed() && self.store.set_radius_encoding(radius) {
            self.flush();
        }
    }

    /// Selection pushed in by the parent. Publishes nothing back.
    pub fn set_current_feature(&mut self, feature: Option<Feature>) {
        if self.is_disposed() || !self.controller.adopt_selection(&mut self.store, feature) {
            return;
        }
        if let Lifecycle::Ready(r) = &mut self.lifecycle {
            self.controller.apply_highlight(&self.store, r);
        }
        self.flush();
    }

    /// Routes a renderer event. Events without an active subscription are
    /// dropped, which includes everything after [`MapView::dispose`].
    pub fn handle_event(&mut self, event: MapEvent) {
        if !self.subscriptions.iter().any(|s| s.accepts(&event)) {
            debug!("dropped unsubscribed {} event", event.kind.as_str());
            return;
        }
        match event.kind {
            EventKind::Load => self.on_load(),
            EventKind::Click => {
                if let Lifecycle::Ready(r) = &mut self.lifecycle {
                    let out = self.controller.on_click(&mut self.store, r, event.point);
                    self.outbound.extend(out);
                }
            }
            EventKind::MouseEnter => {
                if let Lifecycle::Ready(r) = &mut self.lifecycle {
                    self.controller
                        .on_pointer_enter(&mut self.store, r, event.point, &event.features);
                }
            }
            EventKind::MouseLeave => {
                if let Lifecycle::Ready(r) = &mut self.lifecycle {
                    self.controller.on_pointer_leave(&mut self.store, r);
                }
            }
        }
        self.flush();
    }

    /// Tooltip for the hovered submission, if any.
    pub fn tooltip(&self) -> Option<Tooltip> {
        self.store
            .hover()
            .map(|hover| Tooltip::for_hover(hover, &self.config.tooltip))
    }

    /// Notifications for the parent, oldest first.
    pub fn drain_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbound)
    }

    /// Detaches every subscription and releases the renderer.
    pub fn dispose(&mut self) {
        let lifecycle = std::mem::replace(&mut self.lifecycle, Lifecycle::Disposed);
        if let Lifecycle::Loading(mut r) | Lifecycle::Ready(mut r) = lifecycle {
            for sub in self.subscriptions.drain(..) {
                r.off(sub.handler);
            }
            r.remove();
            info!("map renderer removed");
        }
        self.subscriptions.clear();
    }

    fn ensure_renderer(&mut self) {
        if !matches!(self.lifecycle, Lifecycle::Waiting)
            || !self.store.points().is_some_and(|p| !p.is_empty())
        {
            return;
        }
        let mut r = self.factory.create(&self.config.style);
        self.subscribe(&mut r, EventKind::Load, None);
        info!("map renderer created for {}", self.config.style);
        self.lifecycle = Lifecycle::Loading(r);
    }

    fn subscribe(&mut self, r: &mut F::Renderer, kind: EventKind, layer: Option<LayerId>) {
        let handler = r.on(kind, layer.as_ref());
        self.subscriptions.push(Subscription {
            handler,
            kind,
            layer,
        });
    }

    fn on_load(&mut self) {
        let lifecycle = std::mem::replace(&mut self.lifecycle, Lifecycle::Waiting);
        let mut r = match lifecycle {
            Lifecycle::Loading(r) => r,
            other => {
                self.lifecycle = other;
                return;
            }
        };

        r.resize();
        let empty = FeatureCollection::default();
        let points = self.store.points().unwrap_or(&empty);
        r.add_source(&self.config.source_id, points);
        r.add_layer(&self.points_layer());
        r.add_layer(&self.hover_layer());

        self.subscribe(&mut r, EventKind::Click, None);
        let points_layer = self.config.points_layer.clone();
        self.subscribe(&mut r, EventKind::MouseEnter, Some(points_layer.clone()));
        self.subscribe(&mut r, EventKind::MouseLeave, Some(points_layer));

        self.store.take_changes();
        let all = Slice::ALL.into_iter().collect();
        let ran = self.sync.dispatch(&all, &self.store, &mut r);
        self.controller.apply_highlight(&self.store, &mut r);
        self.controller.apply_hover(&self.store, &mut r);

        info!("map ready, {ran} layer observers synced");
        self.lifecycle = Lifecycle::Ready(r);
    }

    /// Applies pending store changes to a ready renderer. Before ready the
    /// changes stay queued and are superseded by the full sync at load.
    fn flush(&mut self) {
        let Lifecycle::Ready(r) = &mut self.lifecycle else {
            return;
        };
        let changed = self.store.take_changes();
        if !changed.is_empty() {
            self.sync.dispatch(&changed, &self.store, r);
        }
    }

    fn points_layer(&self) -> LayerSpec {
        let style = &self.config.points;
        LayerSpec::new(
            self.config.points_layer.clone(),
            LayerKind::Circle,
            self.config.source_id.clone(),
        )
        .with_paint(PaintProperty::CircleRadius, style.radius)
        .with_paint(PaintProperty::CircleColor, style.color)
        .with_paint(PaintProperty::CircleOpacity, style.opacity)
        .with_paint(PaintProperty::CircleStrokeColor, style.stroke_color)
        .with_paint(PaintProperty::CircleStrokeWidth, style.stroke_width)
    }

    fn hover_layer(&self) -> LayerSpec {
        let style = &self.config.points;
        LayerSpec::new(
            self.config.hover_layer.clone(),
            LayerKind::Circle,
            self.config.source_id.clone(),
        )
        .with_paint(PaintProperty::CircleRadius, style.radius)
        .with_paint(PaintProperty::CircleColor, style.color)
        .with_paint(PaintProperty::CircleOpacity, style.hover_opacity)
        .with_paint(PaintProperty::CircleStrokeColor, style.stroke_color)
        .with_paint(PaintProperty::CircleStrokeWidth, style.stroke_width)
        .with_filter(Filter::Nothing)
    }
}
