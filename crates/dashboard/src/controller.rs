use compute::analysis::spatial::points_within;
use formats::geojson::{Feature, FeatureCollection};
use foundation::geo::ScreenPoint;
use layers::filter::Filter;
use layers::layer::LayerId;
use renderer::event::Cursor;
use renderer::renderer::MapRenderer;
use tracing::debug;

use crate::config::MapConfig;
use crate::store::{HoverState, ViewStateStore};

/// Notifications for the component's parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// The selected geographic unit changed (`setCurrentFeature`).
    CurrentFeature(Option<Feature>),
    /// Submissions inside the newly selected unit (`setCurrentFeatureSubmissions`).
    CurrentFeatureSubmissions(FeatureCollection),
}

/// Turns pointer events into selection and hover transitions.
///
/// Selection and hover are independent axes. Handlers always read the store
/// as it is when they run, never a copy taken earlier. Renderer side effects
/// are derived from the store after each transition, so replaying them is
/// harmless.
#[derive(Debug, Clone)]
pub struct InteractionController {
    highlight_layer: LayerId,
    hover_layer: LayerId,
    feature_id_property: String,
    point_id_property: String,
}

impl InteractionController {
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            highlight_layer: config.highlight_layer.clone(),
            hover_layer: config.hover_layer.clone(),
            feature_id_property: config.feature_id_property.clone(),
            point_id_property: config.point_id_property.clone(),
        }
    }

    /// Click on the map: select, reselect or clear the geographic unit under
    /// `point` on the active geography's data layer.
    ///
    /// A click that hits no unit changes nothing.
    pub fn on_click(
        &self,
        store: &mut ViewStateStore,
        renderer: &mut dyn MapRenderer,
        point: ScreenPoint,
    ) -> Vec<Outbound> {
        let layer = store.geography().data_layer();
        let Some(clicked) = renderer
            .query_rendered_features(point, std::slice::from_ref(&layer))
            .into_iter()
            .next()
        else {
            debug!("click at ({}, {}) hit nothing on {layer}", point.x, point.y);
            return Vec::new();
        };

        let clicked_id = clicked.property(&self.feature_id_property).cloned();
        let current_id = store
            .selection()
            .and_then(|f| f.property(&self.feature_id_property))
            .cloned();

        if clicked_id.is_some() && clicked_id == current_id {
            debug!("deselected {:?}", clicked_id);
            store.set_selection(None);
            self.apply_highlight(store, renderer);
            return vec![Outbound::CurrentFeature(None)];
        }

        let within = store
            .points()
            .map(|points| points_within(points, &clicked))
            .unwrap_or_default();
        debug!("selected {:?}: {} submissions within", clicked_id, within.len());

        store.set_selection(Some(clicked.clone()));
        self.apply_highlight(store, renderer);
        vec![
            Outbound::CurrentFeature(Some(clicked)),
            Outbound::CurrentFeatureSubmissions(within),
        ]
    }

    /// Adopts a selection pushed in by the parent. No spatial query is run;
    /// the parent already knows what it selected.
    pub fn adopt_selection(&self, store: &mut ViewStateStore, feature: Option<Feature>) -> bool {
        store.set_selection(feature)
    }

    /// Pointer entered a submission point. Replaces any previous hover,
    /// whether or not a leave was seen for it.
    pub fn on_pointer_enter(
        &self,
        store: &mut ViewStateStore,
        renderer: &mut dyn MapRenderer,
        point: ScreenPoint,
        features: &[Feature],
    ) {
        let Some(hovered) = features.first() else {
            return;
        };
        store.set_hover(Some(HoverState {
            properties: hovered.properties.clone(),
            position: point,
        }));
        self.apply_hover(store, renderer);
        renderer.set_cursor(Cursor::Pointer);
    }

    pub fn on_pointer_leave(&self, store: &mut ViewStateStore, renderer: &mut dyn MapRenderer) {
        store.set_hover(None);
        self.apply_hover(store, renderer);
        renderer.set_cursor(Cursor::Default);
    }

    /// Filter for the highlight layer matching the current selection.
    pub fn highlight_filter(&self, store: &ViewStateStore) -> Filter {
        store
            .selection()
            .and_then(|f| f.property(&self.feature_id_property))
            .map_or(Filter::Nothing, |id| {
                Filter::property_eq(self.feature_id_property.clone(), id.clone())
            })
    }

    /// Filter for the hover layer matching the hovered point.
    pub fn hover_filter(&self, store: &ViewStateStore) -> Filter {
        store
            .hover()
            .and_then(|h| h.properties.get(&self.point_id_property))
            .map_or(Filter::Nothing, |id| {
                Filter::property_eq(self.point_id_property.clone(), id.clone())
            })
    }

    pub fn apply_highlight(&self, store: &ViewStateStore, renderer: &mut dyn MapRenderer) {
        renderer.set_filter(&self.highlight_layer, &self.highlight_filter(store));
    }

    pub fn apply_hover(&self, store: &ViewStateStore, renderer: &mut dyn MapRenderer) {
        renderer.set_filter(&self.hover_layer, &self.hover_filter(store));
    }
}
