use std::collections::BTreeSet;
use std::sync::Arc;

use formats::geojson::{Feature, FeatureCollection};
use formats::submission::{Submission, to_point_collection};
use foundation::geo::ScreenPoint;
use layers::layer::GeographyLevel;
use layers::symbology::{Color, Domain, PaintValue};
use runtime::event_bus::{Event, EventBus};
use serde_json::{Map, Value};

/// Independently changing parts of the view state.
///
/// The declaration order is the order in which observers are notified: the
/// point source always goes out before anything that paints points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slice {
    Points,
    Geography,
    FillEncoding,
    RadiusEncoding,
    Selection,
    Hover,
}

impl Slice {
    pub const ALL: [Slice; 6] = [
        Slice::Points,
        Slice::Geography,
        Slice::FillEncoding,
        Slice::RadiusEncoding,
        Slice::Selection,
        Slice::Hover,
    ];
}

/// Metric driving the polygon fill color.
#[derive(Debug, Clone, PartialEq)]
pub struct FillEncoding {
    pub metric: Option<String>,
    pub domain: Domain,
    pub range: [PaintValue; 2],
}

impl Default for FillEncoding {
    fn default() -> Self {
        Self {
            metric: None,
            domain: Domain::default(),
            range: [Color::WHITE.into(), Color::rgb(0, 0, 0).into()],
        }
    }
}

/// Metric driving the point radius.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusEncoding {
    pub metric: Option<String>,
    pub domain: Domain,
    pub range: [f64; 2],
}

impl Default for RadiusEncoding {
    fn default() -> Self {
        Self {
            metric: None,
            domain: Domain::default(),
            range: [2.0, 20.0],
        }
    }
}

/// The hovered point: its properties and where the pointer entered it.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverState {
    pub properties: Map<String, Value>,
    pub position: ScreenPoint,
}

/// Single source of truth for the map view.
///
/// Every effective change is recorded on an internal change bus as the
/// [`Slice`] it touched; setting a slice to its current value records
/// nothing. Selection and hover are written only by the interaction
/// controller.
#[derive(Debug, Default)]
pub struct ViewStateStore {
    submissions: Option<Arc<[Submission]>>,
    points: Option<FeatureCollection>,
    geography: GeographyLevel,
    fill: FillEncoding,
    radius: RadiusEncoding,
    selection: Option<Feature>,
    hover: Option<HoverState>,
    changes: EventBus<Slice>,
}

impl ViewStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Option<&Arc<[Submission]>> {
        self.submissions.as_ref()
    }

    pub fn points(&self) -> Option<&FeatureCollection> {
        self.points.as_ref()
    }

    pub fn geography(&self) -> GeographyLevel {
        self.geography
    }

    pub fn fill(&self) -> &FillEncoding {
        &self.fill
    }

    pub fn radius(&self) -> &RadiusEncoding {
        &self.radius
    }

    pub fn selection(&self) -> Option<&Feature> {
        self.selection.as_ref()
    }

    pub fn hover(&self) -> Option<&HoverState> {
        self.hover.as_ref()
    }

    /// Changes recorded since the last drain.
    pub fn pending_changes(&self) -> &[Event<Slice>] {
        self.changes.events()
    }

    /// Replaces the submission sequence and rebuilds the point collection.
    ///
    /// The sequence is compared by identity: handing in the same `Arc` again
    /// is a no-op, a new `Arc` always rebuilds. `None` means no data has
    /// arrived yet and leaves the current points in place. Selection and
    /// hover are untouched.
    pub fn set_submissions(&mut self, submissions: Option<Arc<[Submission]>>) -> bool {
        let Some(submissions) = submissions else {
            return false;
        };
        if self
            .submissions
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &submissions))
        {
            return false;
        }

        let points = to_point_collection(Some(&submissions[..]));
        let count = points.as_ref().map_or(0, FeatureCollection::len);
        self.points = points;
        self.submissions = Some(submissions);
        self.changes
            .emit(Slice::Points, format!("rebuilt {count} point features"));
        true
    }

    pub fn set_geography(&mut self, level: GeographyLevel) -> bool {
        if self.geography == level {
            return false;
        }
        self.geography = level;
        self.changes
            .emit(Slice::Geography, format!("geography -> {}", level.as_str()));
        true
    }

    pub fn set_fill_encoding(&mut self, fill: FillEncoding) -> bool {
        if self.fill == fill {
            return false;
        }
        let message = format!("fill metric -> {:?}", fill.metric);
        self.fill = fill;
        self.changes.emit(Slice::FillEncoding, message);
        true
    }

    pub fn set_radius_encoding(&mut self, radius: RadiusEncoding) -> bool {
        if self.radius == radius {
            return false;
        }
        let message = format!("radius metric -> {:?}", radius.metric);
        self.radius = radius;
        self.changes.emit(Slice::RadiusEncoding, message);
        true
    }

    pub(crate) fn set_selection(&mut self, selection: Option<Feature>) -> bool {
        if self.selection == selection {
            return false;
        }
        let message = match &selection {
            Some(f) => format!("selected {:?}", f.id),
            None => "selection cleared".to_string(),
        };
        self.selection = selection;
        self.changes.emit(Slice::Selection, message);
        true
    }

    pub(crate) fn set_hover(&mut self, hover: Option<HoverState>) -> bool {
        if self.hover == hover {
            return false;
        }
        let message = if hover.is_some() { "hover" } else { "hover cleared" };
        self.hover = hover;
        self.changes.emit(Slice::Hover, message);
        true
    }

    /// Drains recorded changes, each slice once, in notification order.
    pub(crate) fn take_changes(&mut self) -> BTreeSet<Slice> {
        self.changes.drain_kinds()
    }
}
