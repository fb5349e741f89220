//! Map interaction and rendering-state synchronization for the submissions
//! dashboard.
//!
//! [`map::MapView`] is the component the UI embeds. It owns the
//! [`store::ViewStateStore`], routes renderer events through the
//! [`controller::InteractionController`] and keeps renderer layers in step
//! with the store through the [`sync::LayerSynchronizer`].

pub mod config;
pub mod controller;
pub mod error;
pub mod map;
pub mod store;
pub mod sync;
pub mod tooltip;

pub use config::MapConfig;
pub use controller::{InteractionController, Outbound};
pub use error::{ConfigError, ErrorReport};
pub use map::MapView;
pub use store::{FillEncoding, HoverState, RadiusEncoding, Slice, ViewStateStore};
pub use sync::LayerSynchronizer;
pub use tooltip::Tooltip;
