pub mod analysis;

pub use analysis::spatial::{SpatialAnalysis, points_within};
pub use analysis::statistics::Statistics;
