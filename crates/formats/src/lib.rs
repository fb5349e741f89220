pub mod geojson;
pub mod submission;

pub use self::geojson::*;
pub use submission::*;
