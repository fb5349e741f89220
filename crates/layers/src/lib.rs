pub mod filter;
pub mod layer;
pub mod symbology;

pub use filter::*;
pub use layer::*;
pub use symbology::*;
