pub mod event;
pub mod headless;
pub mod renderer;

pub use event::*;
pub use headless::*;
pub use renderer::*;
