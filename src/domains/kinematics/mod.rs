pub mod events;
pub mod locator;

pub use events::*;
pub use locator::*;
