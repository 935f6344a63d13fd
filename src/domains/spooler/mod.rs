pub mod aggregate;
pub mod events;

pub use aggregate::*;
pub use events::*;
