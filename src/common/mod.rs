pub mod error;
pub mod event;
pub mod aggregate;
pub mod snapshot;
pub mod clock;

pub use error::*;
pub use event::*;
pub use aggregate::*;
pub use snapshot::*;
pub use clock::*;
