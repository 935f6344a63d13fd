pub mod assignment;
pub mod context;
mod dispatch;
mod handlers;
pub mod layout;
mod linking;
pub mod models;
pub mod ports;
pub mod sync;
pub mod views;

pub use assignment::ManStrategy;
pub use context::{Floor, FloorSettings};
pub use layout::{plan_layout, FloorLayout, Lanes};
pub use models::*;
pub use ports::FloorModelSource;
pub use sync::{DofferSnapshot, SleeverSnapshot};
pub use views::*;
