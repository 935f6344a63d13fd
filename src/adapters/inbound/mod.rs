pub mod file_snapshot_store;
pub mod file_source;
pub mod seed_source;
pub mod snapshot_store;

pub use file_snapshot_store::*;
pub use file_source::*;
pub use seed_source::*;
pub use snapshot_store::*;
