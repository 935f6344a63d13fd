pub mod floor_service;

pub use floor_service::*;
