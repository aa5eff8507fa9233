pub mod error;
pub mod models;
pub mod params;
pub mod query;
pub mod service;
pub mod validation;

pub use service::SensorService;
