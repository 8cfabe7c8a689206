pub mod cache;
pub mod constants;
pub mod env_state;
pub mod geometry;
pub mod models;
pub mod observatories;
pub mod pulstoa;
pub mod pulstoa_errors;
pub mod time;
pub mod toa;

pub use crate::models::SolarSystemShapiro;
pub use crate::pulstoa::Pulstoa;
pub use crate::pulstoa_errors::PulstoaError;
pub use crate::toa::collection::ToaCollection;
