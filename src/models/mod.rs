//! # Timing-delay models
//!
//! Consumers of the geometry-augmented TOA table. Only the solar-system
//! Shapiro delay lives here; the broader timing-model framework (spin,
//! astrometry, binary models, noise) is an external collaborator.

pub mod solar_system_shapiro;

pub use solar_system_shapiro::SolarSystemShapiro;
