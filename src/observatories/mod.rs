//! # Observatories and site registry
//!
//! This module gathers **observatory handling**: the [`Observatory`] type
//! (name, aliases, Earth-fixed geocentric position, attached clock
//! correction table) and the [`ObservatoryRegistry`] used to resolve the
//! site codes found in TOA files.
//!
//! ## Alias resolution
//!
//! TOA files identify sites by short codes (`g`, `GBT`, `ao`, …). The
//! barycenter aliases `@`, `SSB`, `BARY` and `BARYCENTER` resolve to the
//! sentinel [`BARYCENTER`] identifier, which stands for a virtual site at
//! the solar-system barycenter: its timestamps are already in the
//! barycentric scale, it has no physical clock, and no Earth-fixed
//! position. Every other code must match the name or one of the aliases of
//! a registered observatory, otherwise resolution fails with
//! [`PulstoaError::UnknownObservatory`].
//!
//! ## Units
//!
//! - Site positions: geocentric Earth-fixed (ITRF) coordinates in **km**.
//! - Clock corrections: **microseconds**, breakpoint epochs in **MJD**.
//!
//! The registry is populated programmatically by the caller; this crate
//! does not own the metadata table format.

pub mod clock;

use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;
use nalgebra::Vector3;
use ordered_float::NotNan;

use crate::constants::{Kilometer, ObsCode};
use crate::observatories::clock::ClockCorrectionTable;
use crate::pulstoa_errors::PulstoaError;

/// Sentinel identifier for the solar-system barycenter pseudo-site.
pub const BARYCENTER: &str = "Barycenter";

/// True when a site code is one of the recognized barycenter aliases.
pub fn is_barycenter_alias(code: &str) -> bool {
    matches!(code, "@" | "SSB" | "BARY" | "BARYCENTER")
}

/// A physical observing site.
///
/// # Fields
///
/// * `name` - canonical observatory name, the grouping key of the TOA table
/// * `aliases` - site codes this observatory answers to in TOA files
#[derive(Debug, Clone)]
pub struct Observatory {
    pub name: String,
    pub aliases: Vec<String>,
    itrf_km: [NotNan<f64>; 3],
    clock_table: Option<ClockCorrectionTable>,
}

impl Observatory {
    /// Create a new observatory from geocentric Earth-fixed coordinates.
    ///
    /// Arguments
    /// ---------
    /// * `name`: canonical observatory name
    /// * `aliases`: site codes used in TOA files (matched exactly, after
    ///   the parser uppercases single-character Princeton codes)
    /// * `x`, `y`, `z`: geocentric ITRF position in kilometers
    ///
    /// Return
    /// ------
    /// * A new [`Observatory`], or [`PulstoaError::InvalidSiteCoordinates`]
    ///   if any coordinate is NaN
    pub fn new(
        name: &str,
        aliases: &[&str],
        x: Kilometer,
        y: Kilometer,
        z: Kilometer,
    ) -> Result<Self, PulstoaError> {
        let wrap = |v: f64| {
            NotNan::new(v).map_err(|_| PulstoaError::InvalidSiteCoordinates(name.to_string()))
        };
        Ok(Observatory {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            itrf_km: [wrap(x)?, wrap(y)?, wrap(z)?],
            clock_table: None,
        })
    }

    /// Attach a clock correction table to this site.
    pub fn with_clock_table(mut self, table: ClockCorrectionTable) -> Self {
        self.clock_table = Some(table);
        self
    }

    /// The site's clock correction table, if one was attached.
    pub fn clock_table(&self) -> Option<&ClockCorrectionTable> {
        self.clock_table.as_ref()
    }

    /// Geocentric Earth-fixed position in km.
    pub fn geocentric_km(&self) -> Vector3<f64> {
        Vector3::new(
            self.itrf_km[0].into_inner(),
            self.itrf_km[1].into_inner(),
            self.itrf_km[2].into_inner(),
        )
    }
}

/// Lookup table from canonical name to [`Observatory`].
///
/// Shared ownership through `Arc` lets the pipeline stages hold on to a
/// site without copying its clock table.
#[derive(Debug, Clone, Default)]
pub struct ObservatoryRegistry {
    observatories: HashMap<String, Arc<Observatory>, RandomState>,
}

impl ObservatoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observatory, returning the shared handle.
    pub fn insert(&mut self, observatory: Observatory) -> Arc<Observatory> {
        let handle = Arc::new(observatory);
        self.observatories
            .insert(handle.name.clone(), handle.clone());
        handle
    }

    /// Look up a site by canonical name.
    pub fn get(&self, name: &str) -> Option<&Arc<Observatory>> {
        self.observatories.get(name)
    }

    /// True when `name` is a registered site or the barycenter sentinel.
    pub fn contains(&self, name: &str) -> bool {
        name == BARYCENTER || self.observatories.contains_key(name)
    }

    /// Number of registered physical sites.
    pub fn len(&self) -> usize {
        self.observatories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observatories.is_empty()
    }

    /// Resolve a TOA-file site code to a canonical observatory name.
    ///
    /// Barycenter aliases map to [`BARYCENTER`]; everything else is matched
    /// against registered names and alias sets.
    ///
    /// Arguments
    /// ---------
    /// * `code`: the site code as found in the TOA file (already uppercased
    ///   by the parser where the dialect requires it)
    ///
    /// Return
    /// ------
    /// * The canonical name, or [`PulstoaError::UnknownObservatory`]
    pub fn resolve_alias(&self, code: &str) -> Result<ObsCode, PulstoaError> {
        if is_barycenter_alias(code) {
            return Ok(BARYCENTER.to_string());
        }
        for (name, obs) in &self.observatories {
            if name == code || obs.aliases.iter().any(|a| a == code) {
                return Ok(name.clone());
            }
        }
        Err(PulstoaError::UnknownObservatory(code.to_string()))
    }
}

#[cfg(test)]
mod observatories_test {
    use super::*;

    fn test_registry() -> ObservatoryRegistry {
        let mut registry = ObservatoryRegistry::new();
        registry.insert(
            Observatory::new("GBT", &["G", "GBT", "1"], 882.589, -4924.872, 3943.729).unwrap(),
        );
        registry.insert(
            Observatory::new("Arecibo", &["AO", "3"], 2390.487, -5564.731, 1994.721).unwrap(),
        );
        registry
    }

    #[test]
    fn test_alias_resolution() {
        let registry = test_registry();
        assert_eq!(registry.resolve_alias("G").unwrap(), "GBT");
        assert_eq!(registry.resolve_alias("GBT").unwrap(), "GBT");
        assert_eq!(registry.resolve_alias("AO").unwrap(), "Arecibo");
        assert_eq!(registry.resolve_alias("@").unwrap(), BARYCENTER);
        assert_eq!(registry.resolve_alias("SSB").unwrap(), BARYCENTER);
        assert_eq!(registry.resolve_alias("BARYCENTER").unwrap(), BARYCENTER);

        let err = registry.resolve_alias("XYZ").unwrap_err();
        assert_eq!(err, PulstoaError::UnknownObservatory("XYZ".to_string()));
    }

    #[test]
    fn test_contains_barycenter() {
        let registry = test_registry();
        assert!(registry.contains(BARYCENTER));
        assert!(registry.contains("GBT"));
        assert!(!registry.contains("Parkes"));
    }

    #[test]
    fn test_nan_coordinates_rejected() {
        let err = Observatory::new("Bad", &["B"], f64::NAN, 0.0, 0.0).unwrap_err();
        assert_eq!(err, PulstoaError::InvalidSiteCoordinates("Bad".to_string()));
    }
}
