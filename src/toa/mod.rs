//! # Time-of-arrival records and the ingestion pipeline
//!
//! The submodules cover the left-to-right data flow of the TOA pipeline:
//!
//! 1. [`format`] — line classification and per-dialect parsing,
//! 2. [`reader`] — command state machine and recursive file reading,
//! 3. [`collection`] — the materialized, observatory-grouped table,
//! 4. [`clock_corrections`] — TIME offsets and clock-table interpolation,
//! 5. [`tdb`] — conversion to the barycentric dynamical scale.
//!
//! This module itself defines the single-measurement [`Toa`] record and
//! its flag mapping.

pub mod clock_corrections;
pub mod collection;
pub mod format;
pub mod reader;
pub mod tdb;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{MegaHertz, MicroSecond, ObsCode};
use crate::observatories::{ObservatoryRegistry, BARYCENTER};
use crate::pulstoa_errors::PulstoaError;
use crate::time::MjdPair;

/// One value of a TOA flag: integer, float, or free text.
///
/// Flag values from Tempo2 lines are coerced opportunistically (integer,
/// else float, else text), so a flag set round-trips losslessly aside
/// from that coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlagValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl FlagValue {
    /// Coerce a textual flag value: integer, else float, else text.
    pub fn coerce(raw: &str) -> FlagValue {
        if let Ok(i) = raw.parse::<i64>() {
            FlagValue::Int(i)
        } else if let Ok(f) = raw.parse::<f64>() {
            FlagValue::Float(f)
        } else {
            FlagValue::Str(raw.to_string())
        }
    }

    /// Numeric view of the value, when it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FlagValue::Int(i) => Some(*i as f64),
            FlagValue::Float(f) => Some(*f),
            FlagValue::Str(_) => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Int(i) => write!(f, "{i}"),
            FlagValue::Float(x) => write!(f, "{x}"),
            FlagValue::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Extensible per-row flag mapping; insertion order is irrelevant.
pub type ToaFlags = HashMap<String, FlagValue, ahash::RandomState>;

/// Named time scale a raw TOA timestamp lives in.
///
/// Physical sites record in UTC; barycenter-tagged rows are already in
/// the target dynamical scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToaScale {
    Utc,
    Tdb,
}

/// A single time-of-arrival measurement.
///
/// # Fields
///
/// * `mjd` - the arrival timestamp as a two-part MJD, in `scale`
/// * `error` - TOA uncertainty in microseconds
/// * `freq` - observatory-centric frequency in MHz (infinite for
///   frequency-independent TOAs)
/// * `obs` - canonical observatory name, validated at construction
/// * `flags` - extensible keyword/value pairs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toa {
    pub mjd: MjdPair,
    pub scale: ToaScale,
    pub error: MicroSecond,
    pub freq: MegaHertz,
    pub obs: ObsCode,
    pub flags: ToaFlags,
}

impl Toa {
    /// Construct a validated TOA.
    ///
    /// Arguments
    /// ---------
    /// * `mjd`: arrival time as a two-part MJD
    /// * `error`: uncertainty in microseconds (must be ≥ 0)
    /// * `obs`: canonical observatory name or the barycenter sentinel
    /// * `freq`: observing frequency in MHz
    /// * `flags`: initial flag mapping
    /// * `registry`: known-observatory set the name must resolve against
    ///
    /// Return
    /// ------
    /// * A new [`Toa`], or an error when the observatory is unknown or the
    ///   uncertainty is negative
    pub fn new(
        mjd: MjdPair,
        error: MicroSecond,
        obs: &str,
        freq: MegaHertz,
        flags: ToaFlags,
        registry: &ObservatoryRegistry,
    ) -> Result<Self, PulstoaError> {
        if !registry.contains(obs) {
            return Err(PulstoaError::UnknownObservatory(obs.to_string()));
        }
        if error < 0.0 {
            return Err(PulstoaError::NegativeUncertainty(error));
        }
        let scale = if obs == BARYCENTER {
            ToaScale::Tdb
        } else {
            ToaScale::Utc
        };
        Ok(Toa {
            mjd,
            scale,
            error,
            freq,
            obs: obs.to_string(),
            flags,
        })
    }
}

impl fmt::Display for Toa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:6.3} us error from '{}' at {:.4} MHz",
            self.mjd, self.error, self.obs, self.freq
        )?;
        if !self.flags.is_empty() {
            let mut keys: Vec<&String> = self.flags.keys().collect();
            keys.sort();
            write!(f, " {{")?;
            for (i, k) in keys.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{k}: {}", self.flags[*k])?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod toa_test {
    use super::*;
    use crate::observatories::Observatory;

    fn registry() -> ObservatoryRegistry {
        let mut registry = ObservatoryRegistry::new();
        registry.insert(
            Observatory::new("GBT", &["G", "GBT"], 882.589, -4924.872, 3943.729).unwrap(),
        );
        registry
    }

    #[test]
    fn test_flag_coercion() {
        assert_eq!(FlagValue::coerce("42"), FlagValue::Int(42));
        assert_eq!(FlagValue::coerce("-7"), FlagValue::Int(-7));
        assert_eq!(FlagValue::coerce("12.5"), FlagValue::Float(12.5));
        assert_eq!(FlagValue::coerce("1e3"), FlagValue::Float(1000.0));
        assert_eq!(
            FlagValue::coerce("GUPPI"),
            FlagValue::Str("GUPPI".to_string())
        );
    }

    #[test]
    fn test_construction_validates_observatory() {
        let mjd = MjdPair::new(54567, 0.5);
        let err =
            Toa::new(mjd, 4.5, "Atlantis", 1400.0, ToaFlags::default(), &registry()).unwrap_err();
        assert_eq!(err, PulstoaError::UnknownObservatory("Atlantis".to_string()));
    }

    #[test]
    fn test_construction_validates_uncertainty() {
        let mjd = MjdPair::new(54567, 0.5);
        let err =
            Toa::new(mjd, -1.0, "GBT", 1400.0, ToaFlags::default(), &registry()).unwrap_err();
        assert_eq!(err, PulstoaError::NegativeUncertainty(-1.0));
    }

    #[test]
    fn test_barycenter_rows_are_tdb() {
        let mjd = MjdPair::new(54567, 0.5);
        let toa = Toa::new(
            mjd,
            0.1,
            BARYCENTER,
            f64::INFINITY,
            ToaFlags::default(),
            &registry(),
        )
        .unwrap();
        assert_eq!(toa.scale, ToaScale::Tdb);

        let toa = Toa::new(mjd, 0.1, "GBT", 1400.0, ToaFlags::default(), &registry()).unwrap();
        assert_eq!(toa.scale, ToaScale::Utc);
    }

    #[test]
    fn test_display() {
        let mjd = MjdPair::new(54567, 0.876876876876876);
        let toa = Toa::new(mjd, 4.5, "GBT", 1400.0, ToaFlags::default(), &registry()).unwrap();
        assert_eq!(
            format!("{toa}"),
            "54567.876876876876876:  4.500 us error from 'GBT' at 1400.0000 MHz"
        );
    }
}
