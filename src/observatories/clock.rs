//! Observatory clock correction tables.
//!
//! Each physical site carries an ordered sequence of (epoch, correction)
//! breakpoints mapping its local clock onto the reference time standard.
//! Lookups between breakpoints are linearly interpolated; lookups outside
//! the covered span are flat-extrapolated from the nearest endpoint, which
//! callers must surface as a data-quality warning.

use serde::{Deserialize, Serialize};

use crate::constants::{MicroSecond, MJD};
use crate::pulstoa_errors::PulstoaError;

/// Per-site clock corrections: breakpoints strictly increasing in epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockCorrectionTable {
    epochs: Vec<MJD>,
    corrections: Vec<MicroSecond>,
}

/// How far outside the table a lookup fell, if it did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extrapolation {
    /// The epoch was inside the covered span.
    None,
    /// The epoch was outside; the payload is the distance in days to the
    /// nearest table endpoint.
    Flat(f64),
}

/// Tuning knobs for the clock correction stage.
///
/// `max_extrapolation_days` bounds how far outside the table a TOA may
/// fall before the warning escalates to error severity. Extrapolation is
/// never refused; the bound only controls reporting.
#[derive(Debug, Clone, Copy)]
pub struct ClockCorrectionConfig {
    pub max_extrapolation_days: Option<f64>,
}

impl Default for ClockCorrectionConfig {
    fn default() -> Self {
        ClockCorrectionConfig {
            max_extrapolation_days: None,
        }
    }
}

impl ClockCorrectionTable {
    /// Build a table from (epoch, correction) breakpoints.
    ///
    /// Arguments
    /// ---------
    /// * `points`: breakpoints, epochs in MJD, corrections in microseconds
    ///
    /// Return
    /// ------
    /// * A new table, or an error if the breakpoints are empty or the
    ///   epochs are not strictly increasing
    pub fn new(
        points: impl IntoIterator<Item = (MJD, MicroSecond)>,
    ) -> Result<Self, PulstoaError> {
        let (epochs, corrections): (Vec<MJD>, Vec<MicroSecond>) = points.into_iter().unzip();
        if epochs.is_empty() {
            return Err(PulstoaError::EmptyClockTable);
        }
        if epochs.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PulstoaError::NonMonotonicClockTable);
        }
        Ok(ClockCorrectionTable {
            epochs,
            corrections,
        })
    }

    /// First and last breakpoint epochs.
    pub fn span(&self) -> (MJD, MJD) {
        (self.epochs[0], *self.epochs.last().unwrap())
    }

    /// Correction at a given epoch, with the extrapolation status.
    ///
    /// Inside the span the correction is linearly interpolated between the
    /// two bracketing breakpoints; outside it is the nearest endpoint value
    /// (flat extrapolation).
    pub fn correction_at(&self, t: MJD) -> (MicroSecond, Extrapolation) {
        let (first, last) = self.span();
        if t < first {
            return (self.corrections[0], Extrapolation::Flat(first - t));
        }
        if t > last {
            return (
                *self.corrections.last().unwrap(),
                Extrapolation::Flat(t - last),
            );
        }
        // partition_point: index of the first epoch > t
        let hi = self.epochs.partition_point(|e| *e <= t);
        if hi == self.epochs.len() {
            // t equals the last breakpoint
            return (*self.corrections.last().unwrap(), Extrapolation::None);
        }
        let lo = hi - 1;
        let (t0, t1) = (self.epochs[lo], self.epochs[hi]);
        let (c0, c1) = (self.corrections[lo], self.corrections[hi]);
        let w = (t - t0) / (t1 - t0);
        (c0 + w * (c1 - c0), Extrapolation::None)
    }
}
