//! # Clock corrections
//!
//! Applies observatory clock corrections and TIME statements to the raw
//! timestamps, in place. TIME offsets (seconds, from the command state)
//! come first, then each observatory group is corrected through its
//! site's clock table (microseconds, linearly interpolated).
//!
//! The total correction applied to a row is recorded as its `clkcorr`
//! flag, so the operation can be recognized and never applied twice: a
//! second invocation is a logged no-op.

use log::{debug, error, info, warn};

use crate::observatories::clock::{ClockCorrectionConfig, Extrapolation};
use crate::observatories::{ObservatoryRegistry, BARYCENTER};
use crate::pulstoa_errors::PulstoaError;
use crate::toa::collection::ToaCollection;
use crate::toa::FlagValue;

/// Apply TIME statements and observatory clock corrections to all rows.
///
/// Arguments
/// ---------
/// * `toas`: the collection, mutated in place
/// * `registry`: known-observatory set carrying the clock tables
/// * `config`: extrapolation reporting policy
///
/// Return
/// ------
/// * `Ok(())` when corrections were applied (or had already been applied,
///   which is a no-op); an error only for unresolvable observatories
pub fn apply_clock_corrections(
    toas: &mut ToaCollection,
    registry: &ObservatoryRegistry,
    config: &ClockCorrectionConfig,
) -> Result<(), PulstoaError> {
    if toas.any_flag("clkcorr") {
        info!("Some TOAs have 'clkcorr' flag. Not applying new clock corrections.");
        return Ok(());
    }

    let n = toas.ntoas();
    // Total correction per row, seconds
    let mut corr = vec![0.0f64; n];

    // TIME statements first; they apply to every row carrying the flag,
    // barycentric ones included
    for (row, toa) in toas.toas.iter_mut().enumerate() {
        if let Some(t) = toa.flags.get("time").and_then(FlagValue::as_f64) {
            corr[row] += t;
            toa.mjd = toa.mjd.add_seconds(t);
        }
    }

    // Observatory clock corrections, in groups
    for group in toas.groups() {
        if group.obs == BARYCENTER {
            // No physical clock to correct
            continue;
        }
        let site = registry
            .get(&group.obs)
            .ok_or_else(|| PulstoaError::UnknownObservatory(group.obs.clone()))?
            .clone();
        let Some(table) = site.clock_table() else {
            debug!("no clock correction table for '{}'", group.obs);
            continue;
        };
        let mut n_outside = 0usize;
        let mut max_distance: f64 = 0.0;
        for &row in &group.rows {
            let t = toas.toas[row].mjd.as_days();
            let (c_us, extrapolation) = table.correction_at(t);
            if let Extrapolation::Flat(distance) = extrapolation {
                n_outside += 1;
                max_distance = max_distance.max(distance);
            }
            let c_sec = c_us * 1e-6;
            toas.toas[row].mjd = toas.toas[row].mjd.add_seconds(c_sec);
            corr[row] += c_sec;
        }
        if n_outside > 0 {
            let message = format!(
                "{} TOAs are not covered by the {} clock correction file \
                 (up to {:.1} days outside), treating clock corrections as \
                 constant past the ends",
                n_outside, group.obs, max_distance
            );
            match config.max_extrapolation_days {
                Some(limit) if max_distance > limit => error!("{message}"),
                _ => warn!("{message}"),
            }
        }
    }

    // Record the correction used on each row
    for (row, toa) in toas.toas.iter_mut().enumerate() {
        if corr[row] != 0.0 {
            toa.flags
                .insert("clkcorr".to_string(), FlagValue::Float(corr[row]));
        }
    }
    Ok(())
}
