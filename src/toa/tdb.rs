//! # Barycentric-time conversion
//!
//! [`compute_tdbs`] adds the `tdb` (standard precision) and `tdb_hp`
//! (two-part, extended precision) columns to a TOA collection, converting
//! each group's clock-corrected local time into the barycentric dynamical
//! scale. Barycenter-tagged rows are already in the target scale and are
//! copied through unchanged.
//!
//! For physical sites the stage also resolves the per-row UT1 − UTC
//! offset from the [`EopService`] (fetched once per process, cached), and
//! stores it in the `delta_ut1` column for the geometry provider.

use log::{info, warn};

use crate::constants::SECONDS_PER_DAY;
use crate::env_state::EopService;
use crate::observatories::BARYCENTER;
use crate::pulstoa_errors::PulstoaError;
use crate::time::{utc_epoch, utc_to_tdb, MjdPair};
use crate::toa::collection::ToaCollection;

/// Compute the TDB columns for every row of the collection.
///
/// Precondition: clock corrections should already have been applied;
/// their absence (no row carries a `clkcorr` flag) is a warning, not a
/// failure, since some pipelines deliberately skip that step.
///
/// Arguments
/// ---------
/// * `toas`: the collection to augment in place
/// * `eop`: the Earth-orientation service providing UT1 − UTC
///
/// Return
/// ------
/// * `Ok(())` with the `tdb`, `tdb_hp` and `delta_ut1` columns attached
pub fn compute_tdbs(toas: &mut ToaCollection, eop: &EopService) -> Result<(), PulstoaError> {
    if toas.tdb.is_some() {
        info!("TOAs already have TDB columns, not recomputing.");
        return Ok(());
    }
    if !toas.is_empty() && !toas.any_flag("clkcorr") {
        warn!("No TOAs have clock corrections. Use apply_clock_corrections() first.");
    }

    let provider = eop.ut1_provider();
    let n = toas.ntoas();
    let mut tdb = vec![0.0; n];
    let mut tdb_hp = vec![MjdPair::new(0, 0.0); n];
    let mut delta_ut1 = vec![0.0; n];

    for group in toas.groups() {
        let barycentric = group.obs == BARYCENTER;
        for &row in &group.rows {
            let raw = toas.toas[row].mjd;
            if barycentric {
                // Already in the target scale
                tdb[row] = raw.as_days();
                tdb_hp[row] = raw;
            } else {
                let (t, hp) = utc_to_tdb(&raw);
                tdb[row] = t;
                tdb_hp[row] = hp;
                if let Some(provider) = provider {
                    let epoch = utc_epoch(&raw);
                    let ut1_days = epoch.to_ut1(provider).to_mjd_tai_days();
                    delta_ut1[row] = (ut1_days - epoch.to_mjd_utc_days()) * SECONDS_PER_DAY;
                }
            }
        }
    }

    toas.tdb = Some(tdb);
    toas.tdb_hp = Some(tdb_hp);
    toas.delta_ut1 = Some(delta_ut1);
    Ok(())
}

#[cfg(test)]
mod tdb_test {
    use super::*;
    use crate::observatories::{Observatory, ObservatoryRegistry};
    use crate::toa::{Toa, ToaFlags};

    fn registry() -> ObservatoryRegistry {
        let mut registry = ObservatoryRegistry::new();
        registry.insert(
            Observatory::new("GBT", &["G"], 882.589, -4924.872, 3943.729).unwrap(),
        );
        registry
    }

    fn collection(registry: &ObservatoryRegistry) -> ToaCollection {
        let mut c = ToaCollection::new(None);
        for (day, obs) in [(54567, "GBT"), (54567, "Barycenter")] {
            let toa = Toa::new(
                MjdPair::new(day, 0.25),
                1.0,
                obs,
                1400.0,
                ToaFlags::default(),
                registry,
            )
            .unwrap();
            c.push_toa(toa);
        }
        c
    }

    #[test]
    fn test_barycenter_copied_through() {
        let registry = registry();
        let mut c = collection(&registry);
        compute_tdbs(&mut c, &EopService::disabled()).unwrap();

        let bary_row = c
            .toas()
            .iter()
            .position(|t| t.obs == BARYCENTER)
            .unwrap();
        assert_eq!(c.tdb_hp().unwrap()[bary_row], MjdPair::new(54567, 0.25));
        assert_eq!(c.tdb().unwrap()[bary_row], 54567.25);
    }

    #[test]
    fn test_site_rows_get_tdb_offset() {
        let registry = registry();
        let mut c = collection(&registry);
        compute_tdbs(&mut c, &EopService::disabled()).unwrap();

        let site_row = c.toas().iter().position(|t| t.obs == "GBT").unwrap();
        let offset_sec =
            (c.tdb().unwrap()[site_row] - 54567.25) * SECONDS_PER_DAY;
        // 2008: TT - UTC = 65.184 s, TDB - TT below 1.7 ms
        assert!((offset_sec - 65.184).abs() < 2.0e-3, "offset {offset_sec}");
        // Disabled EOP service: UT1 - UTC taken as zero
        assert_eq!(c.delta_ut1().unwrap()[site_row], 0.0);
    }

    #[test]
    fn test_second_call_is_noop() {
        let registry = registry();
        let mut c = collection(&registry);
        compute_tdbs(&mut c, &EopService::disabled()).unwrap();
        let before = c.tdb().unwrap().to_vec();
        compute_tdbs(&mut c, &EopService::disabled()).unwrap();
        assert_eq!(c.tdb().unwrap(), before.as_slice());
    }
}
