mod common;

use approx::assert_relative_eq;
use nalgebra::Vector3;

use common::{build_registry, write_tim, CircularEphemeris};
use pulstoa::cache;
use pulstoa::constants::AU;
use pulstoa::env_state::EopService;
use pulstoa::observatories::clock::ClockCorrectionConfig;
use pulstoa::pulstoa_errors::PulstoaError;
use pulstoa::toa::clock_corrections::apply_clock_corrections;
use pulstoa::{Pulstoa, SolarSystemShapiro};

const TIM: &str = concat!(
    "INFO integration\n",
    "g 1400.0000 54567.8768768768  4.50\n",
    "@ 999999.9999 54569.2500000000  0.10\n",
    "TIME 0.5\n",
    "g 1430.0000 54568.1000000000  2.00\n",
);

/// Physical sites only: the Shapiro formula diverges for a pseudo-site
/// sitting exactly at the barycenter.
const TIM_SITES: &str = concat!(
    "g 1400.0000 54567.8768768768  4.50\n",
    "g 1430.0000 54568.1000000000  2.00\n",
    "FORMAT 1\n",
    "J1234+56 1410.0 54569.1234567890 3.0 ao -backend puppi\n",
);

fn make_context() -> Pulstoa {
    common::init_logs();
    Pulstoa::new(build_registry(), Box::new(CircularEphemeris)).with_eop(EopService::disabled())
}

#[test]
fn test_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let tim = write_tim(&dir, "pipeline.tim", TIM);
    let ctx = make_context();

    let toas = ctx.get_toas(&tim, true, false).unwrap();
    assert_eq!(toas.ntoas(), 3);

    let rows = toas.toas();
    // GBT rows got clock corrections; the barycentric row is exempt
    assert!(rows[0].flags.contains_key("clkcorr"));
    assert!(!rows[1].flags.contains_key("clkcorr"));
    assert!(rows[2].flags.contains_key("clkcorr"));
    // The last row carries the accumulated TIME offset in its correction
    let clkcorr = rows[2].flags["clkcorr"].as_f64().unwrap();
    assert!(clkcorr > 0.5 && clkcorr < 0.51);

    // TDB columns exist in both precisions and agree with each other
    let tdb = toas.tdb().unwrap();
    let tdb_hp = toas.tdb_hp().unwrap();
    assert_eq!(tdb.len(), 3);
    for row in 0..3 {
        assert_relative_eq!(tdb[row], tdb_hp[row].as_days(), max_relative = 1e-12);
    }
    // Physical sites: TDB leads UTC by roughly TT - UTC (~65 s in 2008)
    let offset = (tdb[0] - rows[0].mjd.as_days()) * 86400.0;
    assert!((offset - 65.184).abs() < 0.01, "offset {offset}");
    // Barycentric row copied through unchanged
    assert_eq!(tdb[1], rows[1].mjd.as_days());

    // Geometry columns, planets included
    let geometry = toas.geometry().unwrap();
    assert!(geometry.with_planets);
    for row in 0..3 {
        let composed = geometry.obs_pv[row] + geometry.earth_pv[row];
        assert_relative_eq!(
            geometry.ssb_obs_pv[row].pos.norm(),
            composed.pos.norm(),
            max_relative = 1e-12
        );
    }
    // The Sun is about 1 AU from any terrestrial observatory
    for row in [0, 2] {
        let sun_distance = geometry.obs_sun_pv[row].pos.norm();
        assert!((sun_distance / AU - 1.0).abs() < 0.01, "{sun_distance}");
    }
    // The barycentric pseudo-site coincides with the SSB
    assert!(geometry.ssb_obs_pv[1].pos.norm() < 1e-9);
}

#[test]
fn test_shapiro_modes_on_pipeline_output() {
    let dir = tempfile::tempdir().unwrap();
    let tim = write_tim(&dir, "shapiro.tim", TIM_SITES);
    let ctx = make_context();
    let toas = ctx.get_toas(&tim, true, false).unwrap();

    let psr_dir = Vector3::new(0.6, 0.8, 0.0);
    for model in [
        SolarSystemShapiro::from_parameter("N"),
        SolarSystemShapiro::from_parameter("Y"),
    ] {
        let hp = model.delay_hp(&toas, &psr_dir).unwrap();
        let table = model.delay_table(&toas, &psr_dir).unwrap();
        assert_eq!(hp.len(), toas.ntoas());
        for row in 0..toas.ntoas() {
            let scalar = model.delay(&toas, row, &psr_dir).unwrap();
            assert!(scalar.is_finite());
            assert_relative_eq!(scalar, hp[row], max_relative = 1e-12);
            assert_relative_eq!(scalar, table[row], max_relative = 1e-12);
        }
    }
}

#[test]
fn test_planetary_delay_requires_planet_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let tim = write_tim(&dir, "sun_only.tim", TIM_SITES);
    let ctx = make_context();
    let toas = ctx.get_toas(&tim, false, false).unwrap();

    let psr_dir = Vector3::new(0.0, 0.0, 1.0);
    let sun_only = SolarSystemShapiro::from_parameter("N");
    assert!(sun_only.delay_table(&toas, &psr_dir).is_ok());

    // Geometry was computed without planets: fail, never approximate
    let with_planets = SolarSystemShapiro::from_parameter("Y");
    assert_eq!(
        with_planets.delay_table(&toas, &psr_dir).unwrap_err(),
        PulstoaError::MissingPlanetaryGeometry
    );
}

#[test]
fn test_cache_round_trip_and_reuse() {
    let dir = tempfile::tempdir().unwrap();
    let tim = write_tim(&dir, "cached.tim", TIM);
    let ctx = make_context();

    let computed = ctx.get_toas(&tim, true, true).unwrap();
    let (_, gz) = cache::pickle_paths(&tim);
    assert!(gz.is_file(), "expected {gz} to be written");

    // Rewrite the source with an extra row but keep its mtime older than
    // the artifact: the cache must be reused, so the extra row stays
    // invisible.
    let extra = format!("{TIM}g 1400.0 54570.5000000000  1.0\n");
    write_tim(&dir, "cached.tim", &extra);
    let reloaded = ctx.get_toas(&tim, true, true).unwrap();

    assert_eq!(reloaded.ntoas(), computed.ntoas());
    assert_eq!(reloaded.observatories(), computed.observatories());
    assert_eq!(reloaded.commands(), computed.commands());
    assert_eq!(reloaded.tdb().unwrap(), computed.tdb().unwrap());
    assert_eq!(
        reloaded.geometry().unwrap().with_planets,
        computed.geometry().unwrap().with_planets
    );
    assert_eq!(
        reloaded.toas()[0].flags.get("clkcorr"),
        computed.toas()[0].flags.get("clkcorr")
    );
}

#[test]
fn test_cache_invalidated_by_newer_source() {
    let dir = tempfile::tempdir().unwrap();
    let tim = write_tim(&dir, "invalidate.tim", TIM);
    let ctx = make_context();

    let first = ctx.get_toas(&tim, false, true).unwrap();
    assert_eq!(first.ntoas(), 3);

    // A source newer than the artifact forces a recomputation
    let extra = format!("{TIM}g 1400.0 54570.5000000000  1.0\n");
    std::fs::write(&tim, &extra).unwrap();
    let second = ctx.get_toas(&tim, false, true).unwrap();
    assert_eq!(second.ntoas(), 4);
}

#[test]
fn test_clock_corrections_idempotent_after_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let tim = write_tim(&dir, "idempotent.tim", TIM);
    let ctx = make_context();
    let mut toas = ctx.get_toas(&tim, false, false).unwrap();

    let before = toas.get_mjds();
    apply_clock_corrections(
        &mut toas,
        ctx.registry(),
        &ClockCorrectionConfig::default(),
    )
    .unwrap();
    assert_eq!(toas.get_mjds(), before);
}

#[test]
fn test_pickle_path_argument_maps_to_source() {
    let dir = tempfile::tempdir().unwrap();
    let tim = write_tim(&dir, "bypath.tim", TIM);
    let ctx = make_context();
    let direct = ctx.get_toas(&tim, false, true).unwrap();

    // Asking for the artifact path loads the same logical file
    let (_, gz) = cache::pickle_paths(&tim);
    let via_pickle = ctx.get_toas(&gz, false, true).unwrap();
    assert_eq!(via_pickle.ntoas(), direct.ntoas());
    assert_eq!(via_pickle.observatories(), direct.observatories());
}
