mod common;

use common::{build_registry, write_tim};
use pulstoa::observatories::BARYCENTER;
use pulstoa::toa::reader::read_toas;
use pulstoa::toa::{FlagValue, ToaScale};

#[test]
fn test_read_mixed_format_tim_file() {
    common::init_logs();
    let registry = build_registry();
    let dir = tempfile::tempdir().unwrap();
    let tim = write_tim(
        &dir,
        "mixed.tim",
        concat!(
            "C a legacy comment line\n",
            "# a modern comment line\n",
            "INFO session1\n",
            "g 1400.0000 54567.8768768768  4.50\n",
            "MODE 1\n",
            "EFAC 2.0\n",
            "g 1430.0000 54568.1000000000  2.00\n",
            "FORMAT 1\n",
            "J1234+56 1410.0 54569.1234567890 3.0 ao -backend puppi -pn 7\n",
            "@ 999999.9999 54570.5555555555  0.50\n",
            "END\n",
            "g 1400.0000 54571.0000000000  1.00\n",
        ),
    );

    let toas = read_toas(&tim, &registry).unwrap();

    // The row after END is sealed off
    assert_eq!(toas.ntoas(), 4);
    assert_eq!(toas.n_filtered(), 0);

    // INFO, MODE, EFAC, FORMAT, END
    assert_eq!(toas.commands().len(), 5);
    assert_eq!(toas.commands()[0].0, vec!["INFO", "session1"]);
    assert_eq!(toas.commands()[4].0, vec!["END"]);
    // Command log pairs each command with the row count at that point
    assert_eq!(toas.commands()[2].1, 1);

    assert_eq!(
        toas.observatories().iter().cloned().collect::<Vec<_>>(),
        vec![
            "Arecibo".to_string(),
            BARYCENTER.to_string(),
            "GBT".to_string()
        ]
    );

    let rows = toas.toas();
    // Princeton row, before EFAC
    assert_eq!(rows[0].obs, "GBT");
    assert_eq!(rows[0].error, 4.5);
    assert_eq!(rows[0].mjd.days(), 54567);
    assert!((rows[0].mjd.frac() - 0.8768768768).abs() < 1e-13);
    assert_eq!(rows[0].freq, 1400.0);
    assert_eq!(
        rows[0].flags.get("info"),
        Some(&FlagValue::Str("session1".to_string()))
    );
    assert_eq!(rows[0].flags.get("ddm"), Some(&FlagValue::Float(0.0)));

    // Princeton row, after EFAC 2.0
    assert_eq!(rows[1].error, 4.0);

    // Tempo2 row with flags
    assert_eq!(rows[2].obs, "Arecibo");
    assert_eq!(
        rows[2].flags.get("backend"),
        Some(&FlagValue::Str("puppi".to_string()))
    );
    assert_eq!(rows[2].flags.get("pn"), Some(&FlagValue::Int(7)));
    assert_eq!(
        rows[2].flags.get("name"),
        Some(&FlagValue::Str("J1234+56".to_string()))
    );

    // Barycenter alias row, already in the dynamical scale
    assert_eq!(rows[3].obs, BARYCENTER);
    assert_eq!(rows[3].scale, ToaScale::Tdb);
}

#[test]
fn test_nested_includes_thread_state() {
    let registry = build_registry();
    let dir = tempfile::tempdir().unwrap();
    write_tim(
        &dir,
        "inner.tim",
        concat!("g 1400.0 54561.5000000000  2.0\n", "EFAC 2.0\n"),
    );
    write_tim(
        &dir,
        "mid.tim",
        concat!(
            "FORMAT 1\n",
            "m1 1400.0 54562.1234512345 1.0 gbt\n",
            "INCLUDE inner.tim\n",
            "m2 1400.0 54563.1234512345 1.0 gbt\n",
        ),
    );
    let top = write_tim(
        &dir,
        "top.tim",
        concat!(
            "EQUAD 1.0\n",
            "INCLUDE mid.tim\n",
            "g 1400.0 54564.5000000000  1.0\n",
        ),
    );

    let toas = read_toas(&top, &registry).unwrap();
    assert_eq!(toas.ntoas(), 4);
    let rows = toas.toas();

    // mid.tim first row: EQUAD from the top level applies inside includes
    assert_eq!(rows[0].mjd.days(), 54562);
    assert!((rows[0].error - 2.0f64.sqrt()).abs() < 1e-15);

    // inner.tim row: Princeton, read before inner's EFAC takes effect
    assert_eq!(rows[1].mjd.days(), 54561);
    assert!((rows[1].error - 5.0f64.sqrt()).abs() < 1e-15);

    // mid.tim second row: the Tempo2 FORMAT override survived the nested
    // include, and the EFAC set inside inner.tim persists outward
    assert_eq!(rows[2].mjd.days(), 54563);
    assert!((rows[2].error - 5.0f64.sqrt()).abs() < 1e-15);

    // top-level row after both includes: Princeton again (the top level
    // never switched formats), inner EFAC still active
    assert_eq!(rows[3].mjd.days(), 54564);
    assert!((rows[3].error - 5.0f64.sqrt()).abs() < 1e-15);
}

#[test]
fn test_uncertainty_and_frequency_filters() {
    let registry = build_registry();
    let dir = tempfile::tempdir().unwrap();
    let tim = write_tim(
        &dir,
        "filters.tim",
        concat!(
            "EMIN 1.0\n",
            "EMAX 10.0\n",
            "FMIN 1000.0\n",
            "FMAX 2000.0\n",
            "g 1400.0 54561.1000000000  0.5\n",  // error below EMIN
            "g 1400.0 54562.1000000000  15.0\n", // error above EMAX
            "g 430.0 54563.1000000000  2.0\n",   // frequency below FMIN
            "g 2400.0 54564.1000000000  2.0\n",  // frequency above FMAX
            "g 1400.0 54565.1000000000  2.0\n",  // accepted
        ),
    );

    let toas = read_toas(&tim, &registry).unwrap();
    assert_eq!(toas.ntoas(), 1);
    assert_eq!(toas.n_filtered(), 4);
    assert_eq!(toas.toas()[0].mjd.days(), 54565);

    // No accepted row violates the configured bounds
    for toa in toas.toas() {
        assert!(toa.error >= 1.0 && toa.error <= 10.0);
        assert!(toa.freq >= 1000.0 && toa.freq <= 2000.0);
    }
}

#[test]
fn test_summary_output() {
    let registry = build_registry();
    let dir = tempfile::tempdir().unwrap();
    let tim = write_tim(
        &dir,
        "summary.tim",
        concat!(
            "g 1400.0 54561.1000000000  1.0\n",
            "g 1400.0 54562.1000000000  3.0\n",
        ),
    );
    let toas = read_toas(&tim, &registry).unwrap();
    let summary = toas.get_summary();
    assert!(summary.contains("Number of TOAs:  2"));
    assert!(summary.contains("Number of commands:  0"));
    assert!(summary.contains("GBT TOAs (2):"));
    assert!(summary.contains("Mean error:    2.000 us"));
}
