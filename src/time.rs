//! # Time representations and scale conversions
//!
//! Raw TOA timestamps are kept as a **two-part MJD** ([`MjdPair`]): an integer
//! day number plus a day fraction in `[0, 1)`. A single `f64` MJD has a
//! resolution of roughly a microsecond at current epochs, which is far too
//! coarse for pulsar timing; keeping the fraction separate preserves
//! picosecond-level resolution through all additive corrections.
//!
//! The UTC → TDB conversion chains the exact offsets:
//!
//! ```text
//! UTC --(leap seconds, hifitime)--> TAI --(32.184 s)--> TT --(periodic term)--> TDB
//! ```
//!
//! The TDB − TT periodic correction uses the largest Fairhead & Bretagnon
//! terms, which is accurate to a few nanoseconds over several centuries
//! around J2000.

use hifitime::{Epoch, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{Second, DPI, JDTOMJD, MJD, SECONDS_PER_DAY, T2000, TT_MINUS_TAI};

/// A two-part Modified Julian Date: integer day plus day fraction in `[0, 1)`.
///
/// The pair is always kept normalized; arithmetic that pushes the fraction
/// outside `[0, 1)` carries into the day number.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MjdPair {
    days: i64,
    frac: f64,
}

impl MjdPair {
    /// Build a normalized two-part MJD from a day number and a day fraction.
    ///
    /// Arguments
    /// ---------
    /// * `days`: integer MJD day number
    /// * `frac`: day fraction, any finite value (normalized into `[0, 1)`)
    ///
    /// Return
    /// ------
    /// * A normalized [`MjdPair`]
    pub fn new(days: i64, frac: f64) -> Self {
        let carry = frac.floor();
        MjdPair {
            days: days + carry as i64,
            frac: frac - carry,
        }
    }

    /// Integer day number.
    pub fn days(&self) -> i64 {
        self.days
    }

    /// Day fraction in `[0, 1)`.
    pub fn frac(&self) -> f64 {
        self.frac
    }

    /// Collapse to a single `f64` MJD (standard precision).
    pub fn as_days(&self) -> MJD {
        self.days as f64 + self.frac
    }

    /// Return a new pair shifted by `sec` seconds.
    pub fn add_seconds(&self, sec: Second) -> Self {
        MjdPair::new(self.days, self.frac + sec / SECONDS_PER_DAY)
    }
}

impl fmt::Display for MjdPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 15 fractional digits keeps sub-nanosecond resolution in text form
        let frac = format!("{:.15}", self.frac);
        write!(f, "{}{}", self.days, &frac[1..])
    }
}

/// Build a hifitime [`Epoch`] (UTC scale) from a two-part MJD.
pub fn utc_epoch(mjd: &MjdPair) -> Epoch {
    Epoch::from_mjd_utc(mjd.days() as f64) + mjd.frac() * Unit::Day
}

/// TDB − TT in seconds at a given TT Julian Date.
///
/// Largest Fairhead & Bretagnon periodic terms (amplitude ≈ 1.7 ms).
///
/// Arguments
/// ---------
/// * `jd_tt`: Julian Date in the TT scale
///
/// Return
/// ------
/// * The TDB − TT offset in seconds
pub fn tdb_minus_tt(jd_tt: f64) -> Second {
    let t = (jd_tt - (T2000 + JDTOMJD)) / 36525.0;

    // Earth's mean anomaly (radians)
    let m_e = (357.5291092 + 35999.0502909 * t).to_radians();
    // Mean anomaly of Jupiter (radians)
    let m_j = (246.4512 + 3035.2335 * t).to_radians();
    // Mean elongation of the Moon from the Sun (radians)
    let d = (297.8502042 + 445267.1115168 * t).to_radians();
    // Mean longitude of the lunar ascending node (radians)
    let om = (125.0445550 - 1934.1362091 * t).to_radians();

    0.001_657 * (m_e + 0.01671 * m_e.sin()).sin()
        + 0.000_022 * (d - m_e).sin()
        + 0.000_014 * (2.0 * d).sin()
        + 0.000_005 * m_j.sin()
        + 0.000_005 * om.sin()
}

/// Convert a UTC two-part MJD to TDB, in both precisions.
///
/// The leap-second count comes from hifitime's bundled table; the TT → TDB
/// step applies the periodic correction from [`tdb_minus_tt`]. Epochs before
/// the leap-second era are converted with a zero offset and a warning.
///
/// Arguments
/// ---------
/// * `mjd`: the UTC timestamp as a two-part MJD
///
/// Return
/// ------
/// * `(tdb, tdb_hp)`: the TDB epoch as a standard-precision MJD and as a
///   two-part MJD
pub fn utc_to_tdb(mjd: &MjdPair) -> (MJD, MjdPair) {
    let epoch = utc_epoch(mjd);
    let tai_minus_utc = match epoch.leap_seconds(true) {
        Some(ls) => ls,
        None => {
            log::warn!(
                "no leap second data for MJD {}, assuming TAI - UTC = 0",
                mjd
            );
            0.0
        }
    };
    let tt = mjd.add_seconds(tai_minus_utc + TT_MINUS_TAI);
    let tdb_hp = tt.add_seconds(tdb_minus_tt(tt.as_days() + JDTOMJD));
    (tdb_hp.as_days(), tdb_hp)
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 time scale).
///
/// This function implements the IAU 1982/2000 polynomial formula
/// for the mean sidereal time at 0h UT1, plus the fractional-day
/// correction term due to Earth's rotation rate.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (MJD, UT1 time scale)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
pub fn gmst(tjm: f64) -> f64 {
    // Polynomial coefficients for GMST at 0h UT1 (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    // Ratio of sidereal day to solar day
    const RAP: f64 = 1.00273790934;

    // Extract the integer MJD (0h UT1) and compute centuries since J2000.0
    let itjm = tjm.floor();
    let t = (itjm - T2000) / 36525.0;

    // GMST at 0h UT1 using the polynomial expression
    let mut gmst0 = ((C3 * t + C2) * t + C1) * t + C0;

    // Convert GMST from seconds to radians (86400 seconds per day)
    gmst0 *= DPI / 86400.0;

    // Add the contribution from the fraction of the day, scaled by RAP
    // to account for the faster rotation of sidereal time
    let h = tjm.fract() * DPI;
    let mut gmst = gmst0 + h * RAP;

    // Normalize GMST to the [0, 2π) range
    let mut i: i64 = (gmst / DPI).floor() as i64;
    if gmst < 0.0 {
        i -= 1;
    }
    gmst -= i as f64 * DPI;

    gmst
}
