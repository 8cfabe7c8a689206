//! # Per-TOA solar-system geometry
//!
//! [`compute_posvels`] augments a TOA collection with one [`PosVel`]
//! column per body: the observatory relative to the geocenter (from the
//! site's Earth-fixed position and the Earth rotation angle at UT1), the
//! Earth relative to the SSB (ephemeris oracle), their composition, the
//! Sun relative to the observatory, and optionally the four planets the
//! Shapiro model sums.
//!
//! This is the most expensive pipeline stage and the reason the
//! persistence cache exists.

use log::info;
use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{Second, EARTH_ROT_RATE, MJD, SECONDS_PER_DAY};
use crate::geometry::ephemeris::Ephemeris;
use crate::geometry::{Body, FramePoint, PosVel, SHAPIRO_PLANETS};
use crate::observatories::{Observatory, ObservatoryRegistry, BARYCENTER};
use crate::pulstoa_errors::PulstoaError;
use crate::time::gmst;
use crate::toa::collection::{GeometryColumns, ToaCollection};

/// Earth rotation matrix at the given Greenwich sidereal angle: maps
/// Earth-fixed coordinates into the inertial equatorial frame.
fn earth_rotation(gast: f64) -> Matrix3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), gast).into()
}

/// Geocentric state of a physical site at a given UTC epoch.
///
/// The Earth-fixed site vector is rotated by GMST(UT1) about the spin
/// axis; the velocity is `ω × r` with the sidereal rotation rate.
///
/// Arguments
/// ---------
/// * `site`: the observatory (Earth-fixed position in km)
/// * `utc_mjd`: the row's UTC timestamp (clock-corrected)
/// * `dut1`: UT1 − UTC in seconds for that row
/// * `epoch_tdb`: the row's TDB epoch, used to tag the result
///
/// Return
/// ------
/// * The observatory state relative to the geocenter, km and km/s
pub fn observatory_posvel(
    site: &Observatory,
    utc_mjd: MJD,
    dut1: Second,
    epoch_tdb: MJD,
) -> PosVel {
    let tut = utc_mjd + dut1 / SECONDS_PER_DAY;
    let gast = gmst(tut);
    let pos = earth_rotation(gast) * site.geocentric_km();
    let omega = Vector3::new(0.0, 0.0, EARTH_ROT_RATE);
    let vel = omega.cross(&pos);
    PosVel::new(
        pos,
        vel,
        FramePoint::Observatory,
        FramePoint::Body(Body::Earth),
        epoch_tdb,
    )
}

/// Compute position/velocity columns for every row of the collection.
///
/// Requires the TDB stage to have run. Already-computed geometry is left
/// untouched (logged no-op). Barycenter-tagged rows have a site that
/// coincides with the SSB: their observatory-to-SSB state is zero and the
/// geocentric state follows from frame algebra.
///
/// Arguments
/// ---------
/// * `toas`: the collection to augment in place
/// * `registry`: known-observatory set (site positions)
/// * `ephem`: the ephemeris oracle
/// * `planets`: also compute the Jupiter/Saturn/Venus/Uranus columns
///
/// Return
/// ------
/// * `Ok(())` with the geometry columns attached, or a fatal error when
///   the TDB columns are missing, a site cannot be resolved, or the
///   oracle fails
pub fn compute_posvels(
    toas: &mut ToaCollection,
    registry: &ObservatoryRegistry,
    ephem: &dyn Ephemeris,
    planets: bool,
) -> Result<(), PulstoaError> {
    if toas.geometry.is_some() {
        info!("TOAs already have geometry columns, not recomputing.");
        return Ok(());
    }
    let n = toas.ntoas();
    let tdb = toas
        .tdb
        .as_ref()
        .ok_or(PulstoaError::MissingTdb)?
        .clone();
    let tdb_hp = toas
        .tdb_hp
        .as_ref()
        .ok_or(PulstoaError::MissingTdb)?
        .clone();
    let dut1 = toas
        .delta_ut1
        .as_ref()
        .cloned()
        .unwrap_or_else(|| vec![0.0; n]);

    let placeholder = PosVel::zero(FramePoint::Observatory, FramePoint::Ssb, 0.0);
    let mut obs_pv = vec![placeholder; n];
    let mut earth_pv = vec![placeholder; n];
    let mut ssb_obs_pv = vec![placeholder; n];
    let mut obs_sun_pv = vec![placeholder; n];
    let mut planet_pv: Option<[Vec<PosVel>; 4]> =
        planets.then(|| std::array::from_fn(|_| vec![placeholder; n]));

    for group in toas.groups() {
        let site = if group.obs == BARYCENTER {
            None
        } else {
            Some(
                registry
                    .get(&group.obs)
                    .ok_or_else(|| PulstoaError::UnknownObservatory(group.obs.clone()))?
                    .clone(),
            )
        };
        for &row in &group.rows {
            let epoch = tdb[row];
            let epoch_hp = &tdb_hp[row];
            let earth = ephem.state(Body::Earth, FramePoint::Ssb, epoch_hp)?;
            let obs = match &site {
                Some(site) => {
                    observatory_posvel(site, toas.toas[row].mjd.as_days(), dut1[row], epoch)
                }
                // A barycentric site *is* the SSB origin
                None => PosVel::zero(FramePoint::Observatory, FramePoint::Ssb, epoch) - earth,
            };
            let sun_earth = ephem.state(Body::Sun, FramePoint::Body(Body::Earth), epoch_hp)?;
            obs_sun_pv[row] = sun_earth - obs;
            ssb_obs_pv[row] = obs + earth;
            if let Some(columns) = planet_pv.as_mut() {
                for (slot, body) in columns.iter_mut().zip(SHAPIRO_PLANETS) {
                    let body_earth =
                        ephem.state(body, FramePoint::Body(Body::Earth), epoch_hp)?;
                    slot[row] = body_earth - obs;
                }
            }
            obs_pv[row] = obs;
            earth_pv[row] = earth;
        }
    }

    let [jupiter, saturn, venus, uranus] = match planet_pv {
        Some(columns) => columns.map(Some),
        None => [None, None, None, None],
    };
    toas.geometry = Some(GeometryColumns {
        with_planets: planets,
        obs_pv,
        earth_pv,
        ssb_obs_pv,
        obs_sun_pv,
        obs_jupiter_pv: jupiter,
        obs_saturn_pv: saturn,
        obs_venus_pv: venus,
        obs_uranus_pv: uranus,
    });
    Ok(())
}
