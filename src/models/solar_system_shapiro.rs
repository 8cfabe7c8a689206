//! # Solar-system Shapiro delay
//!
//! The general-relativistic light-travel-time delay from the curvature
//! near solar-system masses:
//!
//! ```text
//! delay = −2 · T_body · ln((r − r·cosθ) / 1 AU)
//! ```
//!
//! where `r` is the observatory-to-body distance and `r·cosθ` the dot
//! product of the observatory-to-body vector with the pulsar-direction
//! unit vector. The position vector here points **from the observatory to
//! the body**, opposite the convention of some reference codes; the sign
//! of the cos θ term is flipped accordingly and must stay that way.
//!
//! The total is the Sun term plus, when the `PLANET_SHAPIRO` switch is
//! on, the Jupiter, Saturn, Venus and Uranus terms in that fixed order.
//! Three numerically distinct evaluation modes are provided and must
//! agree to floating-point round-off.

use nalgebra::{DVector, Matrix3xX, Vector3};

use crate::constants::{Second, AU};
use crate::geometry::{PosVel, SHAPIRO_PLANETS};
use crate::pulstoa_errors::PulstoaError;
use crate::toa::collection::{GeometryColumns, ToaCollection};

/// Solar-system Shapiro delay model.
///
/// The planetary switch is externally represented as `Y`/`N` text
/// (see [`SolarSystemShapiro::from_parameter`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarSystemShapiro {
    planet_shapiro: bool,
}

impl SolarSystemShapiro {
    pub fn new(planet_shapiro: bool) -> Self {
        SolarSystemShapiro { planet_shapiro }
    }

    /// Parse the external `Y`/`N` parameter value (case-insensitive;
    /// anything other than `Y` disables the planetary terms).
    pub fn from_parameter(value: &str) -> Self {
        SolarSystemShapiro {
            planet_shapiro: value.eq_ignore_ascii_case("y"),
        }
    }

    /// The external representation of the planetary switch.
    pub fn parameter(&self) -> &'static str {
        if self.planet_shapiro {
            "Y"
        } else {
            "N"
        }
    }

    pub fn planet_shapiro(&self) -> bool {
        self.planet_shapiro
    }

    /// Shapiro delay in seconds for one solar-system body.
    ///
    /// Arguments
    /// ---------
    /// * `body_pos`: position vector from the observatory to the body, km
    /// * `psr_dir`: unit vector toward the pulsar
    /// * `t_body`: the body's mass in time units (GM/c³), seconds
    ///
    /// Return
    /// ------
    /// * The delay in seconds
    pub fn ss_body_shapiro_delay(
        body_pos: &Vector3<f64>,
        psr_dir: &Vector3<f64>,
        t_body: Second,
    ) -> Second {
        let r = body_pos.norm();
        let rcostheta = body_pos.dot(psr_dir);
        // Sign of the cos(theta) term flipped relative to codes that use
        // the body-to-observatory convention
        -2.0 * t_body * ((r - rcostheta) / AU).ln()
    }

    /// The geometry columns, validated against the model configuration.
    fn geometry<'a>(&self, toas: &'a ToaCollection) -> Result<&'a GeometryColumns, PulstoaError> {
        let geometry = toas.geometry().ok_or(PulstoaError::MissingGeometry)?;
        if self.planet_shapiro && !geometry.with_planets {
            // Never degrade silently to a Sun-only approximation
            return Err(PulstoaError::MissingPlanetaryGeometry);
        }
        Ok(geometry)
    }

    /// Scalar evaluation for a single row (standard precision).
    ///
    /// Arguments
    /// ---------
    /// * `toas`: a collection with geometry columns
    /// * `row`: the row index
    /// * `psr_dir`: unit vector toward the pulsar
    ///
    /// Return
    /// ------
    /// * The total delay in seconds for that row
    pub fn delay(
        &self,
        toas: &ToaCollection,
        row: usize,
        psr_dir: &Vector3<f64>,
    ) -> Result<Second, PulstoaError> {
        let geometry = self.geometry(toas)?;
        let mut delay = Self::ss_body_shapiro_delay(
            &geometry.obs_sun_pv[row].pos,
            psr_dir,
            crate::geometry::Body::Sun.mass_time_sec(),
        );
        if self.planet_shapiro {
            for body in SHAPIRO_PLANETS {
                let column = geometry
                    .planet_column(body)
                    .ok_or(PulstoaError::MissingPlanetaryGeometry)?;
                delay +=
                    Self::ss_body_shapiro_delay(&column[row].pos, psr_dir, body.mass_time_sec());
            }
        }
        Ok(delay)
    }

    /// Per-row loop over the extended-precision geometry columns.
    ///
    /// The geometry columns are evaluated at the two-part TDB epochs; this
    /// mode walks them row by row, accumulating each body's term into the
    /// output, and must agree with [`delay`](Self::delay) and
    /// [`delay_table`](Self::delay_table) to round-off.
    pub fn delay_hp(
        &self,
        toas: &ToaCollection,
        psr_dir: &Vector3<f64>,
    ) -> Result<Vec<Second>, PulstoaError> {
        let geometry = self.geometry(toas)?;
        let n = toas.ntoas();
        let mut delays = vec![0.0; n];
        for (row, delay) in delays.iter_mut().enumerate() {
            *delay += Self::ss_body_shapiro_delay(
                &geometry.obs_sun_pv[row].pos,
                psr_dir,
                crate::geometry::Body::Sun.mass_time_sec(),
            );
            if self.planet_shapiro {
                for body in SHAPIRO_PLANETS {
                    let column = geometry
                        .planet_column(body)
                        .ok_or(PulstoaError::MissingPlanetaryGeometry)?;
                    *delay += Self::ss_body_shapiro_delay(
                        &column[row].pos,
                        psr_dir,
                        body.mass_time_sec(),
                    );
                }
            }
        }
        Ok(delays)
    }

    /// Vectorized delays for one body column.
    fn column_delays(column: &[PosVel], psr_dir: &Vector3<f64>, t_body: Second) -> DVector<f64> {
        let positions: Vec<Vector3<f64>> = column.iter().map(|pv| pv.pos).collect();
        let m = Matrix3xX::from_columns(&positions);
        // Column-wise |r| and r·cosθ as matrix operations
        let r = m.component_mul(&m).row_sum().transpose().map(f64::sqrt);
        let rcostheta = m.tr_mul(psr_dir);
        r.zip_map(&rcostheta, |r, rc| -2.0 * t_body * ((r - rc) / AU).ln())
    }

    /// Fully vectorized batch evaluation over the array columns.
    ///
    /// Builds a `3×N` position matrix per body and evaluates the delay
    /// formula with column-wise matrix operations.
    pub fn delay_table(
        &self,
        toas: &ToaCollection,
        psr_dir: &Vector3<f64>,
    ) -> Result<Vec<Second>, PulstoaError> {
        let geometry = self.geometry(toas)?;
        if toas.is_empty() {
            return Ok(Vec::new());
        }
        let mut delays = Self::column_delays(
            &geometry.obs_sun_pv,
            psr_dir,
            crate::geometry::Body::Sun.mass_time_sec(),
        );
        if self.planet_shapiro {
            for body in SHAPIRO_PLANETS {
                let column = geometry
                    .planet_column(body)
                    .ok_or(PulstoaError::MissingPlanetaryGeometry)?;
                delays += Self::column_delays(column, psr_dir, body.mass_time_sec());
            }
        }
        Ok(delays.iter().cloned().collect())
    }
}
