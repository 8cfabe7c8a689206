//! The ephemeris oracle seam.
//!
//! Kernel loading and interpolation live outside this crate; the geometry
//! provider only needs *some* source of body states. Implementations wrap
//! a JPL kernel reader, an HTTP ephemeris service, or (in tests) a fixed
//! analytic model.

use crate::geometry::{Body, FramePoint, PosVel};
use crate::pulstoa_errors::PulstoaError;
use crate::time::MjdPair;

/// External provider of solar-system body states.
///
/// Implementations must return a [`PosVel`] tagged
/// `obj = FramePoint::Body(target)`, `origin = center`, with position in
/// km and velocity in km/s at the given TDB epoch.
pub trait Ephemeris {
    /// State of `target` relative to `center` at a TDB epoch.
    fn state(
        &self,
        target: Body,
        center: FramePoint,
        epoch_tdb: &MjdPair,
    ) -> Result<PosVel, PulstoaError>;

    /// Human-readable label of the underlying kernel or model.
    fn label(&self) -> &str {
        "unspecified"
    }
}
