//! # Solar-system geometry primitives
//!
//! The delay models consume **tagged position/velocity vectors**
//! ([`PosVel`]): a 3-vector pair carrying the body it points *to*
//! (`obj`), the point it is referenced *from* (`origin`), and the TDB
//! epoch it was evaluated at. The tags make vector composition
//! frame-checked: adding chains vectors head-to-tail, subtracting two
//! vectors sharing an origin re-bases one on the other. Mixing frames any
//! other way is a caller error and panics.
//!
//! ```text
//! (Obs wrt Earth) + (Earth wrt SSB)          = Obs wrt SSB
//! (Sun wrt Earth) − (Obs wrt Earth)          = Sun wrt Obs
//! ```
//!
//! Units are km and km/s throughout, matching the ephemeris oracle.

pub mod ephemeris;
pub mod posvels;

use std::fmt;
use std::ops::{Add, Sub};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{
    Second, MJD, T_EARTH, T_JUPITER, T_MARS, T_MERCURY, T_NEPTUNE, T_SATURN, T_SUN, T_URANUS,
    T_VENUS,
};

/// Solar-system bodies known to the geometry provider and the delay
/// models. Giant-planet entries refer to the system barycenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Body {
    Sun,
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl Body {
    /// The body's mass in time units (GM/c³), seconds.
    pub fn mass_time_sec(&self) -> Second {
        match self {
            Body::Sun => T_SUN,
            Body::Mercury => T_MERCURY,
            Body::Venus => T_VENUS,
            Body::Earth => T_EARTH,
            Body::Mars => T_MARS,
            Body::Jupiter => T_JUPITER,
            Body::Saturn => T_SATURN,
            Body::Uranus => T_URANUS,
            Body::Neptune => T_NEPTUNE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Earth => "Earth",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The planets summed by the Shapiro model, in the fixed evaluation
/// order. Earth, Mercury, Mars and Neptune have mass constants but are
/// never summed.
pub const SHAPIRO_PLANETS: [Body; 4] = [Body::Jupiter, Body::Saturn, Body::Venus, Body::Uranus];

/// An endpoint a [`PosVel`] can point to or be referenced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FramePoint {
    /// The solar-system barycenter.
    Ssb,
    /// The observing site.
    Observatory,
    /// A solar-system body (the geocenter is `Body(Earth)`).
    Body(Body),
}

impl fmt::Display for FramePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramePoint::Ssb => write!(f, "SSB"),
            FramePoint::Observatory => write!(f, "Observatory"),
            FramePoint::Body(b) => write!(f, "{b}"),
        }
    }
}

/// A position/velocity vector tagged with its endpoints and epoch.
///
/// # Fields
///
/// * `pos` - position of `obj` relative to `origin`, km
/// * `vel` - velocity of `obj` relative to `origin`, km/s
/// * `epoch` - TDB epoch the state was evaluated at, MJD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PosVel {
    pub pos: Vector3<f64>,
    pub vel: Vector3<f64>,
    pub obj: FramePoint,
    pub origin: FramePoint,
    pub epoch: MJD,
}

impl PosVel {
    pub fn new(
        pos: Vector3<f64>,
        vel: Vector3<f64>,
        obj: FramePoint,
        origin: FramePoint,
        epoch: MJD,
    ) -> Self {
        PosVel {
            pos,
            vel,
            obj,
            origin,
            epoch,
        }
    }

    /// A zero state, used for sites that coincide with their origin.
    pub fn zero(obj: FramePoint, origin: FramePoint, epoch: MJD) -> Self {
        PosVel::new(Vector3::zeros(), Vector3::zeros(), obj, origin, epoch)
    }
}

impl fmt::Display for PosVel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PosVel({} wrt {} @ MJD {}): pos {:?} km, vel {:?} km/s",
            self.obj, self.origin, self.epoch, self.pos, self.vel
        )
    }
}

impl Add for PosVel {
    type Output = PosVel;

    /// Chain two states head-to-tail: `(A wrt B) + (B wrt C) = A wrt C`.
    ///
    /// # Panics
    ///
    /// Panics when `self.origin != other.obj`; composing vectors in
    /// inconsistent frames is a caller error.
    fn add(self, other: PosVel) -> PosVel {
        assert!(
            self.origin == other.obj,
            "PosVel addition requires (A wrt B) + (B wrt C), got ({} wrt {}) + ({} wrt {})",
            self.obj,
            self.origin,
            other.obj,
            other.origin
        );
        PosVel {
            pos: self.pos + other.pos,
            vel: self.vel + other.vel,
            obj: self.obj,
            origin: other.origin,
            epoch: self.epoch,
        }
    }
}

impl Sub for PosVel {
    type Output = PosVel;

    /// Re-base two states sharing an origin:
    /// `(A wrt C) − (B wrt C) = A wrt B`.
    ///
    /// # Panics
    ///
    /// Panics when the origins differ.
    fn sub(self, other: PosVel) -> PosVel {
        assert!(
            self.origin == other.origin,
            "PosVel subtraction requires (A wrt C) - (B wrt C), got ({} wrt {}) - ({} wrt {})",
            self.obj,
            self.origin,
            other.obj,
            other.origin
        );
        PosVel {
            pos: self.pos - other.pos,
            vel: self.vel - other.vel,
            obj: self.obj,
            origin: other.obj,
            epoch: self.epoch,
        }
    }
}
