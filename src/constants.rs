//! # Constants and type definitions for Pulstoa
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! definitions** used throughout the `pulstoa` library.
//!
//! ## Overview
//!
//! - Astronomical and geophysical constants
//! - Unit conversions (days ↔ seconds, JD ↔ MJD, AU ↔ km)
//! - Core type aliases used across the crate
//! - Solar-system body masses expressed in time units (GM/c³, seconds),
//!   the form consumed by relativistic delay formulas
//!
//! These definitions are used by all main modules, including TOA ingestion,
//! clock correction, time-scale conversion, and the delay models.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Conversion factor between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Speed of light in km/s
pub const VLIGHT: f64 = 2.99792458e5;

/// TT − TAI offset in seconds (defining constant)
pub const TT_MINUS_TAI: f64 = 32.184;

/// Ratio of sidereal day to solar day
pub const SIDEREAL_RATIO: f64 = 1.00273790934;

/// Earth rotation rate in rad/s (sidereal)
pub const EARTH_ROT_RATE: f64 = DPI * SIDEREAL_RATIO / SECONDS_PER_DAY;

// -------------------------------------------------------------------------------------------------
// Body masses in time units
// -------------------------------------------------------------------------------------------------

/// Speed of light cubed, km³/s³
const VLIGHT3: f64 = VLIGHT * VLIGHT * VLIGHT;

/// GM of the Sun, km³/s²
pub const GM_SUN: f64 = 1.32712440018e11;
/// GM of Mercury, km³/s²
pub const GM_MERCURY: f64 = 2.2032e4;
/// GM of Venus, km³/s²
pub const GM_VENUS: f64 = 3.24858592e5;
/// GM of the Earth, km³/s²
pub const GM_EARTH: f64 = 3.986004418e5;
/// GM of Mars, km³/s²
pub const GM_MARS: f64 = 4.282837e4;
/// GM of the Jupiter system, km³/s²
pub const GM_JUPITER: f64 = 1.26712764e8;
/// GM of the Saturn system, km³/s²
pub const GM_SATURN: f64 = 3.79405852e7;
/// GM of the Uranus system, km³/s²
pub const GM_URANUS: f64 = 5.794548e6;
/// GM of the Neptune system, km³/s²
pub const GM_NEPTUNE: f64 = 6.836527e6;

/// Solar mass in time units (GM/c³), seconds
pub const T_SUN: f64 = GM_SUN / VLIGHT3;
/// Mercury mass in time units, seconds
pub const T_MERCURY: f64 = GM_MERCURY / VLIGHT3;
/// Venus mass in time units, seconds
pub const T_VENUS: f64 = GM_VENUS / VLIGHT3;
/// Earth mass in time units, seconds
pub const T_EARTH: f64 = GM_EARTH / VLIGHT3;
/// Mars mass in time units, seconds
pub const T_MARS: f64 = GM_MARS / VLIGHT3;
/// Jupiter-system mass in time units, seconds
pub const T_JUPITER: f64 = GM_JUPITER / VLIGHT3;
/// Saturn-system mass in time units, seconds
pub const T_SATURN: f64 = GM_SATURN / VLIGHT3;
/// Uranus-system mass in time units, seconds
pub const T_URANUS: f64 = GM_URANUS / VLIGHT3;
/// Neptune-system mass in time units, seconds
pub const T_NEPTUNE: f64 = GM_NEPTUNE / VLIGHT3;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Modified Julian Date (days)
pub type MJD = f64;
/// Time interval in seconds
pub type Second = f64;
/// TOA uncertainty in microseconds
pub type MicroSecond = f64;
/// Observing frequency in MHz
pub type MegaHertz = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Observatory identifier resolved against the known-observatory set
pub type ObsCode = String;
