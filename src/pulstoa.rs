//! # Pulstoa: environment, ephemerides, and observatory registry
//!
//! This module defines the [`Pulstoa`] struct, the central façade that
//! wires together:
//!
//! 1. **Observatory registry** — known sites with aliases, Earth-fixed
//!    positions, and clock correction tables.
//! 2. **Earth-orientation service** ([`EopService`]) — UT1 − UTC data,
//!    fetched once per process.
//! 3. **Ephemeris oracle** — an opaque [`Ephemeris`] provider of body
//!    states.
//!
//! Its [`get_toas`](Pulstoa::get_toas) entry point runs the whole
//! pipeline for a `.tim` file — parse, clock-correct, convert to TDB,
//! compute geometry — and handles the persistence cache on both ends:
//! a fresh artifact short-circuits everything, a recomputation
//! re-serializes.
//!
//! ## Typical usage
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use pulstoa::observatories::{Observatory, ObservatoryRegistry};
//! use pulstoa::pulstoa::Pulstoa;
//! # fn ephemeris() -> Box<dyn pulstoa::geometry::ephemeris::Ephemeris> { unimplemented!() }
//!
//! # fn demo() -> Result<(), pulstoa::pulstoa_errors::PulstoaError> {
//! let mut registry = ObservatoryRegistry::new();
//! registry.insert(Observatory::new(
//!     "GBT", &["G", "GBT"], 882.589, -4924.872, 3943.729,
//! )?);
//!
//! let ctx = Pulstoa::new(registry, ephemeris());
//! let toas = ctx.get_toas(Utf8Path::new("pulsar.tim"), true, true)?;
//! println!("{}", toas.get_summary());
//! # Ok(()) }
//! ```

use std::fmt;

use camino::Utf8Path;
use log::{info, warn};

use crate::cache;
use crate::env_state::EopService;
use crate::geometry::ephemeris::Ephemeris;
use crate::geometry::posvels::compute_posvels;
use crate::observatories::clock::ClockCorrectionConfig;
use crate::observatories::ObservatoryRegistry;
use crate::pulstoa_errors::PulstoaError;
use crate::toa::clock_corrections::apply_clock_corrections;
use crate::toa::collection::ToaCollection;
use crate::toa::reader::read_toas;
use crate::toa::tdb::compute_tdbs;

/// The pipeline context: registry, Earth orientation, ephemeris oracle,
/// and the clock-correction policy.
pub struct Pulstoa {
    registry: ObservatoryRegistry,
    ephemeris: Box<dyn Ephemeris>,
    eop: EopService,
    clock_config: ClockCorrectionConfig,
}

impl fmt::Debug for Pulstoa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pulstoa")
            .field("registry", &self.registry)
            .field("ephemeris", &self.ephemeris.label())
            .field("eop", &self.eop)
            .field("clock_config", &self.clock_config)
            .finish()
    }
}

impl Pulstoa {
    /// Construct a new [`Pulstoa`] context.
    ///
    /// Arguments
    /// ---------
    /// * `registry`: the known-observatory set
    /// * `ephemeris`: the ephemeris oracle used by the geometry stage
    ///
    /// The Earth-orientation service defaults to the JPL source; replace
    /// it with [`with_eop`](Pulstoa::with_eop) for offline use.
    pub fn new(registry: ObservatoryRegistry, ephemeris: Box<dyn Ephemeris>) -> Self {
        Pulstoa {
            registry,
            ephemeris,
            eop: EopService::new(),
            clock_config: ClockCorrectionConfig::default(),
        }
    }

    /// Replace the Earth-orientation service.
    pub fn with_eop(mut self, eop: EopService) -> Self {
        self.eop = eop;
        self
    }

    /// Replace the clock-correction policy.
    pub fn with_clock_config(mut self, config: ClockCorrectionConfig) -> Self {
        self.clock_config = config;
        self
    }

    pub fn registry(&self) -> &ObservatoryRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ObservatoryRegistry {
        &mut self.registry
    }

    pub fn eop(&self) -> &EopService {
        &self.eop
    }

    pub fn ephemeris(&self) -> &dyn Ephemeris {
        self.ephemeris.as_ref()
    }

    /// Load and prepare TOAs for timing-model use.
    ///
    /// Loads TOAs from a `.tim` file (a `.pickle`/`.pickle.gz` path is
    /// mapped back to its source), applies clock corrections, computes
    /// TDB columns, computes the observatory/Earth/Sun (and optionally
    /// planet) position-velocity columns, and serializes the result next
    /// to the source for later runs.
    ///
    /// Arguments
    /// ---------
    /// * `timfile`: the TOA file to load
    /// * `planets`: also compute the planetary geometry columns
    /// * `usepickle`: consult and refresh the persistence cache
    ///
    /// Return
    /// ------
    /// * The fully processed [`ToaCollection`]
    pub fn get_toas(
        &self,
        timfile: &Utf8Path,
        planets: bool,
        usepickle: bool,
    ) -> Result<ToaCollection, PulstoaError> {
        let source = cache::strip_pickle_extension(timfile);
        if usepickle {
            if let Some(toas) = cache::load_cached(&source) {
                info!("Reading TOAs from the cached artifact next to '{source}'.");
                return Ok(toas);
            }
        }
        let mut toas = read_toas(&source, &self.registry)?;
        info!("Applying clock corrections.");
        apply_clock_corrections(&mut toas, &self.registry, &self.clock_config)?;
        info!("Getting Earth orientation params and computing TDBs.");
        compute_tdbs(&mut toas, &self.eop)?;
        info!("Computing observatory positions and velocities.");
        compute_posvels(&mut toas, &self.registry, self.ephemeris.as_ref(), planets)?;
        if usepickle {
            info!("Pickling TOAs.");
            if let Err(e) = cache::store(&toas, &source, true) {
                // A cold cache is not a pipeline failure
                warn!("failed to write cache artifact for '{source}': {e}");
            }
        }
        Ok(toas)
    }
}
