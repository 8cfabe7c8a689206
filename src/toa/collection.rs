//! # The materialized TOA table
//!
//! [`ToaCollection`] is the single row store every post-parse stage
//! operates on: an ordered sequence of accepted [`Toa`] records plus the
//! command log, the set of distinct observatories, and the derived
//! columns added by the clock, TDB and geometry stages.
//!
//! Grouping by observatory is a **derived index**, recomputed on demand
//! by [`ToaCollection::groups`]; it is never stored, so it cannot
//! desynchronize from the base rows.

use std::collections::{BTreeSet, HashMap};

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::constants::{MegaHertz, MicroSecond, Second, MJD};
use crate::geometry::{Body, PosVel};
use crate::time::MjdPair;
use crate::toa::Toa;

/// One observatory group of the derived index: the canonical site name
/// and the row indices belonging to it, in original file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsGroup {
    pub obs: String,
    pub rows: Vec<usize>,
}

/// Geometry columns added by the solar-system geometry provider,
/// one [`PosVel`] per row per body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryColumns {
    /// Whether the planetary columns were computed.
    pub with_planets: bool,
    /// Observatory relative to the geocenter.
    pub obs_pv: Vec<PosVel>,
    /// Earth relative to the solar-system barycenter.
    pub earth_pv: Vec<PosVel>,
    /// Observatory relative to the solar-system barycenter.
    pub ssb_obs_pv: Vec<PosVel>,
    /// Sun relative to the observatory.
    pub obs_sun_pv: Vec<PosVel>,
    pub obs_jupiter_pv: Option<Vec<PosVel>>,
    pub obs_saturn_pv: Option<Vec<PosVel>>,
    pub obs_venus_pv: Option<Vec<PosVel>>,
    pub obs_uranus_pv: Option<Vec<PosVel>>,
}

impl GeometryColumns {
    /// The observatory-to-body column for one of the modeled planets.
    pub fn planet_column(&self, body: Body) -> Option<&Vec<PosVel>> {
        match body {
            Body::Jupiter => self.obs_jupiter_pv.as_ref(),
            Body::Saturn => self.obs_saturn_pv.as_ref(),
            Body::Venus => self.obs_venus_pv.as_ref(),
            Body::Uranus => self.obs_uranus_pv.as_ref(),
            _ => None,
        }
    }
}

/// An ordered collection of TOAs loaded from one top-level file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ToaCollection {
    /// The top-level source file, when read from disk.
    pub filename: Option<Utf8PathBuf>,
    pub(crate) toas: Vec<Toa>,
    /// Parsed command lines, each paired with the count of rows accepted
    /// before the command was seen.
    pub(crate) commands: Vec<(Vec<String>, usize)>,
    pub(crate) observatories: BTreeSet<String>,
    /// Rows rejected by the uncertainty/frequency bound filters.
    pub(crate) n_filtered: usize,
    pub(crate) tdb: Option<Vec<MJD>>,
    pub(crate) tdb_hp: Option<Vec<MjdPair>>,
    pub(crate) delta_ut1: Option<Vec<Second>>,
    pub(crate) geometry: Option<GeometryColumns>,
}

impl ToaCollection {
    pub fn new(filename: Option<&Utf8Path>) -> Self {
        ToaCollection {
            filename: filename.map(Utf8Path::to_path_buf),
            ..Default::default()
        }
    }

    /// Number of accepted rows.
    pub fn ntoas(&self) -> usize {
        self.toas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toas.is_empty()
    }

    /// Append an accepted row and register its observatory.
    pub(crate) fn push_toa(&mut self, toa: Toa) {
        self.observatories.insert(toa.obs.clone());
        self.toas.push(toa);
    }

    /// Log a parsed command against the current row count.
    pub(crate) fn record_command(&mut self, tokens: Vec<String>) {
        self.commands.push((tokens, self.toas.len()));
    }

    pub fn toas(&self) -> &[Toa] {
        &self.toas
    }

    pub fn commands(&self) -> &[(Vec<String>, usize)] {
        &self.commands
    }

    /// Distinct observatories encountered, in sorted order.
    pub fn observatories(&self) -> &BTreeSet<String> {
        &self.observatories
    }

    /// Count of rows dropped by the EMIN/EMAX/FMIN/FMAX filters.
    pub fn n_filtered(&self) -> usize {
        self.n_filtered
    }

    /// Return a numpy-style column of the TOA uncertainties in us.
    pub fn get_errors(&self) -> Vec<MicroSecond> {
        self.toas.iter().map(|t| t.error).collect()
    }

    /// Return a column of the observing frequencies in MHz.
    pub fn get_freqs(&self) -> Vec<MegaHertz> {
        self.toas.iter().map(|t| t.freq).collect()
    }

    /// Return a column of the raw timestamps as f64 MJDs.
    pub fn get_mjds(&self) -> Vec<MJD> {
        self.toas.iter().map(|t| t.mjd.as_days()).collect()
    }

    /// True when any row carries the given flag.
    pub fn any_flag(&self, key: &str) -> bool {
        self.toas.iter().any(|t| t.flags.contains_key(key))
    }

    /// TDB column (standard precision), present after the TDB stage.
    pub fn tdb(&self) -> Option<&[MJD]> {
        self.tdb.as_deref()
    }

    /// TDB column (extended precision), present after the TDB stage.
    pub fn tdb_hp(&self) -> Option<&[MjdPair]> {
        self.tdb_hp.as_deref()
    }

    /// Per-row UT1 − UTC offsets in seconds, present after the TDB stage.
    pub fn delta_ut1(&self) -> Option<&[Second]> {
        self.delta_ut1.as_deref()
    }

    /// Geometry columns, present after the geometry stage.
    pub fn geometry(&self) -> Option<&GeometryColumns> {
        self.geometry.as_ref()
    }

    /// Recompute the observatory grouping of the table.
    ///
    /// Groups are keyed by canonical site name and sorted by it; within a
    /// group, rows keep their original file order. The sum of group sizes
    /// always equals the row count.
    pub fn groups(&self) -> Vec<ObsGroup> {
        let mut by_obs: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, toa) in self.toas.iter().enumerate() {
            by_obs.entry(toa.obs.as_str()).or_default().push(idx);
        }
        let groups: Vec<ObsGroup> = by_obs
            .into_iter()
            .sorted_by(|a, b| a.0.cmp(b.0))
            .map(|(obs, rows)| ObsGroup {
                obs: obs.to_string(),
                rows,
            })
            .collect();
        debug_assert_eq!(
            groups.iter().map(|g| g.rows.len()).sum::<usize>(),
            self.toas.len()
        );
        groups
    }

    /// Return a short ASCII summary of the collection.
    pub fn get_summary(&self) -> String {
        let mut s = format!("Number of TOAs:  {}\n", self.ntoas());
        s += &format!("Number of commands:  {}\n", self.commands.len());
        s += &format!(
            "Number of observatories:  {} {:?}\n",
            self.observatories.len(),
            self.observatories.iter().collect::<Vec<_>>()
        );
        if self.n_filtered > 0 {
            s += &format!("Number of filtered-out TOAs:  {}\n", self.n_filtered);
        }
        for group in self.groups() {
            let errors: Vec<MicroSecond> =
                group.rows.iter().map(|&i| self.toas[i].error).collect();
            s += &format!("{} TOAs ({}):\n", group.obs, errors.len());
            s += &format!(
                "  Min error:     {:.3} us\n",
                errors.iter().cloned().fold(f64::INFINITY, f64::min)
            );
            s += &format!(
                "  Max error:     {:.3} us\n",
                errors.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            );
            s += &format!("  Mean error:    {:.3} us\n", mean(&errors));
            s += &format!("  Median error:  {:.3} us\n", median(&errors));
            s += &format!("  Error stddev:  {:.3} us\n", stddev(&errors));
        }
        s
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

fn stddev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64).sqrt()
}
