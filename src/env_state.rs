//! # Earth-orientation service
//!
//! This module defines [`EopService`], the process-wide holder of Earth
//! orientation (UT1 − UTC) data needed by the barycentric-time converter and
//! the solar-system geometry provider.
//!
//! Unlike an implicit module-level global, the service has an **explicit,
//! documented lifecycle**:
//!
//! 1. Construct with [`EopService::new`] (JPL source) or
//!    [`EopService::disabled`] (offline mode).
//! 2. The underlying [`hifitime::ut1::Ut1Provider`] is downloaded lazily on
//!    first use and cached for the process lifetime.
//! 3. [`EopService::reload`] drops the cached provider so the next access
//!    fetches fresh data.
//!
//! In disabled mode, or when the download fails, UT1 − UTC is treated as
//! zero and a warning is emitted; processing never aborts on missing Earth
//! orientation data.

use hifitime::ut1::Ut1Provider;
use once_cell::sync::OnceCell;

/// Where the Earth orientation data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EopSource {
    /// JPL Earth-orientation parameter file, fetched over HTTP by hifitime.
    Jpl { file: String },
    /// No external data; UT1 − UTC is taken as zero.
    Disabled,
}

/// Process-lifetime cache of UT1 − UTC correction data.
#[derive(Debug)]
pub struct EopService {
    source: EopSource,
    provider: OnceCell<Option<Ut1Provider>>,
}

impl Default for EopService {
    fn default() -> Self {
        Self::new()
    }
}

impl EopService {
    /// Service backed by the JPL long-horizon EOP file.
    ///
    /// The file is not fetched here; the first call to
    /// [`ut1_provider`](EopService::ut1_provider) triggers the download.
    pub fn new() -> Self {
        EopService {
            source: EopSource::Jpl {
                file: "latest_eop2.long".to_string(),
            },
            provider: OnceCell::new(),
        }
    }

    /// Offline service: every UT1 − UTC query yields zero.
    ///
    /// Useful for environments without network access; the geometry
    /// computed this way carries an Earth-rotation error of up to ~0.9 s
    /// of rotation (the maximum |UT1 − UTC|).
    pub fn disabled() -> Self {
        EopService {
            source: EopSource::Disabled,
            provider: OnceCell::new(),
        }
    }

    /// Get the cached UT1 provider, downloading it on first use.
    ///
    /// Return
    /// ------
    /// * `Some(&Ut1Provider)` when data is available, `None` in disabled
    ///   mode or after a failed download (logged, not fatal).
    pub fn ut1_provider(&self) -> Option<&Ut1Provider> {
        self.provider
            .get_or_init(|| match &self.source {
                EopSource::Disabled => None,
                EopSource::Jpl { file } => match Ut1Provider::download_from_jpl(file) {
                    Ok(provider) => Some(provider),
                    Err(e) => {
                        log::warn!("UT1 download from JPL failed ({e}), using UT1 - UTC = 0");
                        None
                    }
                },
            })
            .as_ref()
    }

    /// Drop the cached provider; the next access re-fetches the data.
    pub fn reload(&mut self) {
        self.provider = OnceCell::new();
    }
}
