use thiserror::Error;

use crate::toa::format::ToaFormat;

#[derive(Error, Debug)]
pub enum PulstoaError {
    #[error("cannot identify observatory '{0}'")]
    UnknownObservatory(String),

    #[error("TOA format '{0}' not implemented")]
    UnimplementedFormat(ToaFormat),

    #[error("malformed {format} TOA line: {line:?}")]
    MalformedLine { format: ToaFormat, line: String },

    #[error("malformed {0} command: {1:?}")]
    MalformedCommand(String, String),

    #[error("negative TOA uncertainty: {0} us")]
    NegativeUncertainty(f64),

    #[error("non-finite site coordinate for observatory '{0}'")]
    InvalidSiteCoordinates(String),

    #[error("clock correction table epochs must be strictly increasing")]
    NonMonotonicClockTable,

    #[error("clock correction table has no breakpoints")]
    EmptyClockTable,

    #[error("TDB column missing: run compute_tdbs() before compute_posvels()")]
    MissingTdb,

    #[error("geometry columns missing: run compute_posvels() first")]
    MissingGeometry,

    #[error("planetary Shapiro delay requested but geometry was computed without planets")]
    MissingPlanetaryGeometry,

    #[error("ephemeris oracle failure for {body}: {reason}")]
    EphemerisError { body: String, reason: String },

    #[error("unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("cache artifact encoding failed: {0}")]
    CacheEncodeError(#[from] bincode::Error),
}

impl PartialEq for PulstoaError {
    fn eq(&self, other: &Self) -> bool {
        use PulstoaError::*;
        match (self, other) {
            (UnknownObservatory(a), UnknownObservatory(b)) => a == b,
            (UnimplementedFormat(a), UnimplementedFormat(b)) => a == b,
            (
                MalformedLine { format: a, line: b },
                MalformedLine {
                    format: c,
                    line: d,
                },
            ) => a == c && b == d,
            (MalformedCommand(a, b), MalformedCommand(c, d)) => a == c && b == d,
            (NegativeUncertainty(a), NegativeUncertainty(b)) => a == b,
            (InvalidSiteCoordinates(a), InvalidSiteCoordinates(b)) => a == b,
            (NonMonotonicClockTable, NonMonotonicClockTable) => true,
            (EmptyClockTable, EmptyClockTable) => true,

            // Not comparable beyond the variant itself
            (IoError(_), IoError(_)) => true,
            (CacheEncodeError(_), CacheEncodeError(_)) => true,

            (
                EphemerisError { body: a, reason: b },
                EphemerisError { body: c, reason: d },
            ) => a == c && b == d,

            (MissingTdb, MissingTdb) => true,
            (MissingGeometry, MissingGeometry) => true,
            (MissingPlanetaryGeometry, MissingPlanetaryGeometry) => true,

            _ => false,
        }
    }
}
