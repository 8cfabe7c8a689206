//! # TOA line classification and per-dialect parsing
//!
//! Raw `.tim` files mix four data dialects (Princeton, Tempo2, Parkes,
//! ITOA) with command lines, comments and blanks. [`toa_format`] assigns
//! each line one of the closed [`ToaFormat`] tags; [`parse_toa_line`]
//! extracts the timestamp, uncertainty, frequency, site code and flag set
//! for the dialects this crate implements.
//!
//! Parkes and ITOA lines are *recognized* so they can be reported
//! precisely, but parsing them fails with
//! [`PulstoaError::UnimplementedFormat`]: a deliberate scope limit.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{MegaHertz, MicroSecond};
use crate::observatories::ObservatoryRegistry;
use crate::pulstoa_errors::PulstoaError;
use crate::time::MjdPair;
use crate::toa::{FlagValue, ToaFlags};

/// Classification of a single TOA-file line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToaFormat {
    Comment,
    Command,
    Blank,
    Tempo2,
    Princeton,
    Itoa,
    Parkes,
    #[default]
    Unknown,
}

impl fmt::Display for ToaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToaFormat::Comment => "Comment",
            ToaFormat::Command => "Command",
            ToaFormat::Blank => "Blank",
            ToaFormat::Tempo2 => "Tempo2",
            ToaFormat::Princeton => "Princeton",
            ToaFormat::Itoa => "ITOA",
            ToaFormat::Parkes => "Parkes",
            ToaFormat::Unknown => "Unknown",
        };
        write!(f, "{name}")
    }
}

/// The closed set of command keywords recognized on Command lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToaCommand {
    Dither,
    Efac,
    Emax,
    Emap,
    Emin,
    Equad,
    Fmax,
    Fmin,
    Include,
    Info,
    Jump,
    Mode,
    Noskip,
    Pha1,
    Pha2,
    Phase,
    Search,
    Sigma,
    Sim,
    Skip,
    Time,
    Track,
    Zawgt,
    Format,
    End,
}

impl ToaCommand {
    /// Match a whitespace-delimited token against the command keywords.
    pub fn from_keyword(token: &str) -> Option<Self> {
        Some(match token {
            "DITHER" => ToaCommand::Dither,
            "EFAC" => ToaCommand::Efac,
            "EMAX" => ToaCommand::Emax,
            "EMAP" => ToaCommand::Emap,
            "EMIN" => ToaCommand::Emin,
            "EQUAD" => ToaCommand::Equad,
            "FMAX" => ToaCommand::Fmax,
            "FMIN" => ToaCommand::Fmin,
            "INCLUDE" => ToaCommand::Include,
            "INFO" => ToaCommand::Info,
            "JUMP" => ToaCommand::Jump,
            "MODE" => ToaCommand::Mode,
            "NOSKIP" => ToaCommand::Noskip,
            "PHA1" => ToaCommand::Pha1,
            "PHA2" => ToaCommand::Pha2,
            "PHASE" => ToaCommand::Phase,
            "SEARCH" => ToaCommand::Search,
            "SIGMA" => ToaCommand::Sigma,
            "SIM" => ToaCommand::Sim,
            "SKIP" => ToaCommand::Skip,
            "TIME" => ToaCommand::Time,
            "TRACK" => ToaCommand::Track,
            "ZAWGT" => ToaCommand::Zawgt,
            "FORMAT" => ToaCommand::Format,
            "END" => ToaCommand::End,
            _ => return None,
        })
    }
}

/// Fields extracted from one TOA-file line.
///
/// Only the fields meaningful for the detected format are populated; a
/// Command line carries its tokens, a Tempo2 line its flag pairs, and so
/// on.
#[derive(Debug, Clone, Default)]
pub struct ParsedLine {
    pub format: ToaFormat,
    pub mjd: Option<MjdPair>,
    pub freq: Option<MegaHertz>,
    pub error: Option<MicroSecond>,
    /// Canonical observatory name, already resolved through the registry.
    pub obs: Option<String>,
    /// Tempo2 per-line name field and flag pairs, Princeton `ddm`.
    pub flags: ToaFlags,
    /// Whitespace-split tokens of a Command line.
    pub command: Option<Vec<String>>,
}

impl ParsedLine {
    fn empty(format: ToaFormat) -> Self {
        ParsedLine {
            format,
            ..Default::default()
        }
    }
}

static PRINCETON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-z@] ").unwrap());

/// Determine the type of a TOA line.
///
/// Classification order matters: Princeton's leading site code is checked
/// first, then comments, commands and blanks, then the length/override
/// rules for Tempo2, and finally the Parkes/ITOA positional heuristics.
///
/// Arguments
/// ---------
/// * `line`: the raw line, newline stripped
/// * `fmt`: the active FORMAT override from the command state
///
/// Return
/// ------
/// * The detected [`ToaFormat`]
pub fn toa_format(line: &str, fmt: ToaFormat) -> ToaFormat {
    let bytes = line.as_bytes();
    if PRINCETON_RE.is_match(line) {
        ToaFormat::Princeton
    } else if line.starts_with('C') || line.starts_with('#') {
        ToaFormat::Comment
    } else if line
        .split_whitespace()
        .next()
        .and_then(ToaCommand::from_keyword)
        .is_some()
    {
        ToaFormat::Command
    } else if line.trim().is_empty() {
        ToaFormat::Blank
    } else if line.len() > 80 || fmt == ToaFormat::Tempo2 {
        ToaFormat::Tempo2
    } else if line.starts_with("  ") && bytes.len() > 41 && bytes[41] == b'.' {
        ToaFormat::Parkes
    } else if starts_with_two_nonspace(line) && bytes.len() > 14 && bytes[14] == b'.' {
        ToaFormat::Itoa
    } else {
        ToaFormat::Unknown
    }
}

fn starts_with_two_nonspace(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(a), Some(b)) if !a.is_whitespace() && !b.is_whitespace()
    )
}

/// Split a `day.fraction` token into a normalized two-part MJD.
///
/// The fraction keeps its full textual precision: `54567.8768768768` maps
/// to `(54567, 0.8768768768)` without a lossy round-trip through a single
/// float.
fn split_mjd(token: &str, format: ToaFormat, line: &str) -> Result<MjdPair, PulstoaError> {
    let malformed = || PulstoaError::MalformedLine {
        format,
        line: line.to_string(),
    };
    let (ii, ff) = token.split_once('.').ok_or_else(malformed)?;
    let days: i64 = ii.parse().map_err(|_| malformed())?;
    let frac: f64 = format!("0.{ff}").parse().map_err(|_| malformed())?;
    Ok(MjdPair::new(days, frac))
}

/// Parse a one-line ASCII time-of-arrival.
///
/// Arguments
/// ---------
/// * `line`: the raw line, newline stripped
/// * `fmt`: the active FORMAT override from the command state
/// * `registry`: known-observatory set for alias resolution
///
/// Return
/// ------
/// * A [`ParsedLine`] with the extracted fields, or a fatal error for
///   unknown observatories, malformed fields, and the unimplemented
///   Parkes/ITOA dialects
pub fn parse_toa_line(
    line: &str,
    fmt: ToaFormat,
    registry: &ObservatoryRegistry,
) -> Result<ParsedLine, PulstoaError> {
    let format = toa_format(line, fmt);
    let malformed = || PulstoaError::MalformedLine {
        format,
        line: line.to_string(),
    };
    match format {
        ToaFormat::Princeton => {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(malformed());
            }
            let obs_code = line[0..1].to_uppercase();
            let mut parsed = ParsedLine::empty(format);
            parsed.obs = Some(registry.resolve_alias(&obs_code)?);
            parsed.freq = Some(fields[1].parse().map_err(|_| malformed())?);
            parsed.mjd = Some(split_mjd(fields[2], format, line)?);
            parsed.error = Some(fields[3].parse().map_err(|_| malformed())?);
            let ddm: f64 = match fields.get(4) {
                Some(tok) => tok.parse().map_err(|_| malformed())?,
                None => 0.0,
            };
            parsed.flags.insert("ddm".to_string(), FlagValue::Float(ddm));
            Ok(parsed)
        }
        ToaFormat::Tempo2 => {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return Err(malformed());
            }
            let mut parsed = ParsedLine::empty(format);
            parsed
                .flags
                .insert("name".to_string(), FlagValue::Str(fields[0].to_string()));
            parsed.freq = Some(fields[1].parse().map_err(|_| malformed())?);
            parsed.mjd = Some(split_mjd(fields[2], format, line)?);
            parsed.error = Some(fields[3].parse().map_err(|_| malformed())?);
            parsed.obs = Some(registry.resolve_alias(&fields[4].to_uppercase())?);
            // All the rest should be -flag value pairs
            let flags = &fields[5..];
            if flags.len() % 2 != 0 {
                return Err(malformed());
            }
            for pair in flags.chunks_exact(2) {
                let key = pair[0].trim_start_matches('-').to_string();
                parsed.flags.insert(key, FlagValue::coerce(pair[1]));
            }
            Ok(parsed)
        }
        ToaFormat::Command => {
            let mut parsed = ParsedLine::empty(format);
            parsed.command = Some(line.split_whitespace().map(str::to_string).collect());
            Ok(parsed)
        }
        ToaFormat::Parkes | ToaFormat::Itoa => Err(PulstoaError::UnimplementedFormat(format)),
        ToaFormat::Comment | ToaFormat::Blank | ToaFormat::Unknown => {
            Ok(ParsedLine::empty(format))
        }
    }
}
