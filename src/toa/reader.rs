//! # Command state machine and recursive file reading
//!
//! [`read_toa_file`] drives the line parser over a `.tim` file, threading
//! an explicit [`ReadContext`] through the scan. The context is **passed
//! by value into each recursive `INCLUDE` call and returned**, which makes
//! the save/restore of the `FORMAT` override around an include an
//! explicit, testable operation instead of a hidden side effect. All
//! other command state deliberately persists across include boundaries.
//!
//! Row acceptance happens here, in a fixed order: SKIP/non-data
//! suppression first, then the EMIN/EMAX/FMIN/FMAX bound filters on the
//! **raw** parsed values, and only then EFAC/EQUAD uncertainty scaling
//! and flag attachment.

use camino::{Utf8Path, Utf8PathBuf};

use crate::constants::{MegaHertz, MicroSecond, Second};
use crate::observatories::ObservatoryRegistry;
use crate::pulstoa_errors::PulstoaError;
use crate::toa::collection::ToaCollection;
use crate::toa::format::{parse_toa_line, ToaCommand, ToaFormat};
use crate::toa::{FlagValue, Toa};

/// Mutable ingestion state carried across a file and its inclusions.
///
/// Initialized once per top-level read, mutated strictly left-to-right as
/// command lines are encountered, and discarded when the read completes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadContext {
    /// Multiplicative uncertainty scale applied to accepted rows.
    pub efac: f64,
    /// Additive (in quadrature) uncertainty floor, microseconds.
    pub equad: MicroSecond,
    pub emin: MicroSecond,
    pub emax: MicroSecond,
    pub fmin: MegaHertz,
    pub fmax: MegaHertz,
    /// Free-text tag attached to accepted rows as the `info` flag.
    pub info: Option<String>,
    /// Suppress all rows until NOSKIP.
    pub skip: bool,
    /// Cumulative TIME offset, seconds.
    pub time_offset: Second,
    /// Cumulative PHASE offset.
    pub phase_offset: f64,
    pub pha1: Option<f64>,
    pub pha2: Option<f64>,
    /// JUMP state: (currently inside a jump, count of closed jumps).
    pub jump: (bool, i64),
    /// Active FORMAT override; reset to Unknown inside an INCLUDE and
    /// restored afterwards.
    pub format: ToaFormat,
    /// Set by END; seals further input.
    pub end: bool,
}

impl Default for ReadContext {
    fn default() -> Self {
        ReadContext {
            efac: 1.0,
            equad: 0.0,
            emin: 0.0,
            emax: 1e100,
            fmin: 0.0,
            fmax: 1e100,
            info: None,
            skip: false,
            time_offset: 0.0,
            phase_offset: 0.0,
            pha1: None,
            pha2: None,
            jump: (false, 0),
            format: ToaFormat::Unknown,
            end: false,
        }
    }
}

/// Read a top-level TOA file into a fresh collection.
///
/// Arguments
/// ---------
/// * `path`: the `.tim` file to read
/// * `registry`: known-observatory set for alias resolution
///
/// Return
/// ------
/// * The populated [`ToaCollection`]; any parse failure, in the file or
///   one of its inclusions, aborts the whole read
pub fn read_toas(
    path: &Utf8Path,
    registry: &ObservatoryRegistry,
) -> Result<ToaCollection, PulstoaError> {
    let mut collection = ToaCollection::new(Some(path));
    read_toa_file(&mut collection, registry, path, ReadContext::default())?;
    Ok(collection)
}

/// First argument of a command line, or a malformed-command error.
fn command_arg<'a>(tokens: &'a [String], line: &str) -> Result<&'a str, PulstoaError> {
    tokens
        .get(1)
        .map(String::as_str)
        .ok_or_else(|| PulstoaError::MalformedCommand(tokens[0].clone(), line.to_string()))
}

/// First argument of a command line parsed as a float.
fn command_farg(tokens: &[String], line: &str) -> Result<f64, PulstoaError> {
    command_arg(tokens, line)?
        .parse()
        .map_err(|_| PulstoaError::MalformedCommand(tokens[0].clone(), line.to_string()))
}

/// Resolve an INCLUDE target relative to the including file.
fn resolve_include(current: &Utf8Path, target: &str) -> Utf8PathBuf {
    let target = Utf8Path::new(target);
    if target.is_absolute() {
        target.to_path_buf()
    } else {
        match current.parent() {
            Some(parent) => parent.join(target),
            None => target.to_path_buf(),
        }
    }
}

/// Scan one file, mutating the collection and threading the context.
///
/// Arguments
/// ---------
/// * `collection`: the collection rows and command log are appended to
/// * `registry`: known-observatory set
/// * `path`: the file to scan
/// * `ctx`: the ingestion state on entry
///
/// Return
/// ------
/// * The ingestion state after the file (and its inclusions) have been
///   consumed, for the caller to continue with
pub fn read_toa_file(
    collection: &mut ToaCollection,
    registry: &ObservatoryRegistry,
    path: &Utf8Path,
    mut ctx: ReadContext,
) -> Result<ReadContext, PulstoaError> {
    let content = std::fs::read_to_string(path)?;
    for line in content.lines() {
        let parsed = parse_toa_line(line, ctx.format, registry)?;
        let format = parsed.format;

        if format == ToaFormat::Command {
            let tokens = parsed.command.clone().unwrap_or_default();
            collection.record_command(tokens.clone());
            let Some(cmd) = tokens.first().and_then(|t| ToaCommand::from_keyword(t)) else {
                continue;
            };
            match cmd {
                ToaCommand::Skip => {
                    ctx.skip = true;
                    continue;
                }
                ToaCommand::Noskip => {
                    ctx.skip = false;
                    continue;
                }
                ToaCommand::End => {
                    ctx.end = true;
                    break;
                }
                ToaCommand::Time => ctx.time_offset += command_farg(&tokens, line)?,
                ToaCommand::Phase => ctx.phase_offset += command_farg(&tokens, line)?,
                ToaCommand::Emin => ctx.emin = command_farg(&tokens, line)?,
                ToaCommand::Emax => ctx.emax = command_farg(&tokens, line)?,
                ToaCommand::Efac => ctx.efac = command_farg(&tokens, line)?,
                ToaCommand::Equad => ctx.equad = command_farg(&tokens, line)?,
                ToaCommand::Pha1 => ctx.pha1 = Some(command_farg(&tokens, line)?),
                ToaCommand::Pha2 => ctx.pha2 = Some(command_farg(&tokens, line)?),
                ToaCommand::Fmin => ctx.fmin = command_farg(&tokens, line)?,
                ToaCommand::Fmax => ctx.fmax = command_farg(&tokens, line)?,
                ToaCommand::Info => ctx.info = Some(command_arg(&tokens, line)?.to_string()),
                ToaCommand::Format => {
                    if command_arg(&tokens, line)? == "1" {
                        ctx.format = ToaFormat::Tempo2;
                    }
                }
                ToaCommand::Jump => {
                    if ctx.jump.0 {
                        ctx.jump.0 = false;
                        ctx.jump.1 += 1;
                    } else {
                        ctx.jump.0 = true;
                    }
                }
                ToaCommand::Include => {
                    let target = resolve_include(path, command_arg(&tokens, line)?);
                    // The FORMAT override must not leak across the include
                    // boundary; everything else persists.
                    let saved_format = ctx.format;
                    ctx.format = ToaFormat::Unknown;
                    ctx = read_toa_file(collection, registry, &target, ctx)?;
                    ctx.format = saved_format;
                }
                ToaCommand::Dither
                | ToaCommand::Emap
                | ToaCommand::Mode
                | ToaCommand::Search
                | ToaCommand::Sigma
                | ToaCommand::Sim
                | ToaCommand::Track
                | ToaCommand::Zawgt => {}
            }
        }

        if ctx.skip
            || matches!(
                format,
                ToaFormat::Blank | ToaFormat::Unknown | ToaFormat::Comment | ToaFormat::Command
            )
        {
            continue;
        }
        if ctx.end {
            // An END inside an included file seals the including file too
            return Ok(ctx);
        }

        let malformed = || PulstoaError::MalformedLine {
            format,
            line: line.to_string(),
        };
        let mjd = parsed.mjd.ok_or_else(malformed)?;
        let raw_error = parsed.error.ok_or_else(malformed)?;
        let freq = parsed.freq.unwrap_or(f64::INFINITY);
        let obs = parsed.obs.ok_or_else(malformed)?;

        // Bound filters use the raw parsed values, before EFAC/EQUAD
        if ctx.emin > raw_error || ctx.emax < raw_error || ctx.fmin > freq || ctx.fmax < freq {
            collection.n_filtered += 1;
            continue;
        }

        let error = (raw_error * ctx.efac).hypot(ctx.equad);
        let mut flags = parsed.flags;
        if let Some(info) = &ctx.info {
            flags.insert("info".to_string(), FlagValue::Str(info.clone()));
        }
        if ctx.jump.0 {
            flags.insert("jump".to_string(), FlagValue::Int(ctx.jump.1));
        }
        if ctx.phase_offset != 0.0 {
            flags.insert("phase".to_string(), FlagValue::Float(ctx.phase_offset));
        }
        if ctx.time_offset != 0.0 {
            flags.insert("time".to_string(), FlagValue::Float(ctx.time_offset));
        }

        let toa = Toa::new(mjd, error, &obs, freq, flags, registry)?;
        collection.push_toa(toa);
    }
    Ok(ctx)
}
