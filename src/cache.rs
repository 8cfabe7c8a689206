//! # Persistence cache
//!
//! Parsing, clock correction, TDB conversion and geometry together are
//! expensive; this module serializes the finished [`ToaCollection`] next
//! to its source file as `<source>.pickle` (plain) or
//! `<source>.pickle.gz` (gzip), and reuses the artifact on later loads
//! when its modification time is newer than the source.
//!
//! The artifact is a versioned envelope: a magic tag and format version
//! precede the payload, so a schema change **fails closed** — the stale
//! artifact is ignored and the pipeline recomputes. Any decode failure
//! falls back the same way; the cache is an optimization, never a source
//! of errors.

use std::fs;
use std::io::{Read, Write};
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::pulstoa_errors::PulstoaError;
use crate::toa::collection::ToaCollection;

const CACHE_MAGIC: [u8; 8] = *b"PULSTOA\0";

/// Bump on any change to the serialized [`ToaCollection`] layout.
pub const CACHE_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    magic: [u8; 8],
    version: u32,
    collection: &'a ToaCollection,
}

#[derive(Deserialize)]
struct Envelope {
    magic: [u8; 8],
    version: u32,
    collection: ToaCollection,
}

/// The two artifact paths derived from a source file, `.pickle` and
/// `.pickle.gz`; recognition is symmetric between read and write.
pub fn pickle_paths(source: &Utf8Path) -> (Utf8PathBuf, Utf8PathBuf) {
    (
        Utf8PathBuf::from(format!("{source}.pickle")),
        Utf8PathBuf::from(format!("{source}.pickle.gz")),
    )
}

/// Strip a trailing `.pickle` or `.pickle.gz` from a user-supplied path,
/// recovering the logical source file.
pub fn strip_pickle_extension(path: &Utf8Path) -> Utf8PathBuf {
    let s = path.as_str();
    if let Some(stripped) = s.strip_suffix(".pickle.gz") {
        Utf8PathBuf::from(stripped)
    } else if let Some(stripped) = s.strip_suffix(".pickle") {
        Utf8PathBuf::from(stripped)
    } else {
        path.to_path_buf()
    }
}

fn mtime(path: &Utf8Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

/// Try to load a cached collection for the given source file.
///
/// Returns `None` — silently falling back to recomputation — when no
/// artifact exists, the artifact is older than the source, or it fails
/// to decode (wrong magic, other version, truncated bytes).
pub fn load_cached(source: &Utf8Path) -> Option<ToaCollection> {
    let (plain, gz) = pickle_paths(source);
    let (artifact, gzipped) = if gz.is_file() {
        (gz, true)
    } else if plain.is_file() {
        (plain, false)
    } else {
        return None;
    };

    let source_mtime = mtime(source)?;
    let artifact_mtime = mtime(&artifact)?;
    if artifact_mtime <= source_mtime {
        debug!("cache artifact '{artifact}' is older than its source, recomputing");
        return None;
    }

    let bytes = match read_artifact(&artifact, gzipped) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("failed to read cache artifact '{artifact}' ({e}), recomputing");
            return None;
        }
    };
    match bincode::deserialize::<Envelope>(&bytes) {
        Ok(envelope) if envelope.magic == CACHE_MAGIC && envelope.version == CACHE_VERSION => {
            Some(envelope.collection)
        }
        Ok(envelope) => {
            warn!(
                "cache artifact '{artifact}' has version {} (expected {CACHE_VERSION}), recomputing",
                envelope.version
            );
            None
        }
        Err(e) => {
            warn!("failed to decode cache artifact '{artifact}' ({e}), recomputing");
            None
        }
    }
}

fn read_artifact(path: &Utf8Path, gzipped: bool) -> Result<Vec<u8>, std::io::Error> {
    let raw = fs::read(path)?;
    if gzipped {
        let mut decoder = GzDecoder::new(raw.as_slice());
        let mut bytes = Vec::new();
        decoder.read_to_end(&mut bytes)?;
        Ok(bytes)
    } else {
        Ok(raw)
    }
}

/// Serialize a collection next to its source file.
///
/// Arguments
/// ---------
/// * `toas`: the fully processed collection
/// * `source`: the logical source file the artifact belongs to
/// * `gzip`: write `<source>.pickle.gz` instead of `<source>.pickle`
///
/// Return
/// ------
/// * `Ok(())` on success; encoding and io failures propagate so the
///   caller can decide whether a cold cache matters
pub fn store(toas: &ToaCollection, source: &Utf8Path, gzip: bool) -> Result<(), PulstoaError> {
    let envelope = EnvelopeRef {
        magic: CACHE_MAGIC,
        version: CACHE_VERSION,
        collection: toas,
    };
    let bytes = bincode::serialize(&envelope)?;
    let (plain, gz) = pickle_paths(source);
    if gzip {
        let file = fs::File::create(gz)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(&bytes)?;
        encoder.finish()?;
    } else {
        fs::write(plain, &bytes)?;
    }
    Ok(())
}
