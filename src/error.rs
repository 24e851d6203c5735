//! Error types for volume loading and tracing

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T, E = TractError> = std::result::Result<T, E>;

/// Errors raised by volume ingestion and the tracing engine
///
/// All load-time errors are fatal to the run that needed the volume and are
/// reported before any tracing starts. Hitting the step ceiling during a
/// trace is not an error; see `trace::StopReason`.
#[derive(Debug, Error)]
pub enum TractError {
    /// An input file was missing, unreadable, or not a valid volume format.
    #[error("failed to load volume '{}': {reason}", path.display())]
    VolumeLoad {
        /// Path of the offending file.
        path: PathBuf,
        /// Human-readable cause, including format diagnostics where available.
        reason: String,
    },

    /// Two volumes that must share one lattice disagree on extent.
    #[error("{what}: expected extent {expected:?}, found {found:?}")]
    VolumeMismatch {
        /// Which pairing failed (e.g. "confidence volume").
        what: &'static str,
        /// The session lattice extent.
        expected: (usize, usize, usize),
        /// The extent actually found.
        found: (usize, usize, usize),
    },

    /// A headerless binary vector file had the wrong byte length.
    #[error(
        "malformed volume file '{}': expected {expected_bytes} bytes, found {found_bytes}",
        path.display()
    )]
    MalformedVolumeFile {
        path: PathBuf,
        expected_bytes: usize,
        found_bytes: usize,
    },

    /// An output volume could not be written.
    #[error("failed to save volume '{}': {reason}", path.display())]
    VolumeSave {
        /// Path of the destination file.
        path: PathBuf,
        /// Human-readable cause.
        reason: String,
    },

    /// A sample was attempted outside the lattice.
    ///
    /// Indicates an engine bug, not bad input: the tracer runs the bounds
    /// predicate before every sample, so this is unreachable from the public
    /// tracing entry points.
    #[error("sample at {point:?} is outside the lattice")]
    OutOfBoundsSample { point: [f64; 3] },
}
