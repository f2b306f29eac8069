/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/
use thiserror::Error;

/// The crate's result alias; see `GrtsError` for the failure taxonomy.
pub type Result<T> = std::result::Result<T, GrtsError>;

/// Failure taxonomy for shapefile/dBASE parsing and GRTS sampling.
#[derive(Error, Debug)]
pub enum GrtsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file truncated: expected at least {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("bad file magic: expected {expected:#x}, found {found:#x}")]
    BadMagic { expected: i32, found: i32 },

    #[error("unsupported shapefile version: {0}")]
    UnsupportedVersion(i32),

    #[error("unknown shape type code: {0}")]
    UnknownShapeType(i32),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("schema mismatch across input files: {0}")]
    SchemaMismatch(String),

    #[error("memory allocation failure: {0}")]
    AllocationFailure(String),

    #[error("exceeded max_try ({0}) while placing a sample point")]
    MaxTryExhausted(u32),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// A recoverable condition surfaced to the caller instead of aborting.
#[derive(Debug, Clone, PartialEq)]
pub enum GrtsWarning {
    /// The header's stored bounding box disagreed with the true union of
    /// the records actually read; the true union was used.
    InconsistentBox { record: usize },
    /// A dBASE record was marked deleted (`*` flag) and was skipped.
    DeletedRecord { record: usize },
}

/// Receives recoverable warnings as they occur. Default is to discard them,
/// matching the "default: discard" rule for these conditions.
pub trait WarningSink {
    fn warn(&mut self, warning: GrtsWarning);
}

/// A `WarningSink` that discards every warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardWarnings;

impl WarningSink for DiscardWarnings {
    fn warn(&mut self, _warning: GrtsWarning) {}
}

/// A `WarningSink` that accumulates warnings into a `Vec`, useful for tests
/// and for hosts that want to inspect them after a run.
#[derive(Debug, Default)]
pub struct CollectWarnings(pub Vec<GrtsWarning>);

impl WarningSink for CollectWarnings {
    fn warn(&mut self, warning: GrtsWarning) {
        self.0.push(warning);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_collect_warnings() {
        let mut sink = CollectWarnings::default();
        sink.warn(GrtsWarning::DeletedRecord { record: 3 });
        assert_eq!(sink.0.len(), 1);
    }

    #[test]
    fn test_discard_warnings() {
        let mut sink = DiscardWarnings;
        sink.warn(GrtsWarning::InconsistentBox { record: 0 });
    }
}
