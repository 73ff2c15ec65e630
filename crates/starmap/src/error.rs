//! Error types for the starmap core.

use thiserror::Error;

/// The dataset could not be obtained. Callers on the `load` path never see
/// this: it is logged and replaced by the synthetic fallback.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("catalogue endpoint returned HTTP {0}")]
    Status(u16),

    #[error("catalogue I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalogue JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalogue at {0} contained no records")]
    Empty(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("schedule has no phases")]
    NoPhases,

    #[error("phase {index} ('{name}') has invalid duration {duration_s}")]
    InvalidDuration {
        index: usize,
        name: String,
        duration_s: f32,
    },

    #[error("schedule loop length must be positive")]
    ZeroLength,

    #[error("phase {index} ('{name}') weights do not sum to 1")]
    UnnormalizedWeights { index: usize, name: String },

    #[error("phase {index} ends on different weights than phase {next} starts with")]
    Discontinuity { index: usize, next: usize },
}

#[derive(Debug, Error, PartialEq)]
pub enum BufferError {
    #[error("layout {layout} has {got} floats, expected {expected}")]
    LayoutLength {
        layout: usize,
        got: usize,
        expected: usize,
    },
}
