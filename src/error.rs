// Error types for the fallible edges of the engine
// The physics pipeline itself never fails; only feed parsing and config do.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImpactError {
    #[error("failed to parse NeoWs payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("browse year {year} is outside {min}..={max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },

    #[error("ocean mask expects {expected} cells, got {actual}")]
    MaskShape { expected: usize, actual: usize },

    #[error("invalid value {value:?} for {key}")]
    Config { key: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ImpactError>;
