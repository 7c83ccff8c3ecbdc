// Error types for the sequencer core
// Everything fallible at the public API boundary returns SequencerError

/// Sequencer error types
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error("Invalid pattern length: {0} (must be 1..={max})", max = crate::sequencer::pattern::MAX_PATTERN_LENGTH)]
    InvalidLength(usize),

    #[error("Invalid tempo: {0} BPM (must be between 20 and 999)")]
    InvalidTempo(f64),

    #[error("Step {index} out of range (pattern length {length})")]
    StepOutOfRange { index: usize, length: usize },

    #[error("Gate tick {0} out of range (must be 0..16)")]
    InvalidGateTick(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SequencerResult<T> = Result<T, SequencerError>;
