use thiserror::Error;

/// Error type for the fallible edges of the engine: configuration, CPF inputs, and
/// snapshot loading. Schedule resolution itself never fails.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("CPF configuration error: {0}")]
    CpfConfig(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid month `{0}`, expected YYYY-MM")]
    InvalidMonth(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
