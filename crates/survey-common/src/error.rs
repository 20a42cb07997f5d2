//! Error types for line-survey queries.

use thiserror::Error;

/// Result type alias using SurveyError.
pub type SurveyResult<T> = Result<T, SurveyError>;

/// Primary error type for survey data operations.
#[derive(Debug, Error)]
pub enum SurveyError {
    // === Input validation ===
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid coordinate dimensions: {0}")]
    Dimension(String),

    #[error("Invalid grid resolution: {0} (must be a positive finite number)")]
    InvalidResolution(f64),

    #[error("Invalid point step: {0} (must be at least 1)")]
    InvalidStep(usize),

    #[error("Invalid distance: {0} (must be a positive finite number)")]
    InvalidDistance(f64),

    #[error("Coordinates must be in projected units: {0}")]
    Units(String),

    // === Reference systems ===
    #[error("Unable to resolve reference system: {0}")]
    UnresolvedSystem(String),

    #[error("Coordinate transform failed: {0}")]
    Transform(String),

    // === Selection ===
    #[error("No points selected: {0}")]
    EmptySelection(String),

    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    #[error("Invalid line index: {0}")]
    InvalidLineIndex(String),

    // === Infrastructure ===
    #[error("Failed to read data: {0}")]
    DataRead(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SurveyError {
    /// Create a Transform error.
    pub fn transform(msg: impl Into<String>) -> Self {
        Self::Transform(msg.into())
    }

    /// Create an EmptySelection error.
    pub fn empty_selection(msg: impl Into<String>) -> Self {
        Self::EmptySelection(msg.into())
    }

    /// Create a Dimension error.
    pub fn dimension(msg: impl Into<String>) -> Self {
        Self::Dimension(msg.into())
    }

    /// Whether the error was caused by caller input rather than the data source.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, SurveyError::DataRead(_) | SurveyError::Config(_))
    }
}

impl From<std::io::Error> for SurveyError {
    fn from(err: std::io::Error) -> Self {
        SurveyError::DataRead(err.to_string())
    }
}
