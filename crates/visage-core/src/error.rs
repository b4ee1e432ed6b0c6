//! Error types for the visage engine.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Landmark index {index} out of bounds for set of {len} points")]
    MissingLandmark { index: usize, len: usize },

    #[error("Landmark {index} has a non-finite coordinate")]
    NonFiniteLandmark { index: usize },

    #[error("Duplicate predicate name: {0}")]
    DuplicatePredicate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Narrative oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Malformed geometry is recovered per predicate and never aborts a batch.
    pub fn is_malformed_landmarks(&self) -> bool {
        matches!(
            self,
            Error::MissingLandmark { .. } | Error::NonFiniteLandmark { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_classification() {
        assert!(Error::MissingLandmark { index: 470, len: 468 }.is_malformed_landmarks());
        assert!(Error::NonFiniteLandmark { index: 3 }.is_malformed_landmarks());
        assert!(!Error::Config("bad".into()).is_malformed_landmarks());
    }

    #[test]
    fn test_error_display() {
        let err = Error::MissingLandmark { index: 470, len: 468 };
        assert_eq!(
            err.to_string(),
            "Landmark index 470 out of bounds for set of 468 points"
        );
    }
}
