//! Error types for the ets-forecast library.

use thiserror::Error;

/// Result type alias for ETS operations.
pub type Result<T> = std::result::Result<T, EtsError>;

/// Errors that can occur while constructing, fitting, or querying an ETS model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EtsError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the requested model.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid model specification (e.g. damping without trend).
    #[error("invalid model specification: {0}")]
    InvalidSpecification(String),

    /// A multiplicative component was requested on data with non-positive values.
    #[error("non-positive observation {value} at index {index}: multiplicative components require strictly positive data")]
    NonPositiveData { index: usize, value: f64 },

    /// Invalid parameter value or parameter vector.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Numerical failure (e.g. the recursion left the model's domain).
    #[error("computation error: {0}")]
    ComputationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = EtsError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = EtsError::InsufficientData { needed: 8, got: 5 };
        assert_eq!(err.to_string(), "insufficient data: need at least 8, got 5");

        let err = EtsError::InvalidSpecification("damped trend requires a trend component".into());
        assert_eq!(
            err.to_string(),
            "invalid model specification: damped trend requires a trend component"
        );

        let err = EtsError::NonPositiveData {
            index: 3,
            value: -1.5,
        };
        assert!(err.to_string().contains("index 3"));

        let err = EtsError::IndexOutOfBounds { index: 10, size: 5 };
        assert_eq!(err.to_string(), "index out of bounds: 10 (size: 5)");
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = EtsError::EmptyData;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
