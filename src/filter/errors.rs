//! Error types for the estimator and the fusion pipeline.

use std::fmt;

/// Errors that can occur while configuring or running the filter.
///
/// Configuration and usage errors (`DimensionMismatch`, `Uninitialized`)
/// abort the offending call. Algorithmic failures
/// (`SingularInnovationCovariance`, `OutOfOrderMeasurement`,
/// `NumericalInstability`) are recoverable: the offending step is skipped
/// and the last valid state is preserved.
#[derive(Debug, Clone)]
pub enum FilterError {
    /// A configuration matrix or vector has the wrong shape
    DimensionMismatch {
        /// Expected (rows, cols)
        expected: (usize, usize),
        /// Actual (rows, cols)
        actual: (usize, usize),
        /// Context (e.g. "transition matrix", "measurement noise")
        context: String,
    },

    /// The innovation covariance could not be inverted during an update
    SingularInnovationCovariance {
        /// Description of where the inversion failed
        context: String,
    },

    /// A measurement timestamp did not strictly increase
    OutOfOrderMeasurement {
        /// Timestamp of the last accepted measurement, microseconds
        previous_us: i64,
        /// Timestamp of the rejected measurement, microseconds
        received_us: i64,
    },

    /// Predict, update, or estimate access before the first measurement
    Uninitialized {
        /// The operation that was attempted
        operation: String,
    },

    /// Numerical degeneracy detected (e.g. radar geometry at the origin)
    NumericalInstability {
        /// Description of the issue
        description: String,
    },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::DimensionMismatch {
                expected,
                actual,
                context,
            } => {
                write!(
                    f,
                    "Dimension mismatch for {}: expected {}x{}, got {}x{}",
                    context, expected.0, expected.1, actual.0, actual.1
                )
            }
            FilterError::SingularInnovationCovariance { context } => {
                write!(f, "Innovation covariance not invertible: {}", context)
            }
            FilterError::OutOfOrderMeasurement {
                previous_us,
                received_us,
            } => {
                write!(
                    f,
                    "Out-of-order measurement: t={}us after t={}us",
                    received_us, previous_us
                )
            }
            FilterError::Uninitialized { operation } => {
                write!(f, "{} called before the track was initialized", operation)
            }
            FilterError::NumericalInstability { description } => {
                write!(f, "Numerical instability: {}", description)
            }
        }
    }
}

impl std::error::Error for FilterError {}
