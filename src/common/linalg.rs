//! Numeric helpers shared by the filter core.

use nalgebra::DMatrix;
use std::f64::consts::PI;

/// Normalize an angle into (−π, π].
///
/// Innovations on angular measurement components must be wrapped before
/// they enter the Kalman update; a raw difference of two angles that
/// straddle ±π is otherwise off by a full turn.
pub fn wrap_angle(theta: f64) -> f64 {
    let mut wrapped = theta % (2.0 * PI);
    if wrapped > PI {
        wrapped -= 2.0 * PI;
    } else if wrapped <= -PI {
        wrapped += 2.0 * PI;
    }
    wrapped
}

/// Make a matrix symmetric by averaging with its transpose.
pub fn symmetrize(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    0.5 * (matrix + matrix.transpose())
}

/// Check if a matrix is positive definite (Cholesky succeeds).
pub fn is_positive_definite(matrix: &DMatrix<f64>) -> bool {
    matrix.clone().cholesky().is_some()
}
