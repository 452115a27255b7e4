//! Motion and observation models for the constant-velocity EKF.
//!
//! The process model is rebuilt every cycle because the elapsed time
//! between measurements varies. The observation models are fixed per
//! sensor: a linear position projection for the laser and the nonlinear
//! polar map (with its Jacobian) for the radar.

use nalgebra::{DMatrix, DVector};

use crate::common::linalg::wrap_angle;
use crate::filter::errors::FilterError;
use crate::filter::estimator::STATE_DIM;

/// Default acceleration noise along x, (units/s²)²
pub const DEFAULT_NOISE_AX: f64 = 9.0;
/// Default acceleration noise along y, (units/s²)²
pub const DEFAULT_NOISE_AY: f64 = 9.0;

/// Squared range below which the radar geometry is degenerate: bearing and
/// range-rate are undefined at the sensor origin.
const DEGENERATE_RANGE_SQ: f64 = 1e-8;

// ============================================================================
// Process model
// ============================================================================

/// Constant-velocity process model.
///
/// Produces the transition matrix F and the discretized
/// white-noise-acceleration covariance Q for a given elapsed time.
#[derive(Debug, Clone)]
pub struct MotionModel {
    /// Acceleration noise along x
    pub noise_ax: f64,
    /// Acceleration noise along y
    pub noise_ay: f64,
}

impl MotionModel {
    /// Create a motion model with the given axis noise parameters.
    pub fn new(noise_ax: f64, noise_ay: f64) -> Self {
        Self { noise_ax, noise_ay }
    }

    /// State transition F for an elapsed time in seconds.
    pub fn transition(&self, dt: f64) -> DMatrix<f64> {
        #[rustfmt::skip]
        let f = DMatrix::from_row_slice(STATE_DIM, STATE_DIM, &[
            1.0, 0.0, dt,  0.0,   // px' = px + dt*vx
            0.0, 1.0, 0.0, dt,    // py' = py + dt*vy
            0.0, 0.0, 1.0, 0.0,   // vx' = vx
            0.0, 0.0, 0.0, 1.0,   // vy' = vy
        ]);
        f
    }

    /// Process noise Q for an elapsed time in seconds.
    ///
    /// Diagonal and cross terms scale as dt⁴/4, dt³/2 and dt², weighted by
    /// the per-axis acceleration noise.
    pub fn process_noise(&self, dt: f64) -> DMatrix<f64> {
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let dt4 = dt3 * dt;
        let ax = self.noise_ax;
        let ay = self.noise_ay;
        #[rustfmt::skip]
        let q = DMatrix::from_row_slice(STATE_DIM, STATE_DIM, &[
            dt4 / 4.0 * ax, 0.0,            dt3 / 2.0 * ax, 0.0,
            0.0,            dt4 / 4.0 * ay, 0.0,            dt3 / 2.0 * ay,
            dt3 / 2.0 * ax, 0.0,            dt2 * ax,       0.0,
            0.0,            dt3 / 2.0 * ay, 0.0,            dt2 * ay,
        ]);
        q
    }
}

impl Default for MotionModel {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_AX, DEFAULT_NOISE_AY)
    }
}

// ============================================================================
// Laser observation model
// ============================================================================

/// Linear laser observation model: measures [px, py] directly.
#[derive(Debug, Clone)]
pub struct LaserModel {
    observation_matrix: DMatrix<f64>,
    noise: DMatrix<f64>,
}

impl LaserModel {
    /// Default position noise variance per axis
    pub const DEFAULT_NOISE_VAR: f64 = 0.0225;

    /// Create a laser model with the given 2x2 measurement noise.
    pub fn new(noise: DMatrix<f64>) -> Result<Self, FilterError> {
        if noise.shape() != (2, 2) {
            return Err(FilterError::DimensionMismatch {
                expected: (2, 2),
                actual: noise.shape(),
                context: "laser measurement noise".to_string(),
            });
        }
        Ok(Self {
            observation_matrix: Self::position_projection(),
            noise,
        })
    }

    /// Observation matrix H (2x4 projection onto position).
    #[inline]
    pub fn observation_matrix(&self) -> &DMatrix<f64> {
        &self.observation_matrix
    }

    /// Measurement noise R (2x2).
    #[inline]
    pub fn noise(&self) -> &DMatrix<f64> {
        &self.noise
    }

    fn position_projection() -> DMatrix<f64> {
        #[rustfmt::skip]
        let h = DMatrix::from_row_slice(2, STATE_DIM, &[
            1.0, 0.0, 0.0, 0.0,   // z[0] = px
            0.0, 1.0, 0.0, 0.0,   // z[1] = py
        ]);
        h
    }
}

impl Default for LaserModel {
    fn default() -> Self {
        Self {
            observation_matrix: Self::position_projection(),
            noise: DMatrix::from_diagonal(&DVector::from_element(2, Self::DEFAULT_NOISE_VAR)),
        }
    }
}

// ============================================================================
// Radar observation model
// ============================================================================

/// Nonlinear radar observation model: maps the Cartesian state to
/// [range ρ, bearing φ, range-rate ρ̇].
///
/// Bearing convention: φ is measured from the +y axis toward +x, so
/// `φ = atan2(px, py)`, `px = ρ sin φ`, `py = ρ cos φ`. Initialization,
/// `h(x)` and the Jacobian all use this one convention.
#[derive(Debug, Clone)]
pub struct RadarModel {
    noise: DMatrix<f64>,
}

impl RadarModel {
    /// Default range noise variance
    pub const DEFAULT_RANGE_VAR: f64 = 0.09;
    /// Default bearing noise variance
    pub const DEFAULT_BEARING_VAR: f64 = 0.0009;
    /// Default range-rate noise variance
    pub const DEFAULT_RANGE_RATE_VAR: f64 = 0.09;

    /// Create a radar model with the given 3x3 measurement noise.
    pub fn new(noise: DMatrix<f64>) -> Result<Self, FilterError> {
        if noise.shape() != (3, 3) {
            return Err(FilterError::DimensionMismatch {
                expected: (3, 3),
                actual: noise.shape(),
                context: "radar measurement noise".to_string(),
            });
        }
        Ok(Self { noise })
    }

    /// Measurement noise R (3x3).
    #[inline]
    pub fn noise(&self) -> &DMatrix<f64> {
        &self.noise
    }

    /// Convert a polar return to a Cartesian position.
    #[inline]
    pub fn to_cartesian(range: f64, bearing: f64) -> (f64, f64) {
        (range * bearing.sin(), range * bearing.cos())
    }

    /// Predicted measurement h(x) at the given state.
    ///
    /// Fails when the position is too close to the sensor origin, where
    /// the polar map is undefined.
    pub fn predict_measurement(&self, x: &DVector<f64>) -> Result<DVector<f64>, FilterError> {
        let (px, py, vx, vy) = (x[0], x[1], x[2], x[3]);
        let range_sq = px * px + py * py;
        if range_sq < DEGENERATE_RANGE_SQ {
            return Err(FilterError::NumericalInstability {
                description: format!("radar geometry degenerate at range^2 = {:.3e}", range_sq),
            });
        }
        let range = range_sq.sqrt();
        let bearing = px.atan2(py);
        let range_rate = (px * vx + py * vy) / range;
        Ok(DVector::from_vec(vec![range, bearing, range_rate]))
    }

    /// Measurement Jacobian ∂h/∂x evaluated at the given state.
    pub fn jacobian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>, FilterError> {
        let (px, py, vx, vy) = (x[0], x[1], x[2], x[3]);
        let range_sq = px * px + py * py;
        if range_sq < DEGENERATE_RANGE_SQ {
            return Err(FilterError::NumericalInstability {
                description: format!("radar geometry degenerate at range^2 = {:.3e}", range_sq),
            });
        }
        let range = range_sq.sqrt();
        let range_cu = range_sq * range;
        #[rustfmt::skip]
        let h = DMatrix::from_row_slice(3, STATE_DIM, &[
            px / range,                          py / range,                          0.0,        0.0,
            py / range_sq,                       -px / range_sq,                      0.0,        0.0,
            py * (vx * py - vy * px) / range_cu, px * (vy * px - vx * py) / range_cu, px / range, py / range,
        ]);
        Ok(h)
    }

    /// Innovation `y = z − h(x)` with the bearing wrapped into (−π, π].
    pub fn innovation(
        &self,
        z: &DVector<f64>,
        x: &DVector<f64>,
    ) -> Result<DVector<f64>, FilterError> {
        if z.len() != 3 {
            return Err(FilterError::DimensionMismatch {
                expected: (3, 1),
                actual: (z.len(), 1),
                context: "radar measurement".to_string(),
            });
        }
        let predicted = self.predict_measurement(x)?;
        let mut y = z - predicted;
        y[1] = wrap_angle(y[1]);
        Ok(y)
    }
}

impl Default for RadarModel {
    fn default() -> Self {
        Self {
            noise: DMatrix::from_diagonal(&DVector::from_vec(vec![
                Self::DEFAULT_RANGE_VAR,
                Self::DEFAULT_BEARING_VAR,
                Self::DEFAULT_RANGE_RATE_VAR,
            ])),
        }
    }
}
