//! Single-track Kalman state estimator.
//!
//! [`StateEstimator`] owns the state vector and covariance and applies the
//! two canonical operations: linear prediction and measurement update. It
//! has no knowledge of sensor semantics; callers supply the observation
//! matrices (laser) or a pre-computed innovation and Jacobian (radar).

use nalgebra::{DMatrix, DVector};

use super::errors::FilterError;
use crate::common::linalg::symmetrize;

/// State dimension: [px, py, vx, vy]
pub const STATE_DIM: usize = 4;

/// Kalman filter over a 4-dimensional constant-velocity state.
///
/// The state vector is created unset; it must be seeded exactly once via
/// [`initialize`](StateEstimator::initialize) before any predict or update.
/// The transition and process-noise matrices are replaced each cycle by the
/// caller because the elapsed time between measurements varies.
#[derive(Debug, Clone)]
pub struct StateEstimator {
    /// State vector x = [px, py, vx, vy]
    x: DVector<f64>,
    /// State covariance P (kept symmetric PSD)
    p: DMatrix<f64>,
    /// State transition F for the current cycle
    f: DMatrix<f64>,
    /// Process noise Q for the current cycle
    q: DMatrix<f64>,
    initialized: bool,
}

impl StateEstimator {
    /// Create an estimator with the given initial covariance.
    ///
    /// The state vector starts at zero and is not considered valid until
    /// [`initialize`](StateEstimator::initialize) is called.
    pub fn new(initial_covariance: DMatrix<f64>) -> Result<Self, FilterError> {
        check_square(&initial_covariance, "initial covariance")?;
        Ok(Self {
            x: DVector::zeros(STATE_DIM),
            p: initial_covariance,
            f: DMatrix::identity(STATE_DIM, STATE_DIM),
            q: DMatrix::zeros(STATE_DIM, STATE_DIM),
            initialized: false,
        })
    }

    /// Seed the state vector from the first measurement.
    ///
    /// One-shot by contract: a second call overwrites the track, so callers
    /// guard this with their own initialization flag.
    pub fn initialize(&mut self, x0: DVector<f64>) -> Result<(), FilterError> {
        if x0.len() != STATE_DIM {
            return Err(FilterError::DimensionMismatch {
                expected: (STATE_DIM, 1),
                actual: (x0.len(), 1),
                context: "initial state".to_string(),
            });
        }
        self.x = x0;
        self.initialized = true;
        Ok(())
    }

    /// Replace the state transition matrix for the current cycle.
    pub fn set_transition(&mut self, f: DMatrix<f64>) -> Result<(), FilterError> {
        check_square(&f, "transition matrix")?;
        self.f = f;
        Ok(())
    }

    /// Replace the process noise covariance for the current cycle.
    pub fn set_process_noise(&mut self, q: DMatrix<f64>) -> Result<(), FilterError> {
        check_square(&q, "process noise")?;
        self.q = q;
        Ok(())
    }

    /// Propagate the state forward: `x ← F x`, `P ← F P Fᵀ + Q`.
    ///
    /// F and Q must already be set for the current cycle.
    pub fn predict(&mut self) -> Result<(), FilterError> {
        self.ensure_initialized("predict")?;
        self.x = &self.f * &self.x;
        self.p = symmetrize(&(&self.f * &self.p * self.f.transpose() + &self.q));
        Ok(())
    }

    /// Standard Kalman update with a linear observation model.
    ///
    /// The innovation is `y = z − H x`. Fails with
    /// [`FilterError::SingularInnovationCovariance`] when `S = H P Hᵀ + R`
    /// cannot be inverted; the state is left untouched in that case and the
    /// caller should treat the measurement as dropped.
    pub fn update_linear(
        &mut self,
        z: &DVector<f64>,
        h: &DMatrix<f64>,
        r: &DMatrix<f64>,
    ) -> Result<(), FilterError> {
        self.ensure_initialized("update")?;
        check_observation(z.len(), h, r)?;
        let innovation = z - h * &self.x;
        self.apply_update(&innovation, h, r)
    }

    /// Extended Kalman update with a nonlinear observation model.
    ///
    /// Same algebra as the linear update, but the caller evaluates
    /// `y = z − h(x)` and the Jacobian at the pre-update state. Any angular
    /// component of the innovation must already be normalized into (−π, π]
    /// by the observation model that produced it.
    pub fn update_nonlinear(
        &mut self,
        innovation: &DVector<f64>,
        jacobian: &DMatrix<f64>,
        r: &DMatrix<f64>,
    ) -> Result<(), FilterError> {
        self.ensure_initialized("update")?;
        check_observation(innovation.len(), jacobian, r)?;
        self.apply_update(innovation, jacobian, r)
    }

    /// Shared update core: gain, state correction, Joseph-form covariance.
    fn apply_update(
        &mut self,
        innovation: &DVector<f64>,
        h: &DMatrix<f64>,
        r: &DMatrix<f64>,
    ) -> Result<(), FilterError> {
        let s = h * &self.p * h.transpose() + r;

        let s_inv = match s.clone().cholesky() {
            Some(chol) => chol.inverse(),
            None => s
                .try_inverse()
                .ok_or_else(|| FilterError::SingularInnovationCovariance {
                    context: "S = H P H' + R".to_string(),
                })?,
        };

        let gain = &self.p * h.transpose() * s_inv;
        let x_next = &self.x + &gain * innovation;

        // Joseph form keeps P symmetric PSD even with a suboptimal gain
        let i_kh = DMatrix::identity(STATE_DIM, STATE_DIM) - &gain * h;
        let p_next = symmetrize(&(&i_kh * &self.p * i_kh.transpose() + &gain * r * gain.transpose()));

        // A near-singular solve must never leak NaN/Inf into the track
        if x_next.iter().any(|v| !v.is_finite()) || p_next.iter().any(|v| !v.is_finite()) {
            return Err(FilterError::SingularInnovationCovariance {
                context: "update produced non-finite values".to_string(),
            });
        }

        self.x = x_next;
        self.p = p_next;
        Ok(())
    }

    /// Current state vector (read-only).
    #[inline]
    pub fn state(&self) -> &DVector<f64> {
        &self.x
    }

    /// Current state covariance (read-only).
    #[inline]
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.p
    }

    /// Whether [`initialize`](StateEstimator::initialize) has been called.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&self, operation: &str) -> Result<(), FilterError> {
        if self.initialized {
            Ok(())
        } else {
            Err(FilterError::Uninitialized {
                operation: operation.to_string(),
            })
        }
    }
}

fn check_square(m: &DMatrix<f64>, context: &str) -> Result<(), FilterError> {
    if m.shape() != (STATE_DIM, STATE_DIM) {
        return Err(FilterError::DimensionMismatch {
            expected: (STATE_DIM, STATE_DIM),
            actual: m.shape(),
            context: context.to_string(),
        });
    }
    Ok(())
}

fn check_observation(z_dim: usize, h: &DMatrix<f64>, r: &DMatrix<f64>) -> Result<(), FilterError> {
    if h.shape() != (z_dim, STATE_DIM) {
        return Err(FilterError::DimensionMismatch {
            expected: (z_dim, STATE_DIM),
            actual: h.shape(),
            context: "observation matrix".to_string(),
        });
    }
    if r.shape() != (z_dim, z_dim) {
        return Err(FilterError::DimensionMismatch {
            expected: (z_dim, z_dim),
            actual: r.shape(),
            context: "measurement noise".to_string(),
        });
    }
    Ok(())
}
