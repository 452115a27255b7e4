//! Fusion pipeline configuration.
//!
//! [`FusionConfig`] bundles the process model, both sensor models and the
//! initial covariance. [`FusionConfigSnapshot`] is a flattened, serializable
//! view for debugging and cross-implementation comparison.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use super::models::{LaserModel, MotionModel, RadarModel};
use crate::filter::estimator::STATE_DIM;

/// Default initial position variance
pub const DEFAULT_INITIAL_POSITION_VAR: f64 = 1.0;
/// Default initial velocity variance (velocity is unobserved at start)
pub const DEFAULT_INITIAL_VELOCITY_VAR: f64 = 1000.0;

/// Complete configuration for a fusion pipeline.
#[derive(Debug, Clone)]
pub struct FusionConfig {
    /// Constant-velocity process model
    pub motion: MotionModel,
    /// Laser observation model
    pub laser: LaserModel,
    /// Radar observation model
    pub radar: RadarModel,
    /// Initial state covariance P0 (4x4)
    pub initial_covariance: DMatrix<f64>,
}

impl FusionConfig {
    /// Create a builder pre-populated with defaults.
    pub fn builder() -> FusionConfigBuilder {
        FusionConfigBuilder::default()
    }

    fn default_initial_covariance() -> DMatrix<f64> {
        DMatrix::from_diagonal(&DVector::from_vec(vec![
            DEFAULT_INITIAL_POSITION_VAR,
            DEFAULT_INITIAL_POSITION_VAR,
            DEFAULT_INITIAL_VELOCITY_VAR,
            DEFAULT_INITIAL_VELOCITY_VAR,
        ]))
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            motion: MotionModel::default(),
            laser: LaserModel::default(),
            radar: RadarModel::default(),
            initial_covariance: Self::default_initial_covariance(),
        }
    }
}

/// Builder for [`FusionConfig`].
#[derive(Debug, Default)]
pub struct FusionConfigBuilder {
    motion: Option<MotionModel>,
    laser: Option<LaserModel>,
    radar: Option<RadarModel>,
    initial_covariance: Option<DMatrix<f64>>,
}

impl FusionConfigBuilder {
    /// Set the process model.
    pub fn motion(mut self, motion: MotionModel) -> Self {
        self.motion = Some(motion);
        self
    }

    /// Set the laser observation model.
    pub fn laser(mut self, laser: LaserModel) -> Self {
        self.laser = Some(laser);
        self
    }

    /// Set the radar observation model.
    pub fn radar(mut self, radar: RadarModel) -> Self {
        self.radar = Some(radar);
        self
    }

    /// Set the initial state covariance.
    ///
    /// The shape is validated when the orchestrator is constructed.
    pub fn initial_covariance(mut self, p0: DMatrix<f64>) -> Self {
        self.initial_covariance = Some(p0);
        self
    }

    /// Build the configuration, filling unset fields with defaults.
    pub fn build(self) -> FusionConfig {
        FusionConfig {
            motion: self.motion.unwrap_or_default(),
            laser: self.laser.unwrap_or_default(),
            radar: self.radar.unwrap_or_default(),
            initial_covariance: self
                .initial_covariance
                .unwrap_or_else(FusionConfig::default_initial_covariance),
        }
    }
}

// ============================================================================
// Configuration snapshot (for debugging/comparison)
// ============================================================================

/// Flattened view of a fusion configuration for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct FusionConfigSnapshot {
    /// State dimension
    pub x_dim: usize,
    /// Acceleration noise along x
    pub noise_ax: f64,
    /// Acceleration noise along y
    pub noise_ay: f64,
    /// Laser measurement noise R (flattened)
    pub laser_noise: Vec<f64>,
    /// Radar measurement noise R (flattened)
    pub radar_noise: Vec<f64>,
    /// Initial covariance diagonal
    pub initial_covariance_diag: Vec<f64>,
}

impl From<&FusionConfig> for FusionConfigSnapshot {
    fn from(config: &FusionConfig) -> Self {
        Self {
            x_dim: STATE_DIM,
            noise_ax: config.motion.noise_ax,
            noise_ay: config.motion.noise_ay,
            laser_noise: config.laser.noise().iter().copied().collect(),
            radar_noise: config.radar.noise().iter().copied().collect(),
            initial_covariance_diag: config
                .initial_covariance
                .diagonal()
                .iter()
                .copied()
                .collect(),
        }
    }
}

impl FusionConfigSnapshot {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
