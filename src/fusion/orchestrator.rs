//! Per-measurement fusion state machine.
//!
//! [`FusionOrchestrator`] owns one [`StateEstimator`] and drives it through
//! a two-state machine: the first measurement seeds the track, every later
//! one runs a predict/update cycle with the elapsed-time-dependent process
//! model and the update path matching the sensor type.

use nalgebra::{DMatrix, DVector};

use super::config::{FusionConfig, FusionConfigSnapshot};
use super::measurement::{Measurement, SensorReading};
use super::models::RadarModel;
use crate::filter::errors::FilterError;
use crate::filter::estimator::StateEstimator;

const MICROS_PER_SEC: f64 = 1e6;

/// What happened to one processed measurement.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// First measurement seeded the track; no predict or update ran
    Initialized,
    /// Predict and measurement update both completed
    Updated,
    /// Predict completed but the update was dropped; the predicted state
    /// stands and the filter keeps tracking
    UpdateDropped(FilterError),
}

/// Read-only snapshot of the current track estimate.
#[derive(Debug, Clone)]
pub struct StateEstimate {
    /// State vector [px, py, vx, vy]
    pub state: DVector<f64>,
    /// State covariance
    pub covariance: DMatrix<f64>,
    /// Timestamp of the last accepted measurement, microseconds
    pub timestamp_us: i64,
}

/// Fuses laser and radar measurements into a single track estimate.
#[derive(Debug, Clone)]
pub struct FusionOrchestrator {
    estimator: StateEstimator,
    config: FusionConfig,
    previous_timestamp_us: Option<i64>,
}

impl FusionOrchestrator {
    /// Create an orchestrator from the given configuration.
    ///
    /// Fails with [`FilterError::DimensionMismatch`] if the configured
    /// initial covariance is not 4x4.
    pub fn new(config: FusionConfig) -> Result<Self, FilterError> {
        let estimator = StateEstimator::new(config.initial_covariance.clone())?;
        log::debug!(
            "fusion pipeline configured: {}",
            FusionConfigSnapshot::from(&config).to_json()
        );
        Ok(Self {
            estimator,
            config,
            previous_timestamp_us: None,
        })
    }

    /// Consume one measurement.
    ///
    /// The first measurement initializes the track and returns
    /// [`StepOutcome::Initialized`]. Every later measurement is predicted
    /// to and then applied as an update; a recoverable update failure
    /// (singular innovation covariance, degenerate radar geometry) is
    /// surfaced as [`StepOutcome::UpdateDropped`] with the predicted state
    /// preserved. Non-increasing timestamps are rejected with
    /// [`FilterError::OutOfOrderMeasurement`] and no state change.
    pub fn process(&mut self, measurement: &Measurement) -> Result<StepOutcome, FilterError> {
        let previous = match self.previous_timestamp_us {
            None => return self.initialize(measurement),
            Some(t) => t,
        };

        if measurement.timestamp_us <= previous {
            log::warn!(
                "rejecting out-of-order {} measurement: t={}us after t={}us",
                measurement.reading.sensor_name(),
                measurement.timestamp_us,
                previous
            );
            return Err(FilterError::OutOfOrderMeasurement {
                previous_us: previous,
                received_us: measurement.timestamp_us,
            });
        }

        let dt = (measurement.timestamp_us - previous) as f64 / MICROS_PER_SEC;
        self.previous_timestamp_us = Some(measurement.timestamp_us);

        self.estimator
            .set_transition(self.config.motion.transition(dt))?;
        self.estimator
            .set_process_noise(self.config.motion.process_noise(dt))?;
        self.estimator.predict()?;
        log::trace!("predicted over dt={:.6}s", dt);

        match self.apply_update(&measurement.reading) {
            Ok(()) => {
                log::debug!(
                    "{} update applied at t={}us",
                    measurement.reading.sensor_name(),
                    measurement.timestamp_us
                );
                Ok(StepOutcome::Updated)
            }
            Err(
                err @ (FilterError::SingularInnovationCovariance { .. }
                | FilterError::NumericalInstability { .. }),
            ) => {
                log::warn!(
                    "dropping {} update at t={}us: {}",
                    measurement.reading.sensor_name(),
                    measurement.timestamp_us,
                    err
                );
                Ok(StepOutcome::UpdateDropped(err))
            }
            Err(err) => Err(err),
        }
    }

    /// Current state estimate for external reporting.
    pub fn current_estimate(&self) -> Result<StateEstimate, FilterError> {
        match self.previous_timestamp_us {
            Some(timestamp_us) => Ok(StateEstimate {
                state: self.estimator.state().clone(),
                covariance: self.estimator.covariance().clone(),
                timestamp_us,
            }),
            None => Err(FilterError::Uninitialized {
                operation: "current_estimate".to_string(),
            }),
        }
    }

    /// Serializable snapshot of the active configuration.
    pub fn config_snapshot(&self) -> FusionConfigSnapshot {
        (&self.config).into()
    }

    /// Whether the first measurement has been consumed.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.previous_timestamp_us.is_some()
    }

    fn initialize(&mut self, measurement: &Measurement) -> Result<StepOutcome, FilterError> {
        let (px, py) = match measurement.reading {
            SensorReading::Laser { px, py } => (px, py),
            SensorReading::Radar { range, bearing, .. } => {
                RadarModel::to_cartesian(range, bearing)
            }
        };
        // velocity is unobservable from a single return
        self.estimator
            .initialize(DVector::from_vec(vec![px, py, 0.0, 0.0]))?;
        self.previous_timestamp_us = Some(measurement.timestamp_us);
        log::info!(
            "track initialized from {} measurement at t={}us: position ({:.3}, {:.3})",
            measurement.reading.sensor_name(),
            measurement.timestamp_us,
            px,
            py
        );
        Ok(StepOutcome::Initialized)
    }

    fn apply_update(&mut self, reading: &SensorReading) -> Result<(), FilterError> {
        let z = reading.to_vector();
        match reading {
            SensorReading::Laser { .. } => self.estimator.update_linear(
                &z,
                self.config.laser.observation_matrix(),
                self.config.laser.noise(),
            ),
            SensorReading::Radar { .. } => {
                // Jacobian and innovation both evaluated at the pre-update
                // (predicted) state
                let jacobian = self.config.radar.jacobian(self.estimator.state())?;
                let innovation = self.config.radar.innovation(&z, self.estimator.state())?;
                self.estimator
                    .update_nonlinear(&innovation, &jacobian, self.config.radar.noise())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator() -> FusionOrchestrator {
        FusionOrchestrator::new(FusionConfig::default()).unwrap()
    }

    #[test]
    fn test_first_laser_measurement_initializes_exactly() {
        let mut fusion = orchestrator();
        let outcome = fusion.process(&Measurement::laser(0, 1.0, 2.0)).unwrap();
        assert!(matches!(outcome, StepOutcome::Initialized));

        let estimate = fusion.current_estimate().unwrap();
        assert!((estimate.state[0] - 1.0).abs() < 1e-15);
        assert!((estimate.state[1] - 2.0).abs() < 1e-15);
        assert!(estimate.state[2].abs() < 1e-15);
        assert!(estimate.state[3].abs() < 1e-15);
        assert_eq!(estimate.timestamp_us, 0);
    }

    #[test]
    fn test_first_radar_measurement_initializes_under_bearing_convention() {
        let mut fusion = orchestrator();
        fusion
            .process(&Measurement::radar(0, 5.0, 0.0, 0.0))
            .unwrap();

        // zero bearing points along +y
        let estimate = fusion.current_estimate().unwrap();
        assert!(estimate.state[0].abs() < 1e-12);
        assert!((estimate.state[1] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_before_first_measurement_fails() {
        let fusion = orchestrator();
        assert!(matches!(
            fusion.current_estimate(),
            Err(FilterError::Uninitialized { .. })
        ));
    }

    #[test]
    fn test_out_of_order_measurement_rejected_without_state_change() {
        let mut fusion = orchestrator();
        fusion.process(&Measurement::laser(1_000_000, 1.0, 1.0)).unwrap();
        fusion
            .process(&Measurement::laser(1_100_000, 1.1, 1.05))
            .unwrap();
        let before = fusion.current_estimate().unwrap();

        let result = fusion.process(&Measurement::laser(500_000, 9.0, 9.0));
        assert!(matches!(
            result,
            Err(FilterError::OutOfOrderMeasurement { .. })
        ));

        let after = fusion.current_estimate().unwrap();
        assert!((&after.state - &before.state).norm() < 1e-15);
        assert!((&after.covariance - &before.covariance).norm() < 1e-15);
        assert_eq!(after.timestamp_us, before.timestamp_us);
    }

    #[test]
    fn test_equal_timestamp_is_out_of_order() {
        let mut fusion = orchestrator();
        fusion.process(&Measurement::laser(1_000, 1.0, 1.0)).unwrap();
        let result = fusion.process(&Measurement::laser(1_000, 1.0, 1.0));
        assert!(matches!(
            result,
            Err(FilterError::OutOfOrderMeasurement { .. })
        ));
    }

    #[test]
    fn test_laser_update_pulls_state_toward_measurement() {
        let mut fusion = orchestrator();
        fusion.process(&Measurement::laser(0, 1.0, 1.0)).unwrap();
        let outcome = fusion
            .process(&Measurement::laser(100_000, 1.1, 1.05))
            .unwrap();
        assert!(matches!(outcome, StepOutcome::Updated));

        // with a diffuse prior the update lands close to the measurement
        let estimate = fusion.current_estimate().unwrap();
        assert!((estimate.state[0] - 1.1).abs() < 0.01);
        assert!((estimate.state[1] - 1.05).abs() < 0.01);
    }

    #[test]
    fn test_radar_update_accepted_after_laser_init() {
        let mut fusion = orchestrator();
        fusion.process(&Measurement::laser(0, 0.0, 5.0)).unwrap();

        // a consistent radar return for a target at (0, 5) moving along +y
        let outcome = fusion
            .process(&Measurement::radar(100_000, 5.05, 0.0, 0.5))
            .unwrap();
        assert!(matches!(outcome, StepOutcome::Updated));

        let estimate = fusion.current_estimate().unwrap();
        assert!((estimate.state[1] - 5.0).abs() < 0.2);
    }

    #[test]
    fn test_degenerate_radar_geometry_drops_update() {
        let mut fusion = orchestrator();
        // zero-range init puts the track at the sensor origin
        fusion
            .process(&Measurement::radar(0, 0.0, 0.0, 0.0))
            .unwrap();

        let outcome = fusion
            .process(&Measurement::radar(100_000, 1.0, 0.3, 0.0))
            .unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::UpdateDropped(FilterError::NumericalInstability { .. })
        ));

        // the predicted state stands: position unchanged, clock advanced
        let estimate = fusion.current_estimate().unwrap();
        assert!(estimate.state[0].abs() < 1e-12);
        assert!(estimate.state[1].abs() < 1e-12);
        assert_eq!(estimate.timestamp_us, 100_000);
    }

    #[test]
    fn test_config_snapshot_round_trip() {
        let fusion = orchestrator();
        let json = fusion.config_snapshot().to_json_pretty();
        assert!(json.contains("noise_ax"));
        assert!(json.contains("initial_covariance_diag"));
    }
}
