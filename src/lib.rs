/*!
# fusion-ekf-rs — laser/radar track fusion

Rust implementation of a single-track extended Kalman filter that fuses
laser (Cartesian position) and radar (range/bearing/range-rate) returns
under a constant-velocity motion model.

## Modules

- [`filter`] - the Kalman estimator: state, covariance, predict/update
- [`fusion`] - measurement types, sensor models, per-measurement orchestration
- [`common`] - low-level numeric utilities

## Example

```rust
use fusion_ekf_rs::{FusionConfig, FusionOrchestrator, Measurement};

let mut fusion = FusionOrchestrator::new(FusionConfig::default()).unwrap();

// first measurement seeds the track, later ones run predict/update
fusion.process(&Measurement::laser(0, 1.0, 2.0)).unwrap();
fusion.process(&Measurement::radar(50_000, 2.3, 0.45, 0.8)).unwrap();

let estimate = fusion.current_estimate().unwrap();
println!("position: ({:.2}, {:.2})", estimate.state[0], estimate.state[1]);
```
*/

/// Kalman estimator core (state, covariance, predict/update)
pub mod filter;

/// Measurement fusion pipeline (sensor models, orchestration)
pub mod fusion;

/// Low-level numeric utilities
pub mod common;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use filter::{FilterError, StateEstimator, STATE_DIM};
pub use fusion::{
    FusionConfig, FusionConfigBuilder, FusionConfigSnapshot, FusionOrchestrator, LaserModel,
    Measurement, MotionModel, RadarModel, SensorReading, StateEstimate, StepOutcome,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
