//! Measurement fusion: sensor models, configuration, and the
//! per-measurement orchestration state machine.

pub mod config;
pub mod measurement;
pub mod models;
pub mod orchestrator;

pub use config::{
    FusionConfig, FusionConfigBuilder, FusionConfigSnapshot, DEFAULT_INITIAL_POSITION_VAR,
    DEFAULT_INITIAL_VELOCITY_VAR,
};
pub use measurement::{Measurement, SensorReading};
pub use models::{LaserModel, MotionModel, RadarModel, DEFAULT_NOISE_AX, DEFAULT_NOISE_AY};
pub use orchestrator::{FusionOrchestrator, StateEstimate, StepOutcome};
