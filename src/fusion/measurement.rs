//! Measurement types delivered by the external sensor stream.
//!
//! The sensor set is closed: exactly one laser and one radar modality.
//! Dispatch on [`SensorReading`] is exhaustive, so adding a variant is a
//! compile-visible change everywhere a measurement is consumed.

use nalgebra::DVector;

/// Raw payload of one sensor return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorReading {
    /// Cartesian position from the laser scanner
    Laser {
        /// Position x
        px: f64,
        /// Position y
        py: f64,
    },
    /// Polar return from the radar
    Radar {
        /// Range ρ
        range: f64,
        /// Bearing φ, measured from the +y axis toward +x
        bearing: f64,
        /// Range-rate ρ̇
        range_rate: f64,
    },
}

impl SensorReading {
    /// Measurement dimension (2 for laser, 3 for radar).
    #[inline]
    pub fn z_dim(&self) -> usize {
        match self {
            SensorReading::Laser { .. } => 2,
            SensorReading::Radar { .. } => 3,
        }
    }

    /// Raw values as a column vector, in sensor order.
    pub fn to_vector(&self) -> DVector<f64> {
        match *self {
            SensorReading::Laser { px, py } => DVector::from_vec(vec![px, py]),
            SensorReading::Radar {
                range,
                bearing,
                range_rate,
            } => DVector::from_vec(vec![range, bearing, range_rate]),
        }
    }

    /// Short tag for logging.
    pub fn sensor_name(&self) -> &'static str {
        match self {
            SensorReading::Laser { .. } => "laser",
            SensorReading::Radar { .. } => "radar",
        }
    }
}

/// One timestamped sensor return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Acquisition time in integer microseconds
    pub timestamp_us: i64,
    /// Sensor payload
    pub reading: SensorReading,
}

impl Measurement {
    /// A laser return at the given time.
    pub fn laser(timestamp_us: i64, px: f64, py: f64) -> Self {
        Self {
            timestamp_us,
            reading: SensorReading::Laser { px, py },
        }
    }

    /// A radar return at the given time.
    pub fn radar(timestamp_us: i64, range: f64, bearing: f64, range_rate: f64) -> Self {
        Self {
            timestamp_us,
            reading: SensorReading::Radar {
                range,
                bearing,
                range_rate,
            },
        }
    }
}
