//! MS5837 pressure/temperature sensor driver.
//!
//! ```ignore
//! let transport = I2cTransport::new(i2c, delay);
//! let mut sensor = Ms5837::initialize(transport, Config::bar30())?;
//! let m = sensor.read(PressureUnit::Mbar, Oversampling::Osr8192)?;
//! ```
#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to the other modules.
#[macro_use]
mod fmt;

pub mod calibration;
pub mod compensation;
pub mod device;
pub mod error;
pub mod ms5837;
pub mod telemetry;
pub mod transport;
pub mod units;

pub use calibration::{Calibration, IntegrityError, crc4};
pub use compensation::{FirstOrder, RawSample, Reading, SecondOrder, compensate};
pub use device::{Config, Measurement, Ms5837};
pub use error::Error;
pub use ms5837::{Model, Oversampling};
pub use transport::{I2cTransport, Transport};
pub use units::PressureUnit;
